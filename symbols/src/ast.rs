//! Mangling scheme independent description of a function symbol.
//!
//! Parsing produces these values from an Itanium name and the MSVC emitter walks them
//! again, so nothing in here remembers how the name was originally compressed.

use crate::error::{Error, Result};

/// Namespace path, outermost segment first.
pub type Path = Vec<Segment>;

/// A parsed function symbol.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// `_ZN3Foo3barEi` has the path `[Foo, bar]`.
    pub path: Path,

    /// Argument types in declaration order.
    pub arguments: Vec<Type>,

    /// Only known for template instances and conversion operators.
    pub return_type: Option<Type>,

    /// Whether this is a const member function.
    pub is_const: bool,

    pub calling_conv: CallingConv,
}

impl Symbol {
    /// Last segment of the path, the function's own name.
    pub fn name(&self) -> Option<&Segment> {
        self.path.last()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub template_args: Vec<TemplateArg>,
}

impl Segment {
    pub fn name<S: Into<String>>(name: S) -> Self {
        Self {
            kind: SegmentKind::Name(name.into()),
            template_args: Vec::new(),
        }
    }

    pub fn operator(op: OperatorKind) -> Self {
        Self {
            kind: SegmentKind::Operator(op, None),
            template_args: Vec::new(),
        }
    }

    pub fn cast(target: Type) -> Self {
        Self {
            kind: SegmentKind::Operator(OperatorKind::Cast, Some(Box::new(target))),
            template_args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<TemplateArg>) -> Self {
        self.template_args = args;
        self
    }

    pub fn operator_kind(&self) -> Option<OperatorKind> {
        match self.kind {
            SegmentKind::Operator(op, _) => Some(op),
            SegmentKind::Name(_) => None,
        }
    }

    pub fn is_ctor_or_dtor(&self) -> bool {
        matches!(
            self.operator_kind(),
            Some(OperatorKind::Constructor | OperatorKind::Destructor)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Name(String),
    /// The type is the target of a conversion operator and is absent otherwise.
    Operator(OperatorKind, Option<Box<Type>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateArg {
    Type(Type),
    Literal(Builtin, i64),
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConv {
    #[default]
    Unknown,
    Cdecl,
    Stdcall,
    Fastcall,
    Thiscall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Regular(Regular),
    Function(Function),
    Array(Array),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regular {
    pub is_const: bool,
    pub kind: RegularKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegularKind {
    Builtin(Builtin),
    Custom(Path),
    Pointer(Box<Type>),
    Reference(Box<Type>),
    RValueReference(Box<Type>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Value,
    Pointer,
    Reference,
    RValueReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub return_type: Box<Type>,
    pub params: Vec<Type>,
    pub calling_conv: CallingConv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array {
    pub element: Box<Type>,
    /// Unknown bound arrays such as `int[]` have no length.
    pub len: Option<u64>,
}

impl Regular {
    pub fn qualifier(&self) -> Qualifier {
        match self.kind {
            RegularKind::Builtin(_) | RegularKind::Custom(_) => Qualifier::Value,
            RegularKind::Pointer(_) => Qualifier::Pointer,
            RegularKind::Reference(_) => Qualifier::Reference,
            RegularKind::RValueReference(_) => Qualifier::RValueReference,
        }
    }

    /// The type being pointed or referred to.
    pub fn subtype(&self) -> Option<&Type> {
        match self.kind {
            RegularKind::Pointer(ref ty)
            | RegularKind::Reference(ref ty)
            | RegularKind::RValueReference(ref ty) => Some(ty),
            RegularKind::Builtin(_) | RegularKind::Custom(_) => None,
        }
    }
}

impl Type {
    pub fn builtin(builtin: Builtin) -> Self {
        Self::regular(RegularKind::Builtin(builtin))
    }

    pub fn custom(path: Path) -> Self {
        Self::regular(RegularKind::Custom(path))
    }

    pub fn pointer(to: Type) -> Self {
        Self::regular(RegularKind::Pointer(Box::new(to)))
    }

    pub fn reference(to: Type) -> Self {
        Self::regular(RegularKind::Reference(Box::new(to)))
    }

    pub fn rvalue_reference(to: Type) -> Self {
        Self::regular(RegularKind::RValueReference(Box::new(to)))
    }

    fn regular(kind: RegularKind) -> Self {
        Type::Regular(Regular {
            is_const: false,
            kind,
        })
    }

    /// Const qualified copy of a type that is known to accept the qualifier.
    #[cfg(test)]
    pub(crate) fn with_const(mut self) -> Self {
        self.make_const().expect("function types can't be const");
        self
    }

    /// Const qualifies the type in place. Arrays propagate the qualifier to their elements.
    pub fn make_const(&mut self) -> Result<()> {
        match self {
            Type::Regular(regular) => {
                regular.is_const = true;
                Ok(())
            }
            Type::Array(array) => array.element.make_const(),
            Type::Function(_) => Err(Error::UnexpectedText),
        }
    }

    pub fn is_const(&self) -> bool {
        match self {
            Type::Regular(regular) => regular.is_const,
            Type::Array(array) => array.element.is_const(),
            Type::Function(_) => false,
        }
    }

    /// Copy of the type with the top level const qualifier removed.
    pub fn unqualified(&self) -> Type {
        match self {
            Type::Regular(regular) => Type::Regular(Regular {
                is_const: false,
                kind: regular.kind.clone(),
            }),
            Type::Array(array) => Type::Array(Array {
                element: Box::new(array.element.unqualified()),
                len: array.len,
            }),
            Type::Function(_) => self.clone(),
        }
    }

    /// Whether the type is a candidate for substitution.
    pub fn is_complex(&self) -> bool {
        match self {
            Type::Regular(regular) => {
                regular.is_const || !matches!(regular.kind, RegularKind::Builtin(_))
            }
            Type::Function(_) | Type::Array(_) => true,
        }
    }

    /// Path of a plain, non-const class type.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Type::Regular(Regular {
                is_const: false,
                kind: RegularKind::Custom(path),
            }) => Some(path),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Type::Regular(Regular {
                kind: RegularKind::Builtin(Builtin::Void),
                ..
            })
        )
    }

    pub fn is_varargs(&self) -> bool {
        matches!(
            self,
            Type::Regular(Regular {
                kind: RegularKind::Builtin(Builtin::Varargs),
                ..
            })
        )
    }
}

/// How deep a value nests and how many nodes it's made of.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Extent {
    pub depth: u32,
    pub nodes: usize,
}

impl Extent {
    fn nest(self) -> Self {
        Self {
            depth: self.depth.saturating_add(1),
            nodes: self.nodes.saturating_add(1),
        }
    }

    fn join(self, other: Extent) -> Self {
        Self {
            depth: self.depth.max(other.depth),
            nodes: self.nodes.saturating_add(other.nodes),
        }
    }

    pub fn of_path(path: &[Segment]) -> Self {
        path.iter().fold(Extent::default(), |acc, segment| acc.join(Self::of_segment(segment)))
    }

    fn of_segment(segment: &Segment) -> Self {
        let mut extent = match segment.kind {
            SegmentKind::Operator(_, Some(ref target)) => Self::of_type(target),
            _ => Extent::default(),
        };

        for arg in segment.template_args.iter() {
            if let TemplateArg::Type(ty) = arg {
                extent = extent.join(Self::of_type(ty));
            }
        }

        extent.nest()
    }

    pub fn of_type(ty: &Type) -> Self {
        let inner = match ty {
            Type::Regular(regular) => match regular.kind {
                RegularKind::Builtin(_) => Extent::default(),
                RegularKind::Custom(ref path) => Self::of_path(path),
                RegularKind::Pointer(ref to)
                | RegularKind::Reference(ref to)
                | RegularKind::RValueReference(ref to) => Self::of_type(to),
            },
            Type::Function(func) => func
                .params
                .iter()
                .fold(Self::of_type(&func.return_type), |acc, param| {
                    acc.join(Self::of_type(param))
                }),
            Type::Array(array) => Self::of_type(&array.element),
        };

        inner.nest()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Void,
    Wchar,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int128,
    UnsignedInt128,
    Float,
    Double,
    LongDouble,
    Float128,
    Varargs,
    Char8,
    Char16,
    Char32,
    Nullptr,
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[
        Builtin::Void,
        Builtin::Wchar,
        Builtin::Bool,
        Builtin::Char,
        Builtin::SignedChar,
        Builtin::UnsignedChar,
        Builtin::Short,
        Builtin::UnsignedShort,
        Builtin::Int,
        Builtin::UnsignedInt,
        Builtin::Long,
        Builtin::UnsignedLong,
        Builtin::LongLong,
        Builtin::UnsignedLongLong,
        Builtin::Int128,
        Builtin::UnsignedInt128,
        Builtin::Float,
        Builtin::Double,
        Builtin::LongDouble,
        Builtin::Float128,
        Builtin::Varargs,
        Builtin::Char8,
        Builtin::Char16,
        Builtin::Char32,
        Builtin::Nullptr,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    New,
    NewArray,
    Delete,
    DeleteArray,
    UnaryPlus,
    UnaryMinus,
    AddressOf,
    Deref,
    Complement,
    Plus,
    Minus,
    Multiply,
    Divide,
    Remainder,
    BitAnd,
    BitOr,
    BitXor,
    Assign,
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    RemainderAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LeftShift,
    RightShift,
    LeftShiftAssign,
    RightShiftAssign,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Spaceship,
    Not,
    LogicalAnd,
    LogicalOr,
    Increment,
    Decrement,
    Comma,
    PointerToMember,
    Arrow,
    Call,
    Subscript,
    Conditional,
    SizeofType,
    SizeofExpr,
    Cast,
    Constructor,
    Destructor,
}

impl OperatorKind {
    pub const ALL: &'static [OperatorKind] = &[
        OperatorKind::New,
        OperatorKind::NewArray,
        OperatorKind::Delete,
        OperatorKind::DeleteArray,
        OperatorKind::UnaryPlus,
        OperatorKind::UnaryMinus,
        OperatorKind::AddressOf,
        OperatorKind::Deref,
        OperatorKind::Complement,
        OperatorKind::Plus,
        OperatorKind::Minus,
        OperatorKind::Multiply,
        OperatorKind::Divide,
        OperatorKind::Remainder,
        OperatorKind::BitAnd,
        OperatorKind::BitOr,
        OperatorKind::BitXor,
        OperatorKind::Assign,
        OperatorKind::PlusAssign,
        OperatorKind::MinusAssign,
        OperatorKind::MultiplyAssign,
        OperatorKind::DivideAssign,
        OperatorKind::RemainderAssign,
        OperatorKind::BitAndAssign,
        OperatorKind::BitOrAssign,
        OperatorKind::BitXorAssign,
        OperatorKind::LeftShift,
        OperatorKind::RightShift,
        OperatorKind::LeftShiftAssign,
        OperatorKind::RightShiftAssign,
        OperatorKind::Equal,
        OperatorKind::NotEqual,
        OperatorKind::Less,
        OperatorKind::Greater,
        OperatorKind::LessEqual,
        OperatorKind::GreaterEqual,
        OperatorKind::Spaceship,
        OperatorKind::Not,
        OperatorKind::LogicalAnd,
        OperatorKind::LogicalOr,
        OperatorKind::Increment,
        OperatorKind::Decrement,
        OperatorKind::Comma,
        OperatorKind::PointerToMember,
        OperatorKind::Arrow,
        OperatorKind::Call,
        OperatorKind::Subscript,
        OperatorKind::Conditional,
        OperatorKind::SizeofType,
        OperatorKind::SizeofExpr,
        OperatorKind::Cast,
        OperatorKind::Constructor,
        OperatorKind::Destructor,
    ];
}
