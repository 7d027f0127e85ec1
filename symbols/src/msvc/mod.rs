//! Microsoft Visual C++ symbol mangler
//!
//! ```text
//! <mangled-name> = ? <path> <type-encoding>
//!
//! <path> = <unqualified-path> [<named-scope>]* @
//!
//! <unqualified-path> = <operator-name>
//!                    | <source-name>
//!                    | <template-name>
//!
//! <source-name> = <identifier> @
//!
//! <template-name> = ?$ <source-name> <template-arg>* @
//!
//! <type-encoding> = <function-class> [E] <this-storage-class> <calling-convention>
//!                   <return-type> <argument-list> <throw-spec>
//!                 | Y <calling-convention> <return-type> <argument-list> <throw-spec>
//!
//! <function-class> = Q // public: near
//!
//! <argument-list> = X // void
//!                 | <type>+ @
//!                 | <type>* Z // varargs
//!
//! <throw-spec> = Z
//! ```
//!
//! Names are emitted without back references, which MSVC accepts at the cost of
//! longer symbols.
//!
//! source [MicrosoftMangle.cpp](https://github.com/llvm-mirror/clang/blob/aa231e4be75ac4759c236b755c57876f76e3cf05/lib/AST/MicrosoftMangle.cpp#L1609)


use bitflags::bitflags;

use crate::ast::{
    Array, Builtin, CallingConv, Function, OperatorKind, Path, RegularKind, Segment, SegmentKind,
    Symbol, TemplateArg, Type,
};
use crate::error::{Error, Result};

/// Target specific knobs of the emitted names.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Emit names for 64-bit targets, where pointers carry `__ptr64` and there's only a
    /// single calling convention.
    pub ptr64: bool,
}

/// Mangle a symbol for a 32-bit target.
pub fn emit(symbol: &Symbol) -> Result<String> {
    emit_with(symbol, &Options::default())
}

pub fn emit_with(symbol: &Symbol, opts: &Options) -> Result<String> {
    let mut emitter = Emitter {
        out: String::with_capacity(64),
        opts,
    };

    emitter.symbol(symbol)?;
    Ok(emitter.out)
}

/// Compress a number the way MSVC does for dimensions and literals.
///
/// 1 through 10 become a single digit, everything else is written in hex using the
/// letters `A` through `P` and terminated by `@`.
pub fn encode_number(n: u64) -> String {
    if (1..=10).contains(&n) {
        return char::from(b'0' + (n - 1) as u8).to_string();
    }

    let mut encoded: String = format!("{n:X}")
        .bytes()
        .map(|digit| match digit {
            b'0'..=b'9' => char::from(b'A' + digit - b'0'),
            _ => char::from(b'K' + digit - b'A'),
        })
        .collect();

    encoded.push('@');
    encoded
}

fn encode_signed(n: i64) -> String {
    if n < 0 {
        format!("?{}", encode_number(n.unsigned_abs()))
    } else {
        encode_number(n as u64)
    }
}

bitflags! {
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    struct Modifiers: u32 {
        const CONST = 0b01;
        const PTR64 = 0b10;
    }
}

impl Modifiers {
    /// `<storage-class>` of a pointee or of `this`.
    fn storage_class(self) -> char {
        if self.contains(Modifiers::CONST) {
            'B'
        } else {
            'A'
        }
    }
}

struct Emitter<'a> {
    out: String,
    opts: &'a Options,
}

impl Emitter<'_> {
    fn symbol(&mut self, symbol: &Symbol) -> Result<()> {
        let name = symbol.name().ok_or(Error::Unsupported)?;

        // data symbols have no type encoding to go on
        if symbol.arguments.is_empty() {
            return Err(Error::Unsupported);
        }

        self.out.push('?');
        self.path(&symbol.path)?;

        if symbol.calling_conv == CallingConv::Thiscall {
            self.out.push('Q');
            let mut modi = Modifiers::empty();
            modi.set(Modifiers::CONST, symbol.is_const);
            self.modifiers(modi);
        } else {
            self.out.push('Y');
        }

        self.calling_conv(symbol.calling_conv);

        if name.is_ctor_or_dtor() {
            self.out.push('@');
        } else {
            match symbol.return_type {
                Some(ref ty) => self.return_type(ty)?,
                None => self.out.push('X'),
            }
        }

        self.params(&symbol.arguments)?;
        self.out.push('Z');
        Ok(())
    }

    /// Innermost segment first, closed by `@`.
    fn path(&mut self, path: &Path) -> Result<()> {
        for segment in path.iter().rev() {
            self.segment(segment)?;
        }

        self.out.push('@');
        Ok(())
    }

    fn segment(&mut self, segment: &Segment) -> Result<()> {
        let templated = !segment.template_args.is_empty();

        match segment.kind {
            SegmentKind::Name(ref name) => {
                if templated {
                    self.out.push_str("?$");
                }
                self.out.push_str(name);
                self.out.push('@');
            }
            SegmentKind::Operator(op, _) => {
                self.out.push_str(if templated { "?$?" } else { "?" });
                self.out.push_str(operator_code(op)?);
            }
        }

        if templated {
            for arg in segment.template_args.iter() {
                self.template_arg(arg)?;
            }
            self.out.push('@');
        }

        Ok(())
    }

    fn template_arg(&mut self, arg: &TemplateArg) -> Result<()> {
        match arg {
            TemplateArg::Type(ty) => self.qualified_value(ty),
            TemplateArg::Literal(_, value) => {
                self.out.push_str("$0");
                self.out.push_str(&encode_signed(*value));
                Ok(())
            }
        }
    }

    /// Types in positions without a storage class carry their constness with `$$CB`.
    fn qualified_value(&mut self, ty: &Type) -> Result<()> {
        if let Type::Regular(ref regular) = ty {
            let is_value = matches!(regular.kind, RegularKind::Builtin(_) | RegularKind::Custom(_));
            if regular.is_const && is_value {
                self.out.push_str("$$CB");
            }
        }

        self.ty(ty)
    }

    fn modifiers(&mut self, modi: Modifiers) {
        let modi = if self.opts.ptr64 {
            modi | Modifiers::PTR64
        } else {
            modi
        };

        if modi.contains(Modifiers::PTR64) {
            self.out.push('E');
        }

        self.out.push(modi.storage_class());
    }

    fn calling_conv(&mut self, calling_conv: CallingConv) {
        if self.opts.ptr64 {
            self.out.push('A');
            return;
        }

        self.out.push(match calling_conv {
            CallingConv::Unknown | CallingConv::Cdecl => 'A',
            CallingConv::Thiscall => 'E',
            CallingConv::Stdcall => 'G',
            CallingConv::Fastcall => 'I',
        });
    }

    /// Class and const qualified return types are marked with `?A` or `?B`.
    fn return_type(&mut self, ty: &Type) -> Result<()> {
        if let Type::Regular(ref regular) = ty {
            let marked = match regular.kind {
                RegularKind::Custom(_) => true,
                RegularKind::Builtin(_) => regular.is_const,
                _ => false,
            };

            if marked {
                self.out.push('?');
                self.out.push(if regular.is_const { 'B' } else { 'A' });
            }
        }

        self.ty(ty)
    }

    fn params(&mut self, params: &[Type]) -> Result<()> {
        if let [param] = params {
            if param.is_void() {
                self.out.push('X');
                return Ok(());
            }
        }

        for param in params {
            self.ty(param)?;
        }

        if !params.last().map_or(false, Type::is_varargs) {
            self.out.push('@');
        }

        Ok(())
    }

    fn ty(&mut self, ty: &Type) -> Result<()> {
        match ty {
            Type::Regular(regular) => match regular.kind {
                RegularKind::Builtin(builtin) => {
                    self.out.push_str(builtin_code(builtin)?);
                    Ok(())
                }
                RegularKind::Custom(ref path) => {
                    self.out.push('V');
                    self.path(path)
                }
                RegularKind::Pointer(ref pointee) => {
                    self.indirection(if regular.is_const { "Q" } else { "P" }, pointee)
                }
                RegularKind::Reference(ref pointee) => self.indirection("A", pointee),
                RegularKind::RValueReference(ref pointee) => self.indirection("$$Q", pointee),
            },
            Type::Function(func) => {
                self.out.push_str("$$A6");
                self.function(func)
            }
            Type::Array(array) => {
                self.out.push_str("$$B");
                self.array(array)
            }
        }
    }

    /// Pointers and references, `qualifier` is the letter for the indirection itself.
    fn indirection(&mut self, qualifier: &str, pointee: &Type) -> Result<()> {
        self.out.push_str(qualifier);

        match pointee {
            Type::Function(func) => {
                self.out.push('6');
                self.function(func)
            }
            Type::Array(array) => {
                // a const element is written as `$$CB` on the element instead
                self.modifiers(Modifiers::empty());
                self.array(array)
            }
            Type::Regular(_) => {
                let mut modi = Modifiers::empty();
                modi.set(Modifiers::CONST, pointee.is_const());
                self.modifiers(modi);
                self.ty(pointee)
            }
        }
    }

    fn function(&mut self, func: &Function) -> Result<()> {
        self.calling_conv(func.calling_conv);
        self.return_type(&func.return_type)?;
        self.params(&func.params)?;
        self.out.push('Z');
        Ok(())
    }

    /// Nested arrays are flattened into a single multi dimensional one.
    fn array(&mut self, array: &Array) -> Result<()> {
        let mut dimensions = vec![array.len.unwrap_or(0)];
        let mut element = &*array.element;

        while let Type::Array(inner) = element {
            dimensions.push(inner.len.unwrap_or(0));
            element = &inner.element;
        }

        self.out.push('Y');
        self.out.push_str(&encode_number(dimensions.len() as u64));
        for dimension in dimensions {
            self.out.push_str(&encode_number(dimension));
        }

        self.qualified_value(element)
    }
}

fn builtin_code(builtin: Builtin) -> Result<&'static str> {
    Ok(match builtin {
        Builtin::Void => "X",
        Builtin::Wchar => "_W",
        Builtin::Bool => "_N",
        Builtin::Char => "D",
        Builtin::SignedChar => "C",
        Builtin::UnsignedChar => "E",
        Builtin::Short => "F",
        Builtin::UnsignedShort => "G",
        Builtin::Int => "H",
        Builtin::UnsignedInt => "I",
        Builtin::Long => "J",
        Builtin::UnsignedLong => "K",
        Builtin::LongLong => "_J",
        Builtin::UnsignedLongLong => "_K",
        Builtin::Int128 => "_L",
        Builtin::UnsignedInt128 => "_M",
        Builtin::Float => "M",
        Builtin::Double => "N",
        Builtin::LongDouble => "O",
        Builtin::Varargs => "Z",
        Builtin::Char8 => "_Q",
        Builtin::Char16 => "_S",
        Builtin::Char32 => "_U",
        Builtin::Nullptr => "$$T",
        Builtin::Float128 => return Err(Error::Unsupported),
    })
}

fn operator_code(op: OperatorKind) -> Result<&'static str> {
    Ok(match op {
        OperatorKind::Constructor => "0",
        OperatorKind::Destructor => "1",
        OperatorKind::New => "2",
        OperatorKind::Delete => "3",
        OperatorKind::Assign => "4",
        OperatorKind::RightShift => "5",
        OperatorKind::LeftShift => "6",
        OperatorKind::Not => "7",
        OperatorKind::Equal => "8",
        OperatorKind::NotEqual => "9",
        OperatorKind::Subscript => "A",
        OperatorKind::Cast => "B",
        OperatorKind::Arrow => "C",
        OperatorKind::Multiply | OperatorKind::Deref => "D",
        OperatorKind::Increment => "E",
        OperatorKind::Decrement => "F",
        OperatorKind::Minus | OperatorKind::UnaryMinus => "G",
        OperatorKind::Plus | OperatorKind::UnaryPlus => "H",
        OperatorKind::BitAnd | OperatorKind::AddressOf => "I",
        OperatorKind::PointerToMember => "J",
        OperatorKind::Divide => "K",
        OperatorKind::Remainder => "L",
        OperatorKind::Less => "M",
        OperatorKind::LessEqual => "N",
        OperatorKind::Greater => "O",
        OperatorKind::GreaterEqual => "P",
        OperatorKind::Comma => "Q",
        OperatorKind::Call => "R",
        OperatorKind::Complement => "S",
        OperatorKind::BitXor => "T",
        OperatorKind::BitOr => "U",
        OperatorKind::LogicalAnd => "V",
        OperatorKind::LogicalOr => "W",
        OperatorKind::MultiplyAssign => "X",
        OperatorKind::PlusAssign => "Y",
        OperatorKind::MinusAssign => "Z",
        OperatorKind::DivideAssign => "_0",
        OperatorKind::RemainderAssign => "_1",
        OperatorKind::RightShiftAssign => "_2",
        OperatorKind::LeftShiftAssign => "_3",
        OperatorKind::BitAndAssign => "_4",
        OperatorKind::BitOrAssign => "_5",
        OperatorKind::BitXorAssign => "_6",
        OperatorKind::NewArray => "_U",
        OperatorKind::DeleteArray => "_V",
        OperatorKind::Spaceship => "__M",
        OperatorKind::Conditional | OperatorKind::SizeofType | OperatorKind::SizeofExpr => {
            return Err(Error::Unsupported)
        }
    })
}
