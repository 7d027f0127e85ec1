#![cfg(test)]

use super::*;
use crate::ast::{Builtin, Path, Segment, Type};

use quickcheck::{quickcheck, TestResult};

macro_rules! eq {
    ($mangled:literal => $expected:expr) => {
        let symbol = parse($mangled.as_bytes())
            .unwrap_or_else(|err| panic!("Parsing '{}' failed: {err}.", $mangled));

        assert_eq!(symbol, $expected, "{}", $mangled);
    };
}

macro_rules! none {
    ($mangled:literal => $err:expr) => {
        assert_eq!(parse($mangled.as_bytes()), Err($err), "{}", $mangled);
    };
}

fn int() -> Type {
    Type::builtin(Builtin::Int)
}

fn void() -> Type {
    Type::builtin(Builtin::Void)
}

fn path(names: &[&str]) -> Path {
    names.iter().map(|name| Segment::name(*name)).collect()
}

fn function(path: Path, arguments: Vec<Type>) -> Symbol {
    Symbol {
        path,
        arguments,
        ..Symbol::default()
    }
}

#[test]
fn basic() {
    eq!("_Z3fooi" => function(path(&["foo"]), vec![int()]));
    eq!("_ZN3Foo3barEi" => function(path(&["Foo", "bar"]), vec![int()]));
    eq!("_ZN5space3fooEii" => function(path(&["space", "foo"]), vec![int(), int()]));
    eq!("_ZL6helperv" => function(path(&["helper"]), vec![void()]));
}

#[test]
fn const_method() {
    eq!("_ZNK3Foo3barEv" => Symbol {
        path: path(&["Foo", "bar"]),
        arguments: vec![void()],
        return_type: None,
        is_const: true,
        calling_conv: CallingConv::Thiscall,
    });
}

#[test]
fn ctor_dtor() {
    let mut ctor = path(&["Foo"]);
    ctor.push(Segment::operator(OperatorKind::Constructor));

    eq!("_ZN3FooC1Ev" => Symbol {
        path: ctor,
        arguments: vec![void()],
        calling_conv: CallingConv::Thiscall,
        ..Symbol::default()
    });

    let mut dtor = path(&["ns", "Foo"]);
    dtor.push(Segment::operator(OperatorKind::Destructor));

    eq!("_ZN2ns3FooD2Ev" => Symbol {
        path: dtor,
        arguments: vec![void()],
        calling_conv: CallingConv::Thiscall,
        ..Symbol::default()
    });
}

#[test]
fn substitutions() {
    let const_char_ptr = Type::pointer(Type::builtin(Builtin::Char).with_const());
    eq!("_Z1fPKcS0_" => function(
        path(&["f"]),
        vec![const_char_ptr.clone(), const_char_ptr]
    ));

    let foo = Type::custom(path(&["Foo"]));
    eq!("_Z1fK3FooS_" => function(path(&["f"]), vec![foo.clone().with_const(), foo.clone()]));
    eq!("_Z1fK3FooS0_" => function(
        path(&["f"]),
        vec![foo.clone().with_const(), foo.clone().with_const()]
    ));

    let mut plus = path(&["Foo"]);
    plus.push(Segment::operator(OperatorKind::Plus));
    eq!("_ZN3FooplERKS_" => function(plus, vec![Type::reference(foo.with_const())]));

    let bar = Type::custom(path(&["ns", "Bar"]));
    eq!("_Z1fN2ns3BarES_S0_" => function(
        path(&["f"]),
        vec![bar.clone(), Type::custom(path(&["ns"])), bar]
    ));
}

#[test]
fn templates() {
    let vector = vec![
        Segment::name("std"),
        Segment::name("vector").with_args(vec![
            TemplateArg::Type(int()),
            TemplateArg::Type(Type::custom(vec![
                Segment::name("std"),
                Segment::name("allocator").with_args(vec![TemplateArg::Type(int())]),
            ])),
        ]),
    ];

    let mut push_back = vector.clone();
    push_back.push(Segment::name("push_back"));
    eq!("_ZNSt6vectorIiSaIiEE9push_backERKi" => function(
        push_back,
        vec![Type::reference(int().with_const())]
    ));

    let mut size = vector.clone();
    size.push(Segment::name("size"));
    eq!("_ZNKSt6vectorIiSaIiEE4sizeEv" => Symbol {
        path: size,
        arguments: vec![void()],
        is_const: true,
        calling_conv: CallingConv::Thiscall,
        ..Symbol::default()
    });

    eq!("_Z3maxIiET_S0_S0_" => Symbol {
        path: vec![Segment::name("max").with_args(vec![TemplateArg::Type(int())])],
        arguments: vec![int(), int()],
        return_type: Some(int()),
        ..Symbol::default()
    });

    let swap = vec![
        Segment::name("std"),
        Segment::name("swap").with_args(vec![TemplateArg::Type(int())]),
    ];
    eq!("_ZSt4swapIiEvRT_S1_" => Symbol {
        path: swap,
        arguments: vec![Type::reference(int()), Type::reference(int())],
        return_type: Some(void()),
        ..Symbol::default()
    });
}

#[test]
fn template_literals() {
    eq!("_Z3getILi5ELb1EEvv" => Symbol {
        path: vec![Segment::name("get").with_args(vec![
            TemplateArg::Literal(Builtin::Int, 5),
            TemplateArg::Literal(Builtin::Bool, 1),
        ])],
        arguments: vec![void()],
        return_type: Some(void()),
        ..Symbol::default()
    });

    eq!("_Z3getILin42EEvv" => Symbol {
        path: vec![Segment::name("get").with_args(vec![TemplateArg::Literal(Builtin::Int, -42)])],
        arguments: vec![void()],
        return_type: Some(void()),
        ..Symbol::default()
    });
}

#[test]
fn std_abbreviations() {
    let char_arg = || TemplateArg::Type(Type::builtin(Builtin::Char));
    let string = Type::custom(vec![
        Segment::name("std"),
        Segment::name("basic_string").with_args(vec![
            char_arg(),
            TemplateArg::Type(Type::custom(vec![
                Segment::name("std"),
                Segment::name("char_traits").with_args(vec![char_arg()]),
            ])),
            TemplateArg::Type(Type::custom(vec![
                Segment::name("std"),
                Segment::name("allocator").with_args(vec![char_arg()]),
            ])),
        ]),
    ]);

    eq!("_Z5printRKSs" => function(path(&["print"]), vec![Type::reference(string.with_const())]));
    eq!("_Z1fSa" => function(path(&["f"]), vec![Type::custom(path(&["std", "allocator"]))]));
}

#[test]
fn conversion_operator() {
    eq!("_ZNK3FoocviEv" => Symbol {
        path: vec![Segment::name("Foo"), Segment::cast(int())],
        arguments: vec![void()],
        return_type: Some(int()),
        is_const: true,
        calling_conv: CallingConv::Thiscall,
    });
}

#[test]
fn decorations() {
    let foo = function(path(&["foo"]), vec![int()]);

    eq!("__Z3fooi" => foo.clone());
    eq!("_Z3fooi.constprop.0" => foo.clone());
    eq!("_Z3fooB5cxx11i" => foo.clone());

    let symbol = parse(b"_Z3fooi\0_Z3bari").unwrap();
    assert_eq!(symbol, foo);
}

#[test]
fn not_mangled() {
    none!("main" => Error::NotMangled);
    none!("" => Error::NotMangled);
    none!("?add@@YAXHH@Z" => Error::NotMangled);
    none!("Z3fooi" => Error::NotMangled);
}

#[test]
fn malformed() {
    none!("_Z" => Error::UnexpectedEnd);
    none!("_Z3fooIi" => Error::UnexpectedEnd);
    none!("_Z10foo" => Error::UnexpectedEnd);
    none!("_ZN3Foo3bar" => Error::UnexpectedEnd);
    none!("_Z3fooQ" => Error::UnexpectedText);
    none!("_Z1fS_" => Error::BadBackReference);
    none!("_Z1fPiS0_" => Error::BadBackReference);
    none!("_Z1fT_" => Error::BadTemplateArgReference);
    none!("_Z3getILi1EEvT_" => Error::BadTemplateArgReference);
    none!("_Z1fILLi1EEEvv" => Error::NestedLiteral);
    none!("_ZC1v" => Error::MisplacedCtorDtor);
    none!("_ZNC1Ev" => Error::MisplacedCtorDtor);
    none!("_Z3getILi99999999999999999999EEvv" => Error::Overflow);
}

#[test]
fn unsupported() {
    none!("_ZTV3Foo" => Error::Unsupported);
    none!("_ZGVZ3foovE1x" => Error::Unsupported);
    none!("_ZZ3foovE1x" => Error::Unsupported);
    none!("_Z1fVi" => Error::Unsupported);
    none!("_Z1fM3FooFvvE" => Error::Unsupported);
}

#[test]
fn recursion_is_bounded() {
    let mut deep = b"_Z1f".to_vec();
    deep.extend(std::iter::repeat(b'P').take(500));
    deep.push(b'i');

    assert_eq!(parse(&deep), Err(Error::TooMuchRecursion));

    let mut shallow = b"_Z1f".to_vec();
    shallow.extend(std::iter::repeat(b'P').take(16));
    shallow.push(b'i');

    assert!(parse(&shallow).is_ok());
}

/// `S <seq-id> _` for the `idx`'th entry of the substitution table.
fn back_reference(idx: usize) -> String {
    if idx == 0 {
        return "S_".to_string();
    }

    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut n = idx - 1;
    let mut seq_id = Vec::new();
    loop {
        seq_id.push(DIGITS[n % 36]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    seq_id.reverse();

    format!("S{}_", String::from_utf8(seq_id).unwrap())
}

#[test]
fn back_reference_ids() {
    assert_eq!(back_reference(0), "S_");
    assert_eq!(back_reference(1), "S0_");
    assert_eq!(back_reference(37), "S10_");
}

/// `_Z1fPi` followed by `PS_`, `PS0_`, .. each wrapping the previous argument.
fn pointer_chain(len: usize) -> String {
    let mut mangled = "_Z1fPi".to_string();
    for idx in 0..len {
        mangled.push('P');
        mangled.push_str(&back_reference(idx));
    }
    mangled
}

#[test]
fn chained_back_references_are_bounded() {
    assert_eq!(parse(pointer_chain(3000).as_bytes()), Err(Error::TooMuchRecursion));
    assert_eq!(parse(pointer_chain(6000).as_bytes()), Err(Error::TooMuchRecursion));

    let symbol = parse(pointer_chain(16).as_bytes()).unwrap();
    assert_eq!(symbol.arguments.len(), 17);
    assert!(crate::msvc::emit(&symbol).is_ok());
}

/// `_Z1f1AIiE` followed by `len` arguments `B<prev, prev>`, doubling in size each time.
fn doubling_chain(len: usize) -> String {
    let mut mangled = "_Z1f1AIiE".to_string();
    for step in 1..=len {
        let prev = back_reference(2 * step - 1);
        mangled.push_str(&format!("1BI{prev}{prev}E"));
    }
    mangled
}

#[test]
fn doubling_back_references_are_bounded() {
    assert_eq!(parse(doubling_chain(24).as_bytes()), Err(Error::TooLarge));
    assert_eq!(parse(doubling_chain(64).as_bytes()), Err(Error::TooLarge));

    let symbol = parse(doubling_chain(4).as_bytes()).unwrap();
    assert_eq!(symbol.arguments.len(), 5);

    let a = Type::custom(vec![Segment::name("A").with_args(vec![TemplateArg::Type(int())])]);
    let b = Type::custom(vec![Segment::name("B").with_args(vec![
        TemplateArg::Type(a.clone()),
        TemplateArg::Type(a.clone()),
    ])]);
    assert_eq!(symbol.arguments[..2], [a, b]);
}

#[test]
fn data_symbols_have_no_arguments() {
    eq!("_ZN3Foo5countE" => function(path(&["Foo", "count"]), vec![]));
}

quickcheck! {
    fn never_panics(input: Vec<u8>) -> bool {
        let _ = parse(&input);
        true
    }

    fn never_panics_after_marker(input: Vec<u8>) -> bool {
        let mut mangled = b"_Z".to_vec();
        mangled.extend(input);
        let _ = parse(&mangled);
        true
    }

    fn requires_marker(input: Vec<u8>) -> TestResult {
        if input.starts_with(b"_Z") || input.starts_with(b"__Z") {
            return TestResult::discard();
        }

        TestResult::from_bool(parse(&input) == Err(Error::NotMangled))
    }
}
