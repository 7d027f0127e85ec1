//! Namespace paths, operator names and template arguments.

use super::cursor::Cursor;
use super::subs::SubstitutionTable;
use super::types::{parse_builtin, parse_type};
use super::ParseContext;
use crate::ast::{Builtin, Extent, OperatorKind, Path, Segment, TemplateArg, Type};
use crate::error::{Error, Result};

/// `<operator-name>` codes, `cv` is handled separately as it's followed by a type.
pub(super) const OPERATORS: &[(&[u8; 2], OperatorKind)] = &[
    (b"nw", OperatorKind::New),
    (b"na", OperatorKind::NewArray),
    (b"dl", OperatorKind::Delete),
    (b"da", OperatorKind::DeleteArray),
    (b"ps", OperatorKind::UnaryPlus),
    (b"ng", OperatorKind::UnaryMinus),
    (b"ad", OperatorKind::AddressOf),
    (b"de", OperatorKind::Deref),
    (b"co", OperatorKind::Complement),
    (b"pl", OperatorKind::Plus),
    (b"mi", OperatorKind::Minus),
    (b"ml", OperatorKind::Multiply),
    (b"dv", OperatorKind::Divide),
    (b"rm", OperatorKind::Remainder),
    (b"an", OperatorKind::BitAnd),
    (b"or", OperatorKind::BitOr),
    (b"eo", OperatorKind::BitXor),
    (b"aS", OperatorKind::Assign),
    (b"pL", OperatorKind::PlusAssign),
    (b"mI", OperatorKind::MinusAssign),
    (b"mL", OperatorKind::MultiplyAssign),
    (b"dV", OperatorKind::DivideAssign),
    (b"rM", OperatorKind::RemainderAssign),
    (b"aN", OperatorKind::BitAndAssign),
    (b"oR", OperatorKind::BitOrAssign),
    (b"eO", OperatorKind::BitXorAssign),
    (b"ls", OperatorKind::LeftShift),
    (b"rs", OperatorKind::RightShift),
    (b"lS", OperatorKind::LeftShiftAssign),
    (b"rS", OperatorKind::RightShiftAssign),
    (b"eq", OperatorKind::Equal),
    (b"ne", OperatorKind::NotEqual),
    (b"lt", OperatorKind::Less),
    (b"gt", OperatorKind::Greater),
    (b"le", OperatorKind::LessEqual),
    (b"ge", OperatorKind::GreaterEqual),
    (b"ss", OperatorKind::Spaceship),
    (b"nt", OperatorKind::Not),
    (b"aa", OperatorKind::LogicalAnd),
    (b"oo", OperatorKind::LogicalOr),
    (b"pp", OperatorKind::Increment),
    (b"mm", OperatorKind::Decrement),
    (b"cm", OperatorKind::Comma),
    (b"pm", OperatorKind::PointerToMember),
    (b"pt", OperatorKind::Arrow),
    (b"cl", OperatorKind::Call),
    (b"ix", OperatorKind::Subscript),
    (b"qu", OperatorKind::Conditional),
    (b"st", OperatorKind::SizeofType),
    (b"sz", OperatorKind::SizeofExpr),
];

/// What an `S` production in name position stands for.
pub(super) enum Substitution {
    /// `St`, needs to be followed by an unqualified name.
    Std,
    /// A standard abbreviation or a back reference.
    Path(Path),
}

/// `<name>` of an encoding, returns the path and whether it's a const method.
pub(super) fn parse_name(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<(Path, bool)> {
    try_begin_parse!(ctx);

    let mut path = match input.peek() {
        Some(b'N') => return parse_nested_name(ctx, subs, input),
        Some(b'S') => match parse_substitution(ctx, subs, input)? {
            Substitution::Std => {
                let name = parse_unqualified_name(ctx, subs, input, false)?;
                vec![Segment::name("std"), name]
            }
            Substitution::Path(path) => {
                // a substituted <unscoped-template-name> is only valid with arguments
                let mut path = path;
                if !instantiate(ctx, subs, input, &mut path, false)? {
                    return Err(Error::UnexpectedText);
                }
                return Ok((path, false));
            }
        },
        _ => vec![parse_unqualified_name(ctx, subs, input, false)?],
    };

    instantiate(ctx, subs, input, &mut path, true)?;
    Ok((path, false))
}

/// `<nested-name> ::= N [<CV-qualifiers>] [<ref-qualifier>] <prefix> <unqualified-name> E`
///
/// Every prefix that's followed by another segment is recorded, the complete path is left
/// for the caller to record.
pub(super) fn parse_nested_name(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<(Path, bool)> {
    try_begin_parse!(ctx);

    input.expect(b'N')?;
    let is_const = input.eat(b'K');
    if matches!(input.peek(), Some(b'V' | b'r')) {
        return Err(Error::Unsupported);
    }
    let _ = input.eat(b'R') || input.eat(b'O');

    let mut path = Path::new();
    // whether `path` hasn't been recorded as a prefix yet
    let mut fresh = false;

    loop {
        match input.peek() {
            Some(b'E') => {
                input.take()?;
                break;
            }
            None => return Err(Error::UnexpectedEnd),
            _ => {}
        }

        if fresh {
            subs.insert_prefix(&path);
        }

        if input.peek() == Some(b'S') {
            match parse_substitution(ctx, subs, input)? {
                Substitution::Std => {
                    path.push(Segment::name("std"));
                    fresh = false;
                    continue;
                }
                Substitution::Path(prefix) => {
                    path.extend(prefix);
                    fresh = false;
                }
            }
        } else {
            let segment = parse_unqualified_name(ctx, subs, input, !path.is_empty())?;
            path.push(segment);
            fresh = true;
        }

        if instantiate(ctx, subs, input, &mut path, fresh)? {
            fresh = true;
        }
    }

    if path.is_empty() {
        return Err(Error::UnexpectedText);
    }

    Ok((path, is_const))
}

/// Parses `<template-args>` onto the last segment of `path` if there are any.
///
/// When `record` is set the uninstantiated template name is recorded first.
pub(super) fn instantiate(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
    path: &mut Path,
    record: bool,
) -> Result<bool> {
    if input.peek() != Some(b'I') {
        return Ok(false);
    }

    if record {
        subs.insert_prefix(path);
    }

    let args = parse_template_args(ctx, subs, input)?;
    let last = path.last_mut().ok_or(Error::UnexpectedText)?;
    if !last.template_args.is_empty() {
        return Err(Error::UnexpectedText);
    }

    last.template_args = args;
    Ok(true)
}

/// `<unqualified-name>`, constructors and destructors require an enclosing segment.
fn parse_unqualified_name(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
    has_parent: bool,
) -> Result<Segment> {
    try_begin_parse!(ctx);

    match input.peek().ok_or(Error::UnexpectedEnd)? {
        b'0'..=b'9' => parse_source_name(input),
        b'L' => {
            input.take()?;
            parse_source_name(input)
        }
        b'C' | b'D' if !has_parent => Err(Error::MisplacedCtorDtor),
        b'C' => {
            input.take()?;
            // inheriting constructors name the base class
            let inheriting = input.eat(b'I');
            revision(input)?;
            if inheriting {
                parse_type(ctx, subs, input)?;
            }
            Ok(Segment::operator(OperatorKind::Constructor))
        }
        b'D' => {
            input.take()?;
            revision(input)?;
            Ok(Segment::operator(OperatorKind::Destructor))
        }
        b'a'..=b'z' => parse_operator(ctx, subs, input),
        // unnamed types and lambdas
        b'U' => Err(Error::Unsupported),
        _ => Err(Error::UnexpectedText),
    }
}

/// `<source-name>` followed by any amount of `<abi-tag>`s which are dropped.
fn parse_source_name(input: &mut Cursor) -> Result<Segment> {
    let name = input.len_prefixed_name()?.ok_or(Error::UnexpectedText)?;

    while input.eat(b'B') {
        input.len_prefixed_name()?.ok_or(Error::UnexpectedText)?;
    }

    Ok(Segment::name(name))
}

/// Constructor/destructor variant digit, it doesn't change the MSVC name.
fn revision(input: &mut Cursor) -> Result<()> {
    match input.take()? {
        b'0'..=b'9' => Ok(()),
        _ => Err(Error::UnexpectedText),
    }
}

fn parse_operator(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Segment> {
    let code = input.src().get(..2).ok_or(Error::UnexpectedEnd)?;

    if code == b"cv" {
        input.eat_slice(b"cv");
        let target = parse_type(ctx, subs, input)?;
        return Ok(Segment::cast(target));
    }

    let op = OPERATORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, op)| *op)
        .ok_or(Error::UnexpectedText)?;

    input.eat_slice(code);
    Ok(Segment::operator(op))
}

/// An `S` production in name position.
pub(super) fn parse_substitution(
    ctx: &ParseContext,
    subs: &SubstitutionTable,
    input: &mut Cursor,
) -> Result<Substitution> {
    input.expect(b'S')?;

    let std = |name: &str, args: Vec<TemplateArg>| {
        Substitution::Path(vec![Segment::name("std"), Segment::name(name).with_args(args)])
    };

    match input.peek().ok_or(Error::UnexpectedEnd)? {
        b't' => {
            input.take()?;
            Ok(Substitution::Std)
        }
        b'a' => {
            input.take()?;
            Ok(std("allocator", Vec::new()))
        }
        b'b' => {
            input.take()?;
            Ok(std("basic_string", Vec::new()))
        }
        b's' => {
            input.take()?;
            Ok(std("basic_string", vec![char_arg(), char_traits(), allocator()]))
        }
        b'i' => {
            input.take()?;
            Ok(std("basic_istream", vec![char_arg(), char_traits()]))
        }
        b'o' => {
            input.take()?;
            Ok(std("basic_ostream", vec![char_arg(), char_traits()]))
        }
        b'd' => {
            input.take()?;
            Ok(std("basic_iostream", vec![char_arg(), char_traits()]))
        }
        b'_' | b'0'..=b'9' | b'A'..=b'Z' => {
            let idx = input.seq_id()?;
            let path = subs.resolve_prefix(idx)?;
            ctx.charge(Extent::of_path(&path))?;
            Ok(Substitution::Path(path))
        }
        _ => Err(Error::UnexpectedText),
    }
}

fn char_arg() -> TemplateArg {
    TemplateArg::Type(Type::builtin(Builtin::Char))
}

fn char_traits() -> TemplateArg {
    TemplateArg::Type(Type::custom(vec![
        Segment::name("std"),
        Segment::name("char_traits").with_args(vec![char_arg()]),
    ]))
}

fn allocator() -> TemplateArg {
    TemplateArg::Type(Type::custom(vec![
        Segment::name("std"),
        Segment::name("allocator").with_args(vec![char_arg()]),
    ]))
}

/// `<template-args> ::= I <template-arg>+ E`
///
/// Literal arguments are wrapped in `L` .. `E` which can't nest.
pub(super) fn parse_template_args(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Vec<TemplateArg>> {
    try_begin_parse!(ctx);

    input.expect(b'I')?;

    let mut args = Vec::new();
    let mut in_literal = false;

    loop {
        match input.peek().ok_or(Error::UnexpectedEnd)? {
            b'E' => {
                input.take()?;
                if !in_literal {
                    break;
                }
                in_literal = false;
            }
            b'L' => {
                if in_literal {
                    return Err(Error::NestedLiteral);
                }
                input.take()?;
                in_literal = true;
            }
            _ if in_literal => args.push(parse_literal(input)?),
            // expressions and argument packs
            b'X' | b'J' => return Err(Error::Unsupported),
            _ => args.push(TemplateArg::Type(parse_type(ctx, subs, input)?)),
        }
    }

    Ok(args)
}

/// `<builtin-type> [n] <value number>`, the inside of an `L` .. `E` pair.
fn parse_literal(input: &mut Cursor) -> Result<TemplateArg> {
    let builtin = parse_builtin(input)?.ok_or(Error::UnexpectedText)?;
    let negative = input.eat(b'n');

    let value = match input.decimal()? {
        Some(value) => i64::try_from(value).map_err(|_| Error::Overflow)?,
        None if input.is_empty() => return Err(Error::UnexpectedEnd),
        None => return Err(Error::UnexpectedText),
    };

    Ok(TemplateArg::Literal(builtin, if negative { -value } else { value }))
}
