//! `<type>` productions.

use super::cursor::Cursor;
use super::names::{self, Substitution};
use super::subs::{Substitutable, SubstitutionTable};
use super::ParseContext;
use crate::ast::{Array, Builtin, CallingConv, Extent, Function, Segment, TemplateArg, Type};
use crate::error::{Error, Result};

/// Single letter `<builtin-type>` codes.
pub(super) const BUILTINS: &[(u8, Builtin)] = &[
    (b'v', Builtin::Void),
    (b'w', Builtin::Wchar),
    (b'b', Builtin::Bool),
    (b'c', Builtin::Char),
    (b'a', Builtin::SignedChar),
    (b'h', Builtin::UnsignedChar),
    (b's', Builtin::Short),
    (b't', Builtin::UnsignedShort),
    (b'i', Builtin::Int),
    (b'j', Builtin::UnsignedInt),
    (b'l', Builtin::Long),
    (b'm', Builtin::UnsignedLong),
    (b'x', Builtin::LongLong),
    (b'y', Builtin::UnsignedLongLong),
    (b'n', Builtin::Int128),
    (b'o', Builtin::UnsignedInt128),
    (b'f', Builtin::Float),
    (b'd', Builtin::Double),
    (b'e', Builtin::LongDouble),
    (b'g', Builtin::Float128),
    (b'z', Builtin::Varargs),
];

/// `D` prefixed `<builtin-type>` codes.
pub(super) const EXTENDED_BUILTINS: &[(&[u8; 2], Builtin)] = &[
    (b"Du", Builtin::Char8),
    (b"Ds", Builtin::Char16),
    (b"Di", Builtin::Char32),
    (b"Dn", Builtin::Nullptr),
];

/// Consume a `<builtin-type>` if there is one.
pub(super) fn parse_builtin(input: &mut Cursor) -> Result<Option<Builtin>> {
    let byte = input.peek().ok_or(Error::UnexpectedEnd)?;

    if let Some(&(_, builtin)) = BUILTINS.iter().find(|(code, _)| *code == byte) {
        input.take()?;
        return Ok(Some(builtin));
    }

    for (code, builtin) in EXTENDED_BUILTINS {
        if input.eat_slice(*code) {
            return Ok(Some(*builtin));
        }
    }

    Ok(None)
}

pub(super) fn parse_type(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Type> {
    try_begin_parse!(ctx);

    if input.eat(b'K') {
        // the unqualified type is recorded before the qualified one
        let mut ty = parse_type(ctx, subs, input)?;
        ty.make_const()?;
        subs.insert(Substitutable::Type(ty.clone()));
        return Ok(ty);
    }

    let ty = match input.peek().ok_or(Error::UnexpectedEnd)? {
        b'S' => return parse_substituted_type(ctx, subs, input),
        b'T' => return parse_template_param(ctx, subs, input),
        b'P' => {
            input.take()?;
            Type::pointer(parse_type(ctx, subs, input)?)
        }
        b'R' => {
            input.take()?;
            Type::reference(parse_type(ctx, subs, input)?)
        }
        b'O' => {
            input.take()?;
            Type::rvalue_reference(parse_type(ctx, subs, input)?)
        }
        b'F' => parse_function_type(ctx, subs, input)?,
        b'A' => parse_array_type(ctx, subs, input)?,
        b'N' => {
            let (path, _) = names::parse_nested_name(ctx, subs, input)?;
            Type::custom(path)
        }
        b'0'..=b'9' => {
            let name = input.len_prefixed_name()?.ok_or(Error::UnexpectedText)?;
            let mut path = vec![Segment::name(name)];
            names::instantiate(ctx, subs, input, &mut path, true)?;
            Type::custom(path)
        }
        // volatile, restrict, vendor qualifiers, pointer to members and local types
        b'V' | b'r' | b'U' | b'u' | b'M' | b'Z' => return Err(Error::Unsupported),
        // packs, decltype and vector types
        b'D' if matches!(input.peek_second(), Some(b'p' | b't' | b'T' | b'v')) => {
            return Err(Error::Unsupported)
        }
        _ => {
            return match parse_builtin(input)? {
                Some(builtin) => Ok(Type::builtin(builtin)),
                None => Err(Error::UnexpectedText),
            }
        }
    };

    subs.insert_type(&ty);
    Ok(ty)
}

/// `<substitution>` or a standard abbreviation in place of a type.
///
/// A plain back reference isn't recorded again, an instantiated one is a new type.
fn parse_substituted_type(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Type> {
    let mut path = match input.peek_second() {
        Some(b'_' | b'0'..=b'9' | b'A'..=b'Z') => {
            input.take()?;
            let ty = subs.resolve_type(input.seq_id()?)?;
            ctx.charge(Extent::of_type(&ty))?;
            if input.peek() != Some(b'I') {
                return Ok(ty);
            }

            // <template-template-param> <template-args>
            ty.as_path().cloned().ok_or(Error::BadBackReference)?
        }
        _ => match names::parse_substitution(ctx, subs, input)? {
            Substitution::Std => {
                let name = input.len_prefixed_name()?.ok_or(Error::UnexpectedText)?;
                let mut path = vec![Segment::name("std"), Segment::name(name)];
                names::instantiate(ctx, subs, input, &mut path, true)?;

                let ty = Type::custom(path);
                subs.insert_type(&ty);
                return Ok(ty);
            }
            Substitution::Path(path) => path,
        },
    };

    if !names::instantiate(ctx, subs, input, &mut path, false)? {
        return Ok(Type::custom(path));
    }

    let ty = Type::custom(path);
    subs.insert_type(&ty);
    Ok(ty)
}

/// `<template-param> ::= T_ | T <number> _`
fn parse_template_param(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Type> {
    input.expect(b'T')?;

    let idx = match input.decimal()? {
        Some(n) => usize::try_from(n)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or(Error::Overflow)?,
        None => 0,
    };
    input.expect(b'_')?;

    let ty = match ctx.template_arg(idx)? {
        TemplateArg::Type(ty) => ty,
        TemplateArg::Literal(..) => return Err(Error::BadTemplateArgReference),
    };

    // template params are substitution candidates whatever they resolve to
    subs.insert(Substitutable::Type(ty.clone()));
    Ok(ty)
}

/// `<function-type> ::= F [Y] <return type> <parameter type>+ [<ref-qualifier>] E`
fn parse_function_type(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Type> {
    input.expect(b'F')?;
    input.eat(b'Y');

    let return_type = parse_type(ctx, subs, input)?;
    let mut params = Vec::new();

    loop {
        match input.peek().ok_or(Error::UnexpectedEnd)? {
            b'E' => {
                input.take()?;
                break;
            }
            b'R' | b'O' if input.peek_second() == Some(b'E') => {
                input.take()?;
            }
            _ => params.push(parse_type(ctx, subs, input)?),
        }
    }

    if params.is_empty() {
        return Err(Error::UnexpectedText);
    }

    Ok(Type::Function(Function {
        return_type: Box::new(return_type),
        params,
        calling_conv: CallingConv::Unknown,
    }))
}

/// `<array-type> ::= A [<dimension number>] _ <element type>`
fn parse_array_type(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Type> {
    input.expect(b'A')?;

    let len = input.decimal()?;
    input.expect(b'_')?;
    let element = parse_type(ctx, subs, input)?;

    Ok(Type::Array(Array {
        element: Box::new(element),
        len,
    }))
}
