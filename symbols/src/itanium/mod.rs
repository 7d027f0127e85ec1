//! Parser for function symbols mangled with the [Itanium C++ ABI][itanium].
//!
//! [itanium]: https://itanium-cxx-abi.github.io/cxx-abi/abi.html#mangling
//!
//! Only the subset of the grammar that describes functions is understood:
//!
//! ```text
//! <mangled-name> ::= _Z [L] <name> [<return-type>] <bare-function-type> [.<clone-suffix>]
//!
//! <name> ::= <nested-name>
//!        ::= <unscoped-name> [<template-args>]
//!        ::= St <unqualified-name> [<template-args>]
//!
//! <nested-name> ::= N [K] [R | O] <prefix> <unqualified-name> E
//!
//! <unqualified-name> ::= <operator-name>
//!                    ::= <ctor-dtor-name>
//!                    ::= <source-name> [B <source-name>]*
//!
//! <type> ::= <builtin-type>
//!        ::= <qualified-type>
//!        ::= <function-type>
//!        ::= <class-enum-type>
//!        ::= <array-type>
//!        ::= <template-param>
//!        ::= <substitution>
//!        ::= P <type> | R <type> | O <type>
//! ```
//!
//! A return type is only encoded for template instances, in which case it's the first
//! type after the name. Variables and special names such as vtables are rejected.

use std::cell::{Cell, RefCell};

use crate::ast::{CallingConv, Extent, OperatorKind, SegmentKind, Symbol, TemplateArg};
use crate::error::{Error, Result};

/// Keeps track of recursion levels and early returns with an error if there
/// is too much recursion.
macro_rules! try_begin_parse {
    ($ctx:expr) => {
        let _auto_check_recursion = $crate::itanium::AutoParseRecursion::new($ctx)?;
    };
}

mod cursor;
mod names;
mod subs;
mod tests;
mod types;

use cursor::Cursor;
use subs::SubstitutionTable;

/// Parse a mangled symbol such as `_ZN3Foo3barEi`.
///
/// Inputs that don't start with `_Z` fail with [`Error::NotMangled`].
pub fn parse(raw: &[u8]) -> Result<Symbol> {
    let mut input = Cursor::new(raw);

    // mach-o symbols carry an extra leading underscore
    if !input.eat_slice(b"_Z") && !input.eat_slice(b"__Z") {
        return Err(Error::NotMangled);
    }

    let ctx = ParseContext::new();
    let mut subs = SubstitutionTable::new();
    let symbol = parse_encoding(&ctx, &mut subs, &mut input)?;

    log::trace!("[itanium::parse] {:?}", subs);
    Ok(symbol)
}

fn parse_encoding(
    ctx: &ParseContext,
    subs: &mut SubstitutionTable,
    input: &mut Cursor,
) -> Result<Symbol> {
    try_begin_parse!(ctx);

    match input.peek() {
        // special names and local entities
        Some(b'T' | b'G' | b'Z') => return Err(Error::Unsupported),
        None => return Err(Error::UnexpectedEnd),
        _ => {}
    }

    // internal linkage
    input.eat(b'L');

    let (path, is_const) = names::parse_name(ctx, subs, input)?;
    let name = path.last().ok_or(Error::UnexpectedText)?;

    ctx.set_template_args(&name.template_args);

    let is_cast = name.operator_kind() == Some(OperatorKind::Cast);
    let mut return_type = None;
    if !name.template_args.is_empty() && !name.is_ctor_or_dtor() && !is_cast {
        return_type = Some(types::parse_type(ctx, subs, input)?);
    }

    let mut arguments = Vec::new();
    while !input.is_empty() {
        // vendor clone suffixes such as `.constprop.0` or `.cold`
        if input.peek() == Some(b'.') {
            break;
        }

        arguments.push(types::parse_type(ctx, subs, input)?);
    }

    if let SegmentKind::Operator(OperatorKind::Cast, Some(ref target)) = name.kind {
        return_type.get_or_insert_with(|| (**target).clone());
    }

    let calling_conv = if is_const || name.is_ctor_or_dtor() {
        CallingConv::Thiscall
    } else {
        CallingConv::Unknown
    };

    Ok(Symbol {
        path,
        arguments,
        return_type,
        is_const,
        calling_conv,
    })
}

#[derive(Debug, Default, Clone, Copy)]
struct ParseContextState {
    // The current recursion level. Should always be less than or equal to the
    // maximum.
    recursion_level: u32,
    // Nodes copied out of the substitution table and template args so far.
    nodes_copied: usize,
}

/// Common context needed when parsing.
#[derive(Debug)]
pub(crate) struct ParseContext {
    // Maximum amount of recursive parsing calls we will allow. If this is too
    // large, we can blow the stack.
    max_recursion: u32,
    // Maximum amount of nodes back references may expand to. Every reference
    // copies its target, so chained references grow exponentially.
    max_nodes: usize,
    // Mutable state within the `ParseContext`.
    state: Cell<ParseContextState>,
    // Template arguments of the function's own name, which `T_` refers to.
    template_args: RefCell<Vec<TemplateArg>>,
}

impl ParseContext {
    pub(crate) fn new() -> ParseContext {
        ParseContext {
            max_recursion: 96,
            max_nodes: 1 << 16,
            state: Cell::new(ParseContextState::default()),
            template_args: RefCell::new(Vec::new()),
        }
    }

    #[inline]
    fn enter_recursion(&self) -> Result<()> {
        let mut state = self.state.get();
        let new_recursion_level = state.recursion_level + 1;

        if new_recursion_level >= self.max_recursion {
            Err(Error::TooMuchRecursion)
        } else {
            state.recursion_level = new_recursion_level;
            self.state.set(state);
            Ok(())
        }
    }

    #[inline]
    fn exit_recursion(&self) {
        let mut state = self.state.get();
        debug_assert!(state.recursion_level >= 1);
        state.recursion_level -= 1;
        self.state.set(state);
    }

    /// Account for a value copied out of the substitution table.
    ///
    /// The copy ends up nested under the current recursion level, so the two together
    /// can't go past the maximum or dropping and emitting the value could blow the stack.
    fn charge(&self, extent: Extent) -> Result<()> {
        let mut state = self.state.get();

        if state.recursion_level.saturating_add(extent.depth) >= self.max_recursion {
            return Err(Error::TooMuchRecursion);
        }

        state.nodes_copied = state.nodes_copied.saturating_add(extent.nodes);
        if state.nodes_copied > self.max_nodes {
            return Err(Error::TooLarge);
        }

        self.state.set(state);
        Ok(())
    }

    fn set_template_args(&self, args: &[TemplateArg]) {
        *self.template_args.borrow_mut() = args.to_vec();
    }

    /// The `idx`'th template argument of the function being parsed.
    fn template_arg(&self, idx: usize) -> Result<TemplateArg> {
        let arg = self
            .template_args
            .borrow()
            .get(idx)
            .cloned()
            .ok_or(Error::BadTemplateArgReference)?;

        if let TemplateArg::Type(ref ty) = arg {
            self.charge(Extent::of_type(ty))?;
        }

        Ok(arg)
    }
}

/// An RAII type to automatically check the recursion level against the
/// maximum. If the maximum has been crossed, return an error. Otherwise,
/// increment the level upon construction, and decrement it upon destruction.
pub(crate) struct AutoParseRecursion<'a>(&'a ParseContext);

impl<'a> AutoParseRecursion<'a> {
    #[inline]
    pub(crate) fn new(ctx: &'a ParseContext) -> Result<AutoParseRecursion<'a>> {
        ctx.enter_recursion()?;
        Ok(AutoParseRecursion(ctx))
    }
}

impl<'a> Drop for AutoParseRecursion<'a> {
    #[inline]
    fn drop(&mut self) {
        self.0.exit_recursion();
    }
}
