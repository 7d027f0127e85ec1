//! Types dealing with the substitutions table.

use std::fmt;
use std::ops::Deref;

use crate::ast::{Path, Type};
use crate::error::{Error, Result};

/// An enumeration of all of the things that can end up in the substitution
/// table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Substitutable {
    /// A `<type>` production.
    Type(Type),

    /// A `<prefix>` or `<template-prefix>` production.
    Prefix(Path),
}

/// The table of substitutable components that we have parsed thus far, and for
/// which there are potential back-references.
///
/// A const qualified type always comes right after its unqualified form whenever that
/// form is itself substitutable, so `PKc` followed by `S0_` refers back to `PKc`
/// while `S_` is `Kc`.
#[derive(Clone, Default, PartialEq, Eq)]
pub(super) struct SubstitutionTable {
    substitutions: Vec<Substitutable>,
}

impl fmt::Debug for SubstitutionTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad("SubstitutionTable ")?;
        f.debug_map().entries(self.substitutions.iter().enumerate()).finish()
    }
}

impl SubstitutionTable {
    pub fn new() -> SubstitutionTable {
        Default::default()
    }

    pub fn insert(&mut self, entity: Substitutable) {
        self.substitutions.push(entity);
    }

    /// Record a type if it's a substitution candidate.
    pub fn insert_type(&mut self, ty: &Type) {
        if ty.is_complex() {
            self.insert(Substitutable::Type(ty.clone()));
        }
    }

    pub fn insert_prefix(&mut self, path: &Path) {
        self.insert(Substitutable::Prefix(path.clone()));
    }

    /// Resolve a back reference used in place of a type.
    pub fn resolve_type(&self, idx: usize) -> Result<Type> {
        match self.substitutions.get(idx) {
            Some(Substitutable::Type(ty)) => Ok(ty.clone()),
            Some(Substitutable::Prefix(path)) => Ok(Type::custom(path.clone())),
            None => Err(Error::BadBackReference),
        }
    }

    /// Resolve a back reference used in place of a namespace prefix.
    pub fn resolve_prefix(&self, idx: usize) -> Result<Path> {
        match self.substitutions.get(idx) {
            Some(Substitutable::Prefix(path)) => Ok(path.clone()),
            Some(Substitutable::Type(ty)) => ty.as_path().cloned().ok_or(Error::BadBackReference),
            None => Err(Error::BadBackReference),
        }
    }
}

impl Deref for SubstitutionTable {
    type Target = [Substitutable];

    fn deref(&self) -> &Self::Target {
        &self.substitutions[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Builtin, Segment};

    fn foo() -> Path {
        vec![Segment::name("Foo")]
    }

    #[test]
    fn builtins_are_not_recorded() {
        let mut subs = SubstitutionTable::new();
        subs.insert_type(&Type::builtin(Builtin::Char));
        subs.insert_type(&Type::builtin(Builtin::Char).with_const());

        assert_eq!(subs.len(), 1);
        assert_eq!(subs.resolve_type(0), Ok(Type::builtin(Builtin::Char).with_const()));
        assert_eq!(subs.resolve_type(1), Err(Error::BadBackReference));
    }

    #[test]
    fn resolving_clones() {
        let mut subs = SubstitutionTable::new();
        let ptr = Type::pointer(Type::builtin(Builtin::Int));
        subs.insert_type(&ptr);

        let mut resolved = subs.resolve_type(0).unwrap();
        resolved.make_const().unwrap();

        assert_eq!(subs.resolve_type(0), Ok(ptr));
    }

    #[test]
    fn prefixes() {
        let mut subs = SubstitutionTable::new();
        subs.insert_prefix(&foo());
        subs.insert_type(&Type::pointer(Type::builtin(Builtin::Int)));
        subs.insert_type(&Type::custom(foo()).with_const());

        assert_eq!(subs.resolve_prefix(0), Ok(foo()));
        assert_eq!(subs.resolve_type(0), Ok(Type::custom(foo())));
        assert_eq!(subs.resolve_prefix(1), Err(Error::BadBackReference));
        assert_eq!(subs.resolve_prefix(2), Err(Error::BadBackReference));
        assert_eq!(subs.resolve_prefix(3), Err(Error::BadBackReference));
    }
}
