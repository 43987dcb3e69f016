//! The assignability relation.
//!
//! `source ~> target` decides assignments, argument passing, and returns.
//! Equivalence is interned-id equality; on top of that `error` poisons
//! silently, `null` flows into any reference type, and named types follow
//! the class hierarchy.

use crate::registry::Registry;
use decaf_types::{TypeTable, TypeId};

/// Read-only view over the type table and the class hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct AssignCx<'a> {
    types: &'a TypeTable,
    registry: &'a Registry,
}

impl<'a> AssignCx<'a> {
    pub fn new(types: &'a TypeTable, registry: &'a Registry) -> Self {
        AssignCx { types, registry }
    }

    /// Is `source` assignable to `target`?
    pub fn is_assignable(&self, source: TypeId, target: TypeId) -> bool {
        // Error poisons both directions without further diagnostics.
        if source == TypeTable::ERROR || target == TypeTable::ERROR {
            return true;
        }

        // Equivalence.
        if source == target {
            return true;
        }

        // null flows into any reference type.
        if source == TypeTable::NULL && self.types.is_reference(target) {
            return true;
        }

        // Named-to-named: subclass or interface implementation.
        let (src_decl, dst_decl) = match (
            self.registry.decl_of_named(source),
            self.registry.decl_of_named(target),
        ) {
            (Some(s), Some(d)) => (s, d),
            _ => return false,
        };

        if !self.registry.is_class(src_decl) {
            // An interface value is only assignable to its own type, which
            // equivalence already covered.
            return false;
        }

        if self.registry.is_class(dst_decl) {
            self.registry.extends_transitively(src_decl, dst_decl)
        } else {
            self.registry.implements_transitively(src_decl, dst_decl)
        }
    }

    /// Equality operands must be compatible in at least one direction.
    pub fn mutually_compatible(&self, left: TypeId, right: TypeId) -> bool {
        self.is_assignable(left, right) || self.is_assignable(right, left)
    }
}
