//! Semantic types for the Decaf compiler core.
//!
//! Types are interned: identical types share one [`TypeId`], so type
//! equivalence is id equality everywhere downstream - primitives by tag,
//! named types by name, array types structurally. The table is built once at
//! pipeline start and handed by reference through checking and lowering.

pub mod table;
pub mod ty;

pub use table::TypeTable;
pub use ty::{Ty, TypeId};
