//! Decaf AST crate - the tree handed to the semantic core.
//!
//! The parser (an external collaborator) produces a `Program` through the
//! [`AstBuilder`]; the semantic analyzer and the TAC lowerer both consume the
//! tree read-only. Expression nodes carry a dense [`ExprId`] so later phases
//! can attach per-expression facts (types, result locations) in side tables
//! instead of mutating the tree.

pub mod ast;
pub mod builder;
pub mod span;

pub use ast::*;
pub use builder::AstBuilder;
pub use span::Span;
