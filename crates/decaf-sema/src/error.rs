//! Semantic error kinds.
//!
//! One variant per user-visible diagnostic; every variant carries the span of
//! the offending node and renders a stable message. Errors are values - they
//! accumulate in the [`crate::report::Reporter`] and never abort the pipeline.

use decaf_ast::Span;
use thiserror::Error;

/// What kind of declaration a failed lookup was after. Keys the
/// `IdentifierNotDeclared` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookingFor {
    Type,
    Class,
    Interface,
    Variable,
    Function,
}

impl std::fmt::Display for LookingFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LookingFor::Type => "type",
            LookingFor::Class => "class",
            LookingFor::Interface => "interface",
            LookingFor::Variable => "variable",
            LookingFor::Function => "function",
        };
        write!(f, "{}", s)
    }
}

/// Errors reported during declaration resolution and type checking.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    #[error("Declaration of '{name}' here conflicts with declaration on line {}", .prev.line)]
    DeclConflict {
        name: String,
        span: Span,
        /// Location of the earlier declaration.
        prev: Span,
    },

    #[error("No declaration found for {kind} '{name}'")]
    IdentifierNotDeclared {
        name: String,
        kind: LookingFor,
        span: Span,
    },

    #[error("Method '{name}' must match inherited type signature")]
    OverrideMismatch { name: String, span: Span },

    #[error("Class '{class}' does not implement entire interface '{iface}'")]
    InterfaceNotImplemented {
        class: String,
        iface: String,
        span: Span,
    },

    #[error("Incompatible operand: {op} {ty}")]
    IncompatibleOperand { op: String, ty: String, span: Span },

    #[error("Incompatible operands: {left} {op} {right}")]
    IncompatibleOperands {
        op: String,
        left: String,
        right: String,
        span: Span,
    },

    #[error("'this' is only valid within class scope")]
    ThisOutsideClassScope { span: Span },

    #[error("{base} has no such field '{name}'")]
    FieldNotFoundInBase {
        name: String,
        base: String,
        span: Span,
    },

    #[error("{base} field '{name}' only accessible within class scope")]
    InaccessibleField {
        name: String,
        base: String,
        span: Span,
    },

    #[error("Function '{name}' expects {expected} arguments but {actual} given")]
    NumArgsMismatch {
        name: String,
        expected: usize,
        actual: usize,
        span: Span,
    },

    #[error("Incompatible argument {index}: {given} given, {expected} expected")]
    ArgMismatch {
        index: usize,
        given: String,
        expected: String,
        span: Span,
    },

    #[error("[] can only be applied to arrays")]
    BracketsOnNonArray { span: Span },

    #[error("Array subscript must be an integer")]
    SubscriptNotInteger { span: Span },

    #[error("Size for NewArray must be an integer")]
    NewArraySizeNotInteger { span: Span },

    #[error("Test expression must have boolean type")]
    TestNotBoolean { span: Span },

    #[error("break is only allowed inside a loop")]
    BreakOutsideLoop { span: Span },

    #[error("Incompatible return: {given} given, {expected} expected")]
    ReturnMismatch {
        given: String,
        expected: String,
        span: Span,
    },

    #[error("Incompatible argument {index}: {given} given, int/bool/string expected")]
    PrintArgMismatch {
        index: usize,
        given: String,
        span: Span,
    },
}

impl SemanticError {
    /// The location of the offending node.
    pub fn span(&self) -> Span {
        match self {
            SemanticError::DeclConflict { span, .. } => *span,
            SemanticError::IdentifierNotDeclared { span, .. } => *span,
            SemanticError::OverrideMismatch { span, .. } => *span,
            SemanticError::InterfaceNotImplemented { span, .. } => *span,
            SemanticError::IncompatibleOperand { span, .. } => *span,
            SemanticError::IncompatibleOperands { span, .. } => *span,
            SemanticError::ThisOutsideClassScope { span } => *span,
            SemanticError::FieldNotFoundInBase { span, .. } => *span,
            SemanticError::InaccessibleField { span, .. } => *span,
            SemanticError::NumArgsMismatch { span, .. } => *span,
            SemanticError::ArgMismatch { span, .. } => *span,
            SemanticError::BracketsOnNonArray { span } => *span,
            SemanticError::SubscriptNotInteger { span } => *span,
            SemanticError::NewArraySizeNotInteger { span } => *span,
            SemanticError::TestNotBoolean { span } => *span,
            SemanticError::BreakOutsideLoop { span } => *span,
            SemanticError::ReturnMismatch { span, .. } => *span,
            SemanticError::PrintArgMismatch { span, .. } => *span,
        }
    }
}
