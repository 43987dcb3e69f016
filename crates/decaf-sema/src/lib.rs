//! Semantic analysis for the Decaf compiler core.
//!
//! The pipeline is synchronous and single-threaded: declaration resolution
//! runs to completion, then type checking, then class layout. Semantic
//! errors never abort - they accumulate in the [`report::Reporter`], and any
//! error suppresses code generation by making [`analyze`] return the sorted
//! error list instead of an [`Analysis`].

pub mod assign;
pub mod binder;
pub mod checker;
pub mod error;
pub mod layout;
pub mod registry;
pub mod report;
pub mod symbols;

pub use assign::AssignCx;
pub use binder::{Binder, Binding};
pub use checker::{Checker, ExprTypes};
pub use error::{LookingFor, SemanticError};
pub use layout::{build_layouts, ClassLayout, Layouts, MethodSlot};
pub use registry::{DeclId, DeclInfo, Registry, VarKind};
pub use report::{render, Reporter};
pub use symbols::{ScopeId, ScopeKind, SymbolOrigin, SymbolTable, GLOBAL_SCOPE};

use decaf_ast::Program;
use decaf_types::TypeTable;

/// Everything code generation needs from analysis.
#[derive(Debug)]
pub struct Analysis {
    pub binding: Binding,
    pub expr_types: ExprTypes,
    pub layouts: Layouts,
}

/// Run the full analysis pipeline.
///
/// Returns the analysis when the program is clean, or every diagnostic in
/// source-location order when it is not. Callers must not generate code for
/// a program that produced diagnostics.
pub fn analyze(program: &Program, types: &mut TypeTable) -> Result<Analysis, Vec<SemanticError>> {
    let mut reporter = Reporter::new();

    let binding = Binder::new(program, types, &mut reporter).bind();
    let expr_types = Checker::new(program, &binding, types, &mut reporter).check(program);

    if !reporter.is_clean() {
        return Err(reporter.into_sorted());
    }

    let layouts = build_layouts(&binding.registry);
    Ok(Analysis {
        binding,
        expr_types,
        layouts,
    })
}
