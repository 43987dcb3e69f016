//! The collecting error reporter.
//!
//! Both the binder and the checker push into one reporter. At the end of the
//! pipeline the errors are flushed in source-location order; if anything was
//! reported, code generation is suppressed.

use crate::error::SemanticError;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::Buffer;
use decaf_ast::Span;

/// Accumulates semantic errors across the analysis phases.
#[derive(Debug, Default)]
pub struct Reporter {
    errors: Vec<SemanticError>,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter { errors: Vec::new() }
    }

    pub fn report(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    /// True when nothing was reported; gates code generation.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    /// Consume the reporter, yielding errors in source-location order.
    /// The sort is stable so same-location errors keep report order.
    pub fn into_sorted(mut self) -> Vec<SemanticError> {
        self.errors.sort_by_key(|e| e.span().order_key());
        self.errors
    }
}

/// Render a batch of errors against the source text, one framed diagnostic
/// per error. The message strings themselves are the stable interface; the
/// framing is presentation only.
pub fn render(errors: &[SemanticError], file_name: &str, source: &str) -> String {
    let file = SimpleFile::new(file_name, source);
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    let mut buffer = Buffer::no_color();
    let config = term::Config::default();

    for error in errors {
        let range = byte_range(error.span(), &line_starts, source.len());
        let diagnostic = Diagnostic::error()
            .with_message(error.to_string())
            .with_labels(vec![Label::primary((), range)]);
        // Rendering into a memory buffer cannot fail.
        let _ = term::emit(&mut buffer, &config, &file, &diagnostic);
    }

    String::from_utf8_lossy(buffer.as_slice()).into_owned()
}

fn byte_range(span: Span, line_starts: &[usize], source_len: usize) -> std::ops::Range<usize> {
    if span.is_none() {
        return 0..0;
    }
    let line_start = line_starts
        .get(span.line.saturating_sub(1) as usize)
        .copied()
        .unwrap_or(source_len);
    let start = (line_start + span.col_start.saturating_sub(1) as usize).min(source_len);
    let end = (line_start + span.col_end as usize).min(source_len).max(start);
    start..end
}
