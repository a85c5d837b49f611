//! Source locations and the diagnostic accumulator threaded through the
//! parser, the type checker, and the evaluator.

use std::ops::Range;

use crate::file::SourceFile;

/// A single point in a source file, expressed as a byte offset. Kept
/// separate from [`SourceRange`] because some diagnostics (end-of-file
/// errors) only have a location, not a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub offset: usize,
}

/// A half-open byte range in a source file, together with the file it
/// belongs to. This is the position information carried by every AST node
/// and reported in every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub position: Range<usize>,
    pub file: SourceFile,
}

impl SourceRange {
    pub fn new(position: Range<usize>, file: SourceFile) -> Self {
        Self { position, file }
    }

    pub fn start(&self) -> SourceLocation {
        SourceLocation { offset: self.position.start }
    }

    /// The smallest range containing both `self` and `other`. Used to widen
    /// a range to cover an entire expression once its sub-parts are known.
    pub fn over(&self, other: &SourceRange) -> SourceRange {
        let start = self.position.start.min(other.position.start);
        let end = self.position.end.max(other.position.end);
        SourceRange::new(start..end, self.file.clone())
    }
}

/// Severity of a reported diagnostic, in ascending order of how much
/// trouble it causes evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// One diagnostic: a human-readable message, the location it applies to,
/// and its severity. `SourceCodeError` and `SemanticError` from the error
/// taxonomy both end up as `ErrorReport`s of `Severity::Error` — evaluation
/// keeps going after one is reported, substituting an unknown value where
/// the failed expression would have gone.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub range: SourceRange,
    pub severity: Severity,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>, range: SourceRange, severity: Severity) -> Self {
        Self { message: message.into(), range, severity }
    }

    pub fn error(message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(message, range, Severity::Error)
    }

    pub fn warning(message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(message, range, Severity::Warning)
    }

    pub fn note(message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(message, range, Severity::Note)
    }
}

/// Accumulates diagnostics across an entire compilation run. Plain data by
/// design — it gets threaded as `&mut ErrorReporter` through the parser,
/// checker, and evaluator rather than owned by any one of them, the same
/// way the reference implementation threads its `Vec<TirError>` through
/// the resolver phases.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    reports: Vec<ErrorReport>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, report: ErrorReport) {
        log::debug!("diagnostic reported: {} ({:?})", report.message, report.severity);
        self.reports.push(report);
    }

    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| r.severity == Severity::Error)
    }

    pub fn reports(&self) -> &[ErrorReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<ErrorReport> {
        self.reports
    }
}
