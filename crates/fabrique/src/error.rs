//! Process-terminating errors and diagnostic rendering.
//!
//! `SourceCodeError`/`SemanticError` (syntax mistakes, type mismatches,
//! undefined names) are reported through [`crate::diagnostics::ErrorReporter`]
//! and never reach this module — evaluation keeps going past them. What
//! lands here is the handful of error kinds that legitimately stop the
//! compiler: a bad CLI invocation, a file the OS refuses to open, an
//! unknown backend name.

use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFiles,
    term::{self, termcolor::StandardStream},
};
use fabrique_macros::FabriqueError as FabriqueErrorDerive;
use fabrique_macros_core::SourceCode;
use nom_language::error::VerboseErrorKind;
use simplelog::ColorChoice;

use crate::{
    ast::FileAst,
    diagnostics::{ErrorReport, ErrorReporter, Severity, SourceRange},
    nom_tools::{State, ToRange},
};

/// File extension used when registering sources with `codespan-reporting`.
pub static FABRIQUE_LANG_EXT: &str = "fab";

pub type ParseError<'base> = nom_language::error::VerboseError<nom_locate::LocatedSpan<&'base str, State>>;
pub type ParseResult<'base> = Result<(nom_locate::LocatedSpan<&'base str, State>, FileAst), ParseError<'base>>;

/// Errors that stop the compiler outright instead of being accumulated as
/// diagnostics: bad CLI configuration or an OS-level failure.
#[derive(Debug, thiserror::Error, FabriqueErrorDerive)]
pub enum FabriqueError {
    #[error("unknown backend '{name}'")]
    #[diagnostic(code("fabrique::error::unknown_backend"), help("supported backends are 'ninja' and 'make'"))]
    UnknownBackend { name: String },

    #[error("could not read '{path}': {source}")]
    #[diagnostic(code("fabrique::error::io"))]
    Io { path: String, #[source] source: std::io::Error },

    #[error("module '{name}' could not be located under the source root")]
    #[diagnostic(code("fabrique::error::module_not_found"))]
    ModuleNotFound { name: String },

    #[error("invalid define '{raw}', expected name=value")]
    #[diagnostic(code("fabrique::error::invalid_define"))]
    InvalidDefine { raw: String },
}

/// Renders an [`ErrorReporter`]'s accumulated diagnostics to the terminal
/// using `codespan-reporting`, the same rendering stack the reference
/// implementation uses for its own error tree.
pub struct CodeSpanReportGenerator;

impl CodeSpanReportGenerator {
    pub fn generate(reporter: &ErrorReporter) {
        let mut files = SimpleFiles::new();
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = codespan_reporting::term::Config::default();

        for report in reporter.reports() {
            let source: SourceCode = (&report.range.file).into();
            let file_id = files.add(format!("{}.{}", source.name, FABRIQUE_LANG_EXT), source.source);

            let label = Label::primary(file_id, report.range.position.clone());
            let diagnostic = match report.severity {
                Severity::Error => Diagnostic::error(),
                Severity::Warning => Diagnostic::warning(),
                Severity::Note => Diagnostic::note(),
            }
            .with_message(report.message.clone())
            .with_labels(vec![label]);

            term::emit(&mut writer.lock(), &config, &files, &diagnostic).expect("writing diagnostic to stderr");
        }
    }
}

/// Converts a parse failure into a [`ErrorReport`] and pushes it onto
/// `reporter`; returns the parsed AST on success. Modeled directly on the
/// reference implementation's `handle_parser`, generalized from a single
/// fatal error into an accumulated diagnostic.
pub fn handle_parser(result: ParseResult<'_>, reporter: &mut ErrorReporter) -> Option<FileAst> {
    match result {
        Ok((_, parsed)) => Some(parsed),
        Err(error) => {
            for (span, kind) in error.errors.iter() {
                if let VerboseErrorKind::Context(message) = kind {
                    let range = SourceRange::new(span.to_range(), span.extra.file.clone());
                    reporter.report(ErrorReport::error(*message, range));
                }
            }
            None
        }
    }
}
