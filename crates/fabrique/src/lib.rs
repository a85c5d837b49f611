//! Fabrique build description compiler.
//!
//! Fabrique scripts describe a build graph — files, rules, and the builds
//! that connect them — in a small statically-typed expression language.
//! Compiling a script is a single pass:
//!
//! 1. **Parsing**: source text becomes a flat sequence of top-level
//!    [`ast::ValueDeclaration`]s ([`parser`]).
//! 2. **Evaluation**: declarations are evaluated in order, depth-first;
//!    evaluating an `action(...)` call or a `file(...)` expression
//!    registers graph entities directly into a [`dag::DagBuilder`]
//!    ([`eval`]).
//! 3. **Emission**: the frozen [`dag::Dag`] is handed to a [`backend::Backend`]
//!    that renders it as a native build file (Ninja or Make).
//!
//! There is no separate type-checking phase: declared types are checked
//! against a declaration's value as it is evaluated, using the structural
//! subtyping rules in [`types`]. Syntax and semantic problems are collected
//! as [`diagnostics::ErrorReport`]s rather than aborting the run — only a
//! handful of process-level failures (bad CLI input, an unreadable file) are
//! true [`error::FabriqueError`]s.

use indexmap::IndexMap;
use nom::Finish;

use dag::Dag;
use diagnostics::{ErrorReport, ErrorReporter};
use error::handle_parser;
use eval::{bind_defines, evaluate_file, EvalContext};
use file::SourceFile;
use fs::Filesystem;
use nom_tools::State;

pub mod ast;
pub mod backend;
pub mod builtins;
pub mod dag;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod file;
pub mod fs;
pub mod map;
pub mod nom_tools;
#[rustfmt::skip]
pub mod parser;
pub mod pretty;
pub mod types;

#[cfg(test)]
mod tests;

/// The result of compiling one top-level source file: the frozen build
/// graph plus every diagnostic collected while getting there. A caller
/// should check `reports` for `Severity::Error` before trusting `dag` —
/// failed declarations are represented in the graph as omissions, not as a
/// partial/corrupt `Dag`.
pub struct CompileOutcome {
    pub dag: Dag,
    pub reports: Vec<ErrorReport>,
}

impl CompileOutcome {
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|report| report.severity == diagnostics::Severity::Error)
    }
}

/// Runs the full pipeline — parse, evaluate, freeze — for a single
/// top-level source file.
///
/// `srcroot`/`buildroot` seed the `srcroot`/`buildroot` builtins and anchor
/// relative `file(...)` resolution; `defines` are parsed through the same
/// expression grammar as the script itself and become the `args` record
/// (so `--define count=3` binds `args.count` to `Int(3)`, not `Str("3")`).
pub fn compile(source: SourceFile, srcroot: String, buildroot: String, defines: IndexMap<String, String>, fs: &dyn Filesystem) -> CompileOutcome {
    let state = State::new(source);
    let mut parse_reporter = ErrorReporter::new();

    let ast = handle_parser(parser::parse(&state).finish(), &mut parse_reporter);

    let Some(ast) = ast else {
        return CompileOutcome { dag: Dag::default(), reports: parse_reporter.into_reports() };
    };

    let top_level = builtins::top_level_scope(&srcroot, &buildroot);
    let mut ctx = EvalContext::new(fs, srcroot, top_level);
    bind_defines(defines, &mut ctx);
    let variables = evaluate_file(&ast, &mut ctx);

    let mut reports = parse_reporter.into_reports();
    reports.extend(ctx.reporter.into_reports());

    CompileOutcome { dag: ctx.builder.freeze(variables), reports }
}
