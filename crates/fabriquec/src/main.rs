//! Fabrique build-script compiler executable.
//!
//! Reads one Fabrique source file, compiles it to an immutable DAG, and
//! emits one textual build file per requested backend.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use fabrique::backend::{self, MakeFlavour};
use fabrique::diagnostics::ErrorReporter;
use fabrique::error::{CodeSpanReportGenerator, FabriqueError};
use fabrique::file::SourceFile;
use fabrique::fs::{Filesystem, OsFilesystem};
use indexmap::IndexMap;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelPadding, TermLogger, TerminalMode, ThreadLogMode};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendName {
    Ninja,
    Make,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Flavour {
    Posix,
    Bsd,
    Gnu,
}

impl From<Flavour> for MakeFlavour {
    fn from(flavour: Flavour) -> Self {
        match flavour {
            Flavour::Posix => MakeFlavour::Posix,
            Flavour::Bsd => MakeFlavour::Bsd,
            Flavour::Gnu => MakeFlavour::Gnu,
        }
    }
}

/// Compiles a Fabrique build script to one or more backend build files.
#[derive(Debug, Parser)]
#[command(name = "fabriquec", version, about)]
struct Cli {
    /// The Fabrique script to compile.
    source_file: PathBuf,

    /// Source root that `file(...)` paths and `import(...)` resolve
    /// against. Defaults to the source file's own directory.
    #[arg(long)]
    srcroot: Option<PathBuf>,

    /// Directory generated build files are written under.
    #[arg(long, default_value = ".")]
    buildroot: PathBuf,

    /// `name=value` definitions, exposed to the script as the `args` record.
    #[arg(long = "define", value_name = "NAME=VALUE")]
    defines: Vec<String>,

    /// Backend(s) to emit. Repeatable.
    #[arg(long = "backend", value_enum, default_values_t = [BackendName::Ninja])]
    backends: Vec<BackendName>,

    /// Make backend flavour; ignored for the Ninja backend.
    #[arg(long, value_enum, default_value = "posix")]
    flavour: Flavour,

    /// Recorded but unused: plugin loading is out of scope.
    #[arg(long = "plugin-path", value_name = "DIR")]
    plugin_paths: Vec<PathBuf>,
}

/// Splits `NAME=VALUE` into its two halves; `value` is still raw source
/// text here — `fabrique::compile` parses it through the expression
/// grammar and evaluates it before binding it into the script's `args`
/// record, so `count=3` ends up as `Int(3)`, not a string.
fn parse_define(raw: &str) -> Result<(String, String), FabriqueError> {
    match raw.split_once('=') {
        Some((name, value)) => Ok((name.to_string(), value.to_string())),
        None => Err(FabriqueError::InvalidDefine { raw: raw.to_string() }),
    }
}

/// Runs the compile-then-emit pipeline. Returns `Ok(false)` when a
/// SourceCodeError/SemanticError was reported (exit code 1) and `Err` for
/// UserError/OSError conditions (exit code 2); `Ok(true)` is a clean run.
fn run(cli: Cli) -> Result<bool, FabriqueError> {
    if !cli.plugin_paths.is_empty() {
        log::debug!("plugin paths recorded but not loaded: {:?}", cli.plugin_paths);
    }

    let fs = OsFilesystem;
    let source_file = &cli.source_file;

    let code = std::fs::read_to_string(source_file).map_err(|source| FabriqueError::Io { path: source_file.display().to_string(), source })?;

    let srcroot = cli.srcroot.clone().or_else(|| source_file.parent().map(Path::to_path_buf)).unwrap_or_else(|| PathBuf::from("."));

    let mut defines = IndexMap::new();
    for raw in &cli.defines {
        let (name, value) = parse_define(raw)?;
        defines.insert(name, value);
    }

    let file_name = source_file.file_name().map(|name| name.to_string_lossy().to_string()).unwrap_or_else(|| source_file.display().to_string());
    let source = SourceFile::new(vec![file_name], code);

    let outcome = fabrique::compile(source, srcroot.to_string_lossy().to_string(), cli.buildroot.to_string_lossy().to_string(), defines, &fs as &dyn Filesystem);

    let has_errors = outcome.has_errors();
    let mut reporter = ErrorReporter::new();
    for report in outcome.reports {
        reporter.report(report);
    }
    CodeSpanReportGenerator::generate(&reporter);

    if has_errors {
        return Ok(false);
    }

    std::fs::create_dir_all(&cli.buildroot).map_err(|source| FabriqueError::Io { path: cli.buildroot.display().to_string(), source })?;

    for backend_name in &cli.backends {
        let name = match backend_name {
            BackendName::Ninja => "ninja",
            BackendName::Make => "make",
        };
        let backend = backend::resolve(name, cli.flavour.into())?;
        let output_path = cli.buildroot.join(backend.default_output_name());
        let mut sink = std::fs::File::create(&output_path).map_err(|source| FabriqueError::Io { path: output_path.display().to_string(), source })?;
        backend.write(&outcome.dag, &mut sink).map_err(|source| FabriqueError::Io { path: output_path.display().to_string(), source })?;
        log::info!("wrote {}", output_path.display());
    }

    Ok(true)
}

fn main() -> ExitCode {
    let config = ConfigBuilder::new()
        .set_location_level(LevelFilter::Error)
        .set_thread_mode(ThreadLogMode::Both)
        .set_level_padding(LevelPadding::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    CombinedLogger::init(vec![TermLogger::new(LevelFilter::Info, config, TerminalMode::Mixed, ColorChoice::Auto)]).expect("logger should only be initialized once");

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::from(0),
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(2)
        }
    }
}
