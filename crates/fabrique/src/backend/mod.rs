//! Backend emission: rendering a frozen [`crate::dag::Dag`] as a textual
//! build file for an external build executor.
//!
//! Both backends share [`Formatter`], which turns any runtime [`Value`]
//! into the string form it takes wherever a backend needs one (a top-level
//! variable's right-hand side, a substituted argument). Neither backend
//! re-derives build graph data — everything a recipe needs (inputs,
//! outputs, the already-rendered command text) was computed once during
//! evaluation and is read verbatim off the `Dag`.

pub mod make;
pub mod ninja;

use std::io::Write;

use crate::error::FabriqueError;
use crate::eval::value::Value;

pub use make::{MakeBackend, MakeFlavour};
pub use ninja::NinjaBackend;

/// A build-file emitter. Implementations only ever read from the `Dag`;
/// emission cannot fail except through the underlying sink's I/O.
pub trait Backend {
    /// The filename a caller should write to when none was given
    /// explicitly (`build.ninja`, `Makefile`, ...).
    fn default_output_name(&self) -> &'static str;

    fn write(&self, dag: &crate::dag::Dag, sink: &mut dyn Write) -> std::io::Result<()>;
}

/// Resolves a backend by its CLI name. `flavour` only affects the Make
/// backend; it is ignored for Ninja.
pub fn resolve(name: &str, flavour: MakeFlavour) -> Result<Box<dyn Backend>, FabriqueError> {
    match name {
        "ninja" => Ok(Box::new(NinjaBackend)),
        "make" => Ok(Box::new(MakeBackend { flavour })),
        other => Err(FabriqueError::UnknownBackend { name: other.to_string() }),
    }
}

/// Converts a runtime [`Value`] to the string form backends substitute into
/// build-file text. Booleans are `true`/`false`, integers are decimal,
/// lists are space-joined, strings emit verbatim content with no added
/// quoting, and anything with no sensible textual form (functions,
/// records, and the remaining DAG-only variants) formats as the empty
/// string.
pub struct Formatter;

impl Formatter {
    pub fn format(value: &Value) -> String {
        match value {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Str(s) => s.as_str().to_string(),
            Value::File(file) => file.name.clone(),
            Value::List(items) => items.iter().map(Formatter::format).collect::<Vec<_>>().join(" "),
            Value::Function(_) | Value::Record(_) => String::new(),
            Value::Action(_) | Value::Builtin(_) | Value::Rule(_) | Value::Build(_) | Value::Target(_) | Value::Type(_) | Value::Unknown => String::new(),
        }
    }
}

/// Flattens a Target's underlying value (File, List-of-File, or Build) down
/// to the list of generated-file paths a backend should reference (a phony
/// target's prerequisites in Ninja, a convenience alias in Make).
pub(crate) fn target_file_names(value: &Value) -> Vec<String> {
    match value {
        Value::File(file) => vec![file.name.clone()],
        Value::List(items) => items.iter().flat_map(target_file_names).collect(),
        Value::Build(build) => build.outputs.iter().map(|file| file.name.clone()).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_name_is_rejected() {
        let result = resolve("msbuild", MakeFlavour::Posix);
        assert!(matches!(result, Err(FabriqueError::UnknownBackend { name }) if name == "msbuild"));
    }

    #[test]
    fn formatter_space_joins_lists() {
        let list = Value::List(std::rc::Rc::new(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(Formatter::format(&list), "1 2");
    }
}
