//! "A typed top-level binding evaluates its initializer and is visible in
//! `dag.variables`" — scenario 1.

use indexmap::IndexMap;

use crate::eval::value::Value;
use crate::tests::memory_fs::MemoryFilesystem;
use crate::{compile, file::SourceFile};

#[test]
fn typed_arithmetic_binding_is_recorded_as_a_variable() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(vec!["build".into()], "x: int = 1 + 2;".to_string());
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    match outcome.dag.variables.get("x") {
        Some(Value::Int(3)) => {}
        other => panic!("expected x = 3, got {other:?}"),
    }
}

#[test]
fn type_mismatch_reports_error_at_declaration() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(vec!["build".into()], "x: bool = 1 + 2;".to_string());
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(outcome.has_errors());
    assert!(matches!(outcome.dag.variables.get("x"), Some(Value::Unknown)));
}
