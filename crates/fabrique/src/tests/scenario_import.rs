//! "import(...) evaluates the named module and returns a record of its
//! bindings; arguments passed to import become the module's `args`" —
//! scenario 6.

use indexmap::IndexMap;

use crate::eval::value::Value;
use crate::tests::memory_fs::MemoryFilesystem;
use crate::{compile, file::SourceFile};

#[test]
fn import_binds_arguments_into_the_module_args_record() {
    let fs = MemoryFilesystem::new([("/src/sub/module.fab", "out = args.opt;")]);
    let source = SourceFile::new(vec!["build".into()], "m = import(\"sub/module\", opt: \"v\");\nv = m.out;".to_string());
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    match outcome.dag.variables.get("v") {
        Some(Value::Str(value)) => assert_eq!(value.as_str(), "v"),
        other => panic!("expected v to be the imported module's 'out' field, got {other:?}"),
    }
}

#[test]
fn importing_an_unknown_module_reports_error() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(vec!["build".into()], "m = import(\"missing/module\");".to_string());
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(outcome.has_errors());
    assert!(matches!(outcome.dag.variables.get("m"), Some(Value::Unknown)));
}

#[test]
fn cyclic_imports_bottom_out_instead_of_looping() {
    let fs = MemoryFilesystem::new([("/src/a.fab", "b = import(\"b\");"), ("/src/b.fab", "a = import(\"a\");")]);
    let source = SourceFile::new(vec!["build".into()], "m = import(\"a\");".to_string());
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    assert!(matches!(outcome.dag.variables.get("m"), Some(Value::Record(_))));
}
