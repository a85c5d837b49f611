//! "One Rule; one Build whose expanded command substitutes `${in}`/`${out}`;
//! outputs include the generated file" — scenario 3.

use indexmap::IndexMap;

use crate::eval::value::Value;
use crate::tests::memory_fs::MemoryFilesystem;
use crate::{compile, file::SourceFile};

#[test]
fn action_call_produces_one_rule_and_one_build() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(
        vec!["build".into()],
        "cc = action(in: file[in], out: file[out]) { \"cc -c \" + in + \" -o \" + out };\n\
         o = cc(in: file(\"a.c\"), out: file(\"a.o\"));"
            .to_string(),
    );
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    assert_eq!(outcome.dag.rules.len(), 1);
    assert_eq!(outcome.dag.builds.len(), 1);

    let build = &outcome.dag.builds[0];
    assert_eq!(build.rule.command, "cc -c ${in} -o ${out}");
    assert_eq!(build.inputs.len(), 1);
    assert_eq!(build.outputs.len(), 1);
    assert!(outcome.dag.files.values().any(|file| file.name.ends_with("a.o")));

    match outcome.dag.variables.get("o") {
        Some(Value::Build(_)) => {}
        other => panic!("expected o to be bound to the build, got {other:?}"),
    }
}

#[test]
fn mismatched_parameter_arity_reports_error() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(
        vec!["build".into()],
        "cc = action(in: file[in], out: file[out]) { \"cc -c \" + in + \" -o \" + out };\n\
         o = cc(in: file(\"a.c\"));"
            .to_string(),
    );
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(outcome.has_errors());
    assert!(outcome.dag.builds.is_empty());
}
