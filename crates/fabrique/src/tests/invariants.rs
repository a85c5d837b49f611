//! Evaluation invariants and boundary behaviors that cut across scenarios,
//! rather than following one end-to-end script.

use indexmap::IndexMap;

use crate::eval::value::Value;
use crate::tests::memory_fs::MemoryFilesystem;
use crate::{compile, file::SourceFile};

fn run(source: &str) -> crate::CompileOutcome {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(vec!["build".into()], source.to_string());
    compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs)
}

#[test]
fn a_file_referenced_twice_is_a_single_dag_entry() {
    let outcome = run("a = file(\"shared.txt\");\nb = file(\"shared.txt\");");
    assert!(!outcome.has_errors());
    assert_eq!(outcome.dag.files.len(), 1);
}

#[test]
fn foreach_over_n_elements_yields_n_elements_in_order() {
    let outcome = run("xs = [ 1 2 3 ];\nys = foreach x <- xs { x + 1 };");
    assert!(!outcome.has_errors());
    match outcome.dag.variables.get("ys") {
        Some(Value::List(items)) => {
            let described = items.iter().map(Value::describe).collect::<Vec<_>>();
            assert_eq!(described, vec!["2".to_string(), "3".to_string(), "4".to_string()]);
        }
        other => panic!("expected ys to be a list, got {other:?}"),
    }
}

#[test]
fn conditional_with_incompatible_arm_types_reports_error() {
    let outcome = run("x = if true { 1 } else { \"s\" };");
    assert!(outcome.has_errors());
    assert!(matches!(outcome.dag.variables.get("x"), Some(Value::Unknown)));
}

#[test]
fn conditional_with_compatible_arm_types_is_fine() {
    let outcome = run("x = if true { 1 } else { 2 };");
    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    assert!(matches!(outcome.dag.variables.get("x"), Some(Value::Int(1))));
}

#[test]
fn action_with_no_out_tagged_parameter_reports_error() {
    let outcome = run("cc = action(in: file[in]) { \"cc -c \" + in };");
    assert!(outcome.has_errors());
    assert!(matches!(outcome.dag.variables.get("cc"), Some(Value::Unknown)));
}

#[test]
fn redefinition_in_the_same_scope_reports_error() {
    let outcome = run("x = 1;\nx = 2;");
    assert!(outcome.has_errors());
    // Evaluation still continues past the redefinition.
    assert!(matches!(outcome.dag.variables.get("x"), Some(Value::Int(2))));
}

#[test]
fn mixed_positional_and_named_arguments_report_error() {
    let outcome = run(
        "cc = action(in: file[in], out: file[out]) { \"cc -c \" + in + \" -o \" + out };\n\
         o = cc(file(\"a.c\"), out: file(\"a.o\"));",
    );
    assert!(outcome.has_errors());
}

#[test]
fn missing_non_default_argument_reports_error() {
    let outcome = run("f = function(a: int, b: int) { a + b };\nv = f(a: 1);");
    assert!(outcome.has_errors());
    assert!(matches!(outcome.dag.variables.get("v"), Some(Value::Unknown)));
}

#[test]
fn missing_argument_with_a_default_uses_it() {
    let outcome = run("f = function(a: int, b: int = 10) { a + b };\nv = f(a: 1);");
    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    assert!(matches!(outcome.dag.variables.get("v"), Some(Value::Int(11))));
}

#[test]
fn build_with_the_same_file_as_input_and_output_reports_error() {
    let outcome = run("cc = action(in: file[in], out: file[out]) { \"cc -c \" + in + \" -o \" + out };\nb = cc(in: file(\"a.c\"), out: file(\"a.c\"));");
    assert!(outcome.has_errors());
    assert!(outcome.dag.builds.is_empty());
}

#[test]
fn every_target_points_to_an_already_present_value() {
    let outcome = run("all = [ file(\"a\") file(\"b\") ];");
    assert!(!outcome.has_errors());
    let target = outcome.dag.targets.get("all").expect("target should exist");
    match &target.value {
        Value::List(items) => {
            for item in items.iter() {
                if let Value::File(file) = item {
                    assert!(outcome.dag.files.contains_key(&file.name));
                } else {
                    panic!("expected a file in the target's list, got {}", item.describe());
                }
            }
        }
        other => panic!("expected a list-of-file target, got {}", other.describe()),
    }
}
