//! "A top-level list-of-File binding is promoted to a named Target" —
//! scenario 4.

use indexmap::IndexMap;

use crate::eval::value::Value;
use crate::tests::memory_fs::MemoryFilesystem;
use crate::{compile, file::SourceFile};

#[test]
fn top_level_file_list_becomes_a_target() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(vec!["build".into()], "all = [ file(\"a\") file(\"b\") ];".to_string());
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    let target = outcome.dag.targets.get("all").expect("'all' should be promoted to a target");
    match &target.value {
        Value::List(items) => assert_eq!(items.len(), 2),
        other => panic!("expected a list-of-file target, got {}", other.describe()),
    }
}

#[test]
fn explicit_target_groups_named_builds() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(
        vec!["build".into()],
        "cc = action(in: file[in], out: file[out]) { \"cc -c \" + in + \" -o \" + out };\n\
         o = cc(in: file(\"a.c\"), out: file(\"a.o\"));\n\
         app = target(name: \"app\", builds: [ o ]);"
            .to_string(),
    );
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    assert!(outcome.dag.targets.contains_key("app"));
}
