//! "Foreach over an N-element list yields a List of exactly N elements,
//! preserving order" — scenario 2.

use indexmap::IndexMap;

use crate::eval::value::Value;
use crate::tests::memory_fs::MemoryFilesystem;
use crate::{compile, file::SourceFile};

#[test]
fn foreach_rewrites_each_element_in_order() {
    let fs = MemoryFilesystem::new([]);
    let source = SourceFile::new(
        vec!["build".into()],
        "srcs = [ \"a.c\" \"b.c\" ];\nobjs = foreach s <- srcs { \"o/\" + s };".to_string(),
    );
    let outcome = compile(source, "/src".to_string(), "/build".to_string(), IndexMap::new(), &fs);

    assert!(!outcome.has_errors(), "unexpected diagnostics: {:?}", outcome.reports);
    match outcome.dag.variables.get("objs") {
        Some(Value::List(items)) => {
            let rendered: Vec<_> = items.iter().map(Value::describe).collect();
            assert_eq!(rendered, vec!["\"o/a.c\"".to_string(), "\"o/b.c\"".to_string()]);
        }
        other => panic!("expected a list, got {other:?}"),
    }
}
