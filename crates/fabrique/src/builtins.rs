//! Names injected into the top-level scope before a build script is
//! evaluated: `srcroot`, `buildroot`, `subdir`, `args`, and the `target(...)`
//! builtin function.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::eval::value::{Builtin, Value};
use crate::types::FileTag;

/// Builds the initial top-level scope for a compilation request, minus
/// `args` — `eval::bind_defines` inserts that once the CLI's `--define`
/// values have been parsed and evaluated against this same scope.
///
/// * `srcroot`/`buildroot` are file values tagged untagged (they are
///   directories, not build inputs/outputs).
/// * `subdir` starts out equal to `srcroot` — the file every bare
///   `file(...)` call joins against until a script rebinds it.
pub fn top_level_scope(srcroot_name: &str, buildroot_name: &str) -> IndexMap<String, Value> {
    use crate::dag::FileNode;

    let srcroot = Value::File(Rc::new(FileNode { name: srcroot_name.to_string(), tag: FileTag::Untagged }));
    let buildroot = Value::File(Rc::new(FileNode { name: buildroot_name.to_string(), tag: FileTag::Untagged }));

    let mut scope = IndexMap::new();
    scope.insert("subdir".to_string(), srcroot.clone());
    scope.insert("srcroot".to_string(), srcroot);
    scope.insert("buildroot".to_string(), buildroot);
    scope.insert("target".to_string(), Value::Builtin(Builtin::Target));
    scope
}
