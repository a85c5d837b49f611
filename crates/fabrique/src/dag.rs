//! The immutable build graph produced by evaluation: deduplicated files,
//! rules (command templates), builds (rule applications), and named
//! targets grouping builds together.

use indexmap::IndexMap;
use std::rc::Rc;

use crate::eval::value::Value;
use crate::types::FileTag;

/// A single file referenced anywhere in the graph. Files are deduplicated
/// by their fully-qualified, buildroot-relative name: two `file(...)`
/// expressions that resolve to the same path share one `FileNode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub tag: FileTag,
}

/// A rule's command text may reference `${in}`/`${out}` sentinel tokens
/// that backends rewrite to their own placeholder syntax ($in/$out for
/// Ninja, $</$@-with-wordlist tricks for Make); every other parameter is
/// substituted with its concrete value when the rule is applied.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub command: String,
}

/// One application of a [`Rule`] to concrete inputs and outputs.
#[derive(Debug, Clone)]
pub struct Build {
    pub name: String,
    pub rule: Rc<Rule>,
    pub inputs: Vec<Rc<FileNode>>,
    pub outputs: Vec<Rc<FileNode>>,
    pub extra_deps: Vec<Rc<FileNode>>,
    pub extra_outputs: Vec<Rc<FileNode>>,
    pub arguments: IndexMap<String, Value>,
}

/// A named, backend-addressable result (`ninja mytarget`): either an
/// explicit `target(...)` call, or a top-level binding whose value is a
/// `File`, a `Build`, or a list of `File`s, promoted automatically per the
/// evaluator's naming rule.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub value: Value,
}

/// The frozen output of a successful evaluation.
#[derive(Debug, Default)]
pub struct Dag {
    pub files: IndexMap<String, Rc<FileNode>>,
    pub rules: Vec<Rc<Rule>>,
    pub builds: Vec<Rc<Build>>,
    pub targets: IndexMap<String, Rc<Target>>,
    /// Every top-level binding of the compiled file, by name — the `x` in
    /// `x: int = 1 + 2;` shows up here even though it creates no file, rule,
    /// build, or target.
    pub variables: IndexMap<String, Value>,
}

/// Append-only accumulator used while walking the AST; [`DagBuilder::freeze`]
/// turns it into an immutable [`Dag`] once evaluation finishes.
#[derive(Debug, Default)]
pub struct DagBuilder {
    files: IndexMap<String, Rc<FileNode>>,
    rules: Vec<Rc<Rule>>,
    builds: Vec<Rc<Build>>,
    targets: IndexMap<String, Rc<Target>>,
}

impl DagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file by fully-qualified name, returning the existing
    /// node if one with this name was already registered (even under a
    /// different tag — the first tag observed wins, per deduplication by
    /// name alone).
    pub fn register_file(&mut self, name: String, tag: FileTag) -> Rc<FileNode> {
        if let Some(existing) = self.files.get(&name) {
            return existing.clone();
        }
        log::debug!("registering file node '{name}'");
        let node = Rc::new(FileNode { name: name.clone(), tag });
        self.files.insert(name, node.clone());
        node
    }

    pub fn add_rule(&mut self, rule: Rule) -> Rc<Rule> {
        log::debug!("registering rule '{}'", rule.name);
        let rule = Rc::new(rule);
        self.rules.push(rule.clone());
        rule
    }

    pub fn add_build(&mut self, build: Build) -> Rc<Build> {
        log::debug!("registering build '{}'", build.name);
        let build = Rc::new(build);
        self.builds.push(build.clone());
        build
    }

    pub fn add_target(&mut self, name: String, value: Value) -> Rc<Target> {
        log::debug!("registering target '{name}'");
        let target = Rc::new(Target { name: name.clone(), value });
        self.targets.insert(name, target.clone());
        target
    }

    pub fn freeze(self, variables: IndexMap<String, Value>) -> Dag {
        Dag { files: self.files, rules: self.rules, builds: self.builds, targets: self.targets, variables }
    }
}
