//! Runtime values produced by the evaluator. These double as DAG entities
//! where the two coincide (`Value::File` wraps the same [`FileNode`] stored
//! in the [`crate::dag::Dag`]).

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Expr, Parameter};
use crate::dag::{Build, FileNode, Rule, Target};
use crate::types::TypeId;

/// A lexical scope: add-only for the lifetime of the block it belongs to,
/// which is all the ordering guarantee (no forward references) requires.
/// Shared via `Rc` so closures can capture it cheaply.
pub type Scope = Rc<RefCell<IndexMap<String, Value>>>;

pub fn new_scope() -> Scope {
    Rc::new(RefCell::new(IndexMap::new()))
}

/// A function literal together with the scope it closed over at the point
/// it was created.
#[derive(Debug, Clone)]
pub struct Closure {
    pub parameters: Vec<Parameter>,
    pub body: Rc<Expr>,
    pub captured: Vec<Scope>,
}

/// An `action { ... }` literal: like a closure, but its body is expected to
/// evaluate to the rule's command text rather than an ordinary value, and
/// calling it produces a [`Build`] instead of invoking the body directly.
#[derive(Debug, Clone)]
pub struct ActionTemplate {
    pub declared_name: Option<String>,
    pub parameters: Vec<Parameter>,
    pub body: Rc<Expr>,
    pub captured: Vec<Scope>,
}

/// Identifies one of the small set of natively-implemented functions
/// (currently just `target`) that need direct access to the evaluator's
/// `DagBuilder` and so cannot be expressed as ordinary Fabrique closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Target,
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Rc<String>),
    File(Rc<FileNode>),
    List(Rc<Vec<Value>>),
    Record(Rc<IndexMap<String, Value>>),
    Function(Rc<Closure>),
    /// An unapplied `action { ... }` literal; calling it produces a `Build`.
    Action(Rc<ActionTemplate>),
    Builtin(Builtin),
    Rule(Rc<Rule>),
    Build(Rc<Build>),
    Target(Rc<Target>),
    Type(TypeId),
    /// Substituted in place of any expression that failed to evaluate
    /// after an error was reported, so evaluation of sibling expressions
    /// can continue.
    Unknown,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            Value::File(f) => Some(&f.name),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil => false,
            Value::Unknown => false,
            _ => true,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Str(s) => format!("\"{s}\""),
            Value::File(f) => format!("file({})", f.name),
            Value::List(items) => format!("[{}]", items.iter().map(Value::describe).collect::<Vec<_>>().join(", ")),
            Value::Record(fields) => {
                let body = fields.iter().map(|(k, v)| format!("{k}: {}", v.describe())).collect::<Vec<_>>().join(", ");
                format!("{{{body}}}")
            }
            Value::Function(_) => "<function>".to_string(),
            Value::Action(_) => "<action>".to_string(),
            Value::Builtin(_) => "<builtin>".to_string(),
            Value::Rule(rule) => format!("<rule {}>", rule.name),
            Value::Build(build) => format!("<build {}>", build.name),
            Value::Target(target) => format!("<target {}>", target.name),
            Value::Type(_) => "<type>".to_string(),
            Value::Unknown => "<unknown>".to_string(),
        }
    }
}
