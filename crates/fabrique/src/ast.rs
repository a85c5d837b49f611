//! Abstract syntax tree for Fabrique build scripts.
//!
//! The grammar is small and flat by design: a file is a sequence of
//! top-level value declarations, and every expression form nests inside a
//! single tagged-sum [`Expr`] enum rather than one struct per production.
//! Every node carries the [`SpanInfo`] it was parsed from so diagnostics
//! can always point at source.

use std::rc::Rc;

use crate::file::SourceFile;
use crate::nom_tools::SpanInfo;

/// Literal values recognized directly by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// A bareword filename literal such as `foo.txt` appearing where a
    /// `file(...)` expression is expected to be inferred.
    Filename(String),
}

/// A `name: Type` style parameter, used for function parameters and action
/// argument declarations.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_expr: Rc<TypeExpr>,
    /// `name: type = expr` — evaluated at call time when the caller omits
    /// this parameter.
    pub default: Option<Rc<Expr>>,
    pub span: SpanInfo,
}

/// A syntactic type reference, resolved to a `TypeId` during evaluation.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Named(String),
    List(Rc<TypeExpr>),
    Maybe(Rc<TypeExpr>),
    File(Option<FileTagExpr>),
    Record(Vec<(String, Rc<TypeExpr>)>),
    Function(Vec<Rc<TypeExpr>>, Rc<TypeExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTagExpr {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    PrefixWith,
    ScalarAdd,
    Subtract,
    Multiply,
    Divide,
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
}

/// A single `key: value` pair inside a record literal.
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub name: String,
    pub value: Rc<Expr>,
    pub span: SpanInfo,
}

/// A single `name arg1 arg2 ...` positional or named call argument.
#[derive(Debug, Clone)]
pub struct CallArgument {
    pub name: Option<String>,
    pub value: Rc<Expr>,
}

/// A top-level or nested `let`-style binding: `name = expr` or
/// `name: Type = expr`.
#[derive(Debug, Clone)]
pub struct ValueDeclaration {
    pub name: String,
    pub type_expr: Option<Rc<TypeExpr>>,
    pub value: Rc<Expr>,
    pub span: SpanInfo,
}

/// Every expression form in the language. `Expr` is cheap to share: nodes
/// that appear in multiple places (a function body referenced by closures
/// captured at different call sites, an import's bound record) are wrapped
/// in `Rc` by their parents rather than duplicated.
#[derive(Debug, Clone)]
pub enum Expr {
    BoolLiteral { value: bool, span: SpanInfo },
    IntLiteral { value: i64, span: SpanInfo },
    StringLiteral { value: String, span: SpanInfo },
    FilenameLiteral { value: String, span: SpanInfo },

    List { items: Vec<Rc<Expr>>, span: SpanInfo },
    Record { entries: Vec<RecordEntry>, span: SpanInfo },

    Conditional { condition: Rc<Expr>, then_branch: Rc<Expr>, else_branch: Rc<Expr>, span: SpanInfo },

    /// A `{ decl; decl; ...; expr }` block: declarations open a nested
    /// scope, and the block evaluates to its trailing expression.
    CompoundExpression { declarations: Vec<ValueDeclaration>, result: Rc<Expr>, span: SpanInfo },

    /// `foreach x <- list { expr }`, producing a new list.
    Foreach { binding: String, source: Rc<Expr>, body: Rc<Expr>, span: SpanInfo },

    Function { parameters: Vec<Parameter>, result_type: Option<Rc<TypeExpr>>, body: Rc<Expr>, span: SpanInfo },

    Call { callee: Rc<Expr>, arguments: Vec<CallArgument>, span: SpanInfo },

    /// `action { command: "...", inputs: [...], outputs: [...] }`-style
    /// rule template, compiling to a DAG `Rule`.
    Action { parameters: Vec<Parameter>, command: Rc<Expr>, span: SpanInfo },

    File { path: Rc<Expr>, tag: Option<FileTagExpr>, span: SpanInfo },
    FileList { paths: Rc<Expr>, tag: Option<FileTagExpr>, span: SpanInfo },

    NameReference { name: String, span: SpanInfo },
    FieldAccess { base: Rc<Expr>, field: String, span: SpanInfo },
    /// `record?.field`-style query that yields `nil` instead of an error
    /// when the base is `nil` or the field is absent.
    FieldQuery { base: Rc<Expr>, field: String, span: SpanInfo },

    UnaryOp { operator: UnaryOperator, operand: Rc<Expr>, span: SpanInfo },
    BinaryOp { operator: BinaryOperator, left: Rc<Expr>, right: Rc<Expr>, span: SpanInfo },

    Some { inner: Rc<Expr>, span: SpanInfo },

    /// `import("path", name: expr, ...)`. Every argument must be named —
    /// they become the `args` record injected into the imported module's
    /// top-level scope.
    Import { path: String, arguments: Vec<CallArgument>, span: SpanInfo },

    TypeDeclaration { name: String, type_expr: Rc<TypeExpr>, span: SpanInfo },

    /// `debug(expr)` — evaluates `expr` and also emits its value and type
    /// as a `Severity::Note` diagnostic, for script authors debugging a
    /// build file.
    DebugTracePoint { inner: Rc<Expr>, span: SpanInfo },
}

impl Expr {
    pub fn span(&self) -> &SpanInfo {
        match self {
            Expr::BoolLiteral { span, .. }
            | Expr::IntLiteral { span, .. }
            | Expr::StringLiteral { span, .. }
            | Expr::FilenameLiteral { span, .. }
            | Expr::List { span, .. }
            | Expr::Record { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::CompoundExpression { span, .. }
            | Expr::Foreach { span, .. }
            | Expr::Function { span, .. }
            | Expr::Call { span, .. }
            | Expr::Action { span, .. }
            | Expr::File { span, .. }
            | Expr::FileList { span, .. }
            | Expr::NameReference { span, .. }
            | Expr::FieldAccess { span, .. }
            | Expr::FieldQuery { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::BinaryOp { span, .. }
            | Expr::Some { span, .. }
            | Expr::Import { span, .. }
            | Expr::TypeDeclaration { span, .. }
            | Expr::DebugTracePoint { span, .. } => span,
        }
    }
}

/// A fully parsed source file: a flat sequence of top-level declarations,
/// evaluated in order per the no-forward-reference ordering guarantee.
#[derive(Debug, Clone)]
pub struct FileAst {
    pub file: SourceFile,
    pub declarations: Vec<ValueDeclaration>,
}
