//! The tree-walking evaluator. A single depth-first pass over the AST both
//! computes values and populates the [`crate::dag::DagBuilder`] — there is
//! no separate resolve/finish phase, because the language's no-forward-
//! reference ordering guarantee means every name a declaration uses is
//! already bound by the time that declaration is reached.

pub mod operators;
pub mod value;

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{CallArgument, Expr, FileAst, FileTagExpr, Parameter, TypeExpr, ValueDeclaration};
use crate::dag::{Build, DagBuilder, FileNode, Rule};
use crate::diagnostics::{ErrorReport, ErrorReporter, SourceRange};
use crate::fs::Filesystem;
use crate::nom_tools::SpanInfo;
use crate::types::{FileTag, RecordField, TypeContext, TypeId};

use value::{new_scope, ActionTemplate, Builtin, Closure, Scope, Value};

/// Everything threaded through a single evaluation run: the type interning
/// table, accumulated diagnostics, the build graph under construction, and
/// the scope stack. One `EvalContext` is built per compiled top-level file
/// (imports nest inside it, sharing the same builder and reporter).
pub struct EvalContext<'a> {
    pub types: TypeContext,
    pub reporter: ErrorReporter,
    pub builder: DagBuilder,
    fs: &'a dyn Filesystem,
    srcroot: String,
    scopes: Vec<Scope>,
    current_name: Vec<Option<String>>,
    anon_counter: usize,
    imports: IndexMap<String, Value>,
}

impl<'a> EvalContext<'a> {
    pub fn new(fs: &'a dyn Filesystem, srcroot: String, top_level: IndexMap<String, Value>) -> Self {
        let root = new_scope();
        root.borrow_mut().extend(top_level);
        Self {
            types: TypeContext::new(),
            reporter: ErrorReporter::new(),
            builder: DagBuilder::new(),
            fs,
            srcroot,
            scopes: vec![root],
            current_name: Vec::new(),
            anon_counter: 0,
            imports: IndexMap::new(),
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(new_scope());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn define(&mut self, name: String, value: Value) {
        self.scopes.last().expect("at least the root scope is always present").borrow_mut().insert(name, value);
    }

    fn is_defined_in_current_scope(&self, name: &str) -> bool {
        self.scopes.last().expect("at least the root scope is always present").borrow().contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes.iter().rev().find_map(|scope| scope.borrow().get(name).cloned())
    }

    fn fresh_name(&mut self, prefix: &str) -> String {
        let index = self.anon_counter;
        self.anon_counter += 1;
        format!("${prefix}{index}")
    }

    fn begin_name(&mut self, name: Option<String>) {
        self.current_name.push(name);
    }

    fn end_name(&mut self) {
        self.current_name.pop();
    }

    fn current_name(&self) -> Option<&str> {
        self.current_name.last().and_then(|name| name.as_deref())
    }

    fn subdir(&self) -> String {
        match self.lookup("subdir") {
            Some(Value::File(file)) => file.name.clone(),
            _ => self.srcroot.clone(),
        }
    }
}

/// Evaluates every declaration of a file in order, returning the bindings
/// it produced (used both for the top-level script and for `import`).
pub fn evaluate_file(ast: &FileAst, ctx: &mut EvalContext) -> IndexMap<String, Value> {
    evaluate_declarations(&ast.declarations, ctx)
}

fn evaluate_declarations(declarations: &[ValueDeclaration], ctx: &mut EvalContext) -> IndexMap<String, Value> {
    let mut bound = IndexMap::new();
    for decl in declarations {
        let value = evaluate_declaration(decl, ctx);
        bound.insert(decl.name.clone(), value);
    }
    bound
}

fn evaluate_declaration(decl: &ValueDeclaration, ctx: &mut EvalContext) -> Value {
    let range: SourceRange = decl.span.clone().into();
    if ctx.is_defined_in_current_scope(&decl.name) {
        ctx.reporter.report(ErrorReport::error(format!("'{}' is already defined in this scope", decl.name), range.clone()));
    }

    if let Expr::TypeDeclaration { name, type_expr, .. } = decl.value.as_ref() {
        let underlying = resolve_type_expr(type_expr, ctx, &range);
        let value = Value::Type(ctx.types.user_type(name.clone(), underlying));
        ctx.define(decl.name.clone(), value.clone());
        return value;
    }

    ctx.begin_name(Some(decl.name.clone()));
    let mut value = evaluate(&decl.value, ctx);
    ctx.end_name();

    if let Some(declared) = &decl.type_expr {
        let declared_id = resolve_type_expr(declared, ctx, &range);
        if let Some(actual_id) = infer_type(&value, ctx) {
            if !ctx.types.is_subtype(actual_id, declared_id) {
                ctx.reporter.report(ErrorReport::error(
                    format!("'{}' declared as {} but value has type {}", decl.name, ctx.types.describe(declared_id), ctx.types.describe(actual_id)),
                    range.clone(),
                ));
                value = Value::Unknown;
            }
        }
    }

    ctx.define(decl.name.clone(), value.clone());

    // A top-level binding whose value is a File, a Build, or a list of
    // Files is automatically promoted to a named Target.
    if ctx.scopes.len() == 1 && is_target_worthy(&value) {
        ctx.builder.add_target(decl.name.clone(), value.clone());
    }

    value
}

fn is_target_worthy(value: &Value) -> bool {
    match value {
        Value::File(_) | Value::Build(_) => true,
        Value::List(items) => !items.is_empty() && items.iter().all(|item| matches!(item, Value::File(_))),
        _ => false,
    }
}

/// Best-effort structural type of a runtime value, used to check a
/// declaration's value against its declared type. Values with no useful
/// static shape (functions, rules, builds) are left unchecked.
fn infer_type(value: &Value, ctx: &mut EvalContext) -> Option<TypeId> {
    Some(match value {
        Value::Nil => ctx.types.nil(),
        Value::Bool(_) => ctx.types.boolean(),
        Value::Int(_) => ctx.types.integer(),
        Value::Str(_) => ctx.types.string(),
        Value::File(file) => ctx.types.file_type(file.tag),
        Value::List(items) => {
            let element = match items.first() {
                Some(first) => infer_type(first, ctx)?,
                None => ctx.types.nil(),
            };
            ctx.types.list_of(element)
        }
        Value::Record(fields) => {
            let mut resolved = Vec::with_capacity(fields.len());
            for (name, field_value) in fields.iter() {
                resolved.push(RecordField { name: name.clone(), ty: infer_type(field_value, ctx)? });
            }
            ctx.types.record_type(resolved)
        }
        Value::Type(_) => return None,
        _ => return None,
    })
}

/// A side-effect-free best guess at an expression's type, used only to
/// check a conditional's untaken arm against the taken one without
/// actually evaluating it (which would double-register any DAG entities
/// the untaken branch builds). Anything that can't be typed this way
/// (calls, actions, imports, field access, ...) yields `None`, and the
/// conditional is left unchecked rather than risk a false positive.
fn static_shape(expr: &Expr, ctx: &mut EvalContext) -> Option<TypeId> {
    match expr {
        Expr::BoolLiteral { .. } => Some(ctx.types.boolean()),
        Expr::IntLiteral { .. } => Some(ctx.types.integer()),
        Expr::StringLiteral { .. } => Some(ctx.types.string()),
        Expr::FilenameLiteral { .. } => Some(ctx.types.file_type(FileTag::Untagged)),
        Expr::NameReference { name, .. } => infer_type(&ctx.lookup(name)?, ctx),
        Expr::Some { inner, .. } => {
            let inner = static_shape(inner, ctx)?;
            Some(ctx.types.maybe_of(inner))
        }
        Expr::List { items, .. } => {
            let element = match items.first() {
                Some(first) => static_shape(first, ctx)?,
                None => ctx.types.nil(),
            };
            Some(ctx.types.list_of(element))
        }
        _ => None,
    }
}

fn resolve_type_expr(type_expr: &TypeExpr, ctx: &mut EvalContext, range: &SourceRange) -> TypeId {
    match type_expr {
        TypeExpr::Named(name) => {
            if let Some(id) = ctx.types.find(name) {
                return id;
            }
            match ctx.lookup(name) {
                Some(Value::Type(id)) => id,
                _ => {
                    ctx.reporter.report(ErrorReport::error(format!("unknown type '{name}'"), range.clone()));
                    ctx.types.nil()
                }
            }
        }
        TypeExpr::List(inner) => {
            let inner = resolve_type_expr(inner, ctx, range);
            ctx.types.list_of(inner)
        }
        TypeExpr::Maybe(inner) => {
            let inner = resolve_type_expr(inner, ctx, range);
            ctx.types.maybe_of(inner)
        }
        TypeExpr::File(tag) => ctx.types.file_type(file_tag_of(*tag)),
        TypeExpr::Record(fields) => {
            let resolved = fields.iter().map(|(name, field_type)| RecordField { name: name.clone(), ty: resolve_type_expr(field_type, ctx, range) }).collect();
            ctx.types.record_type(resolved)
        }
        TypeExpr::Function(params, result) => {
            let params = params.iter().map(|param| resolve_type_expr(param, ctx, range)).collect();
            let result = resolve_type_expr(result, ctx, range);
            ctx.types.function_type(params, result)
        }
    }
}

fn file_tag_of(tag: Option<FileTagExpr>) -> FileTag {
    match tag {
        Some(FileTagExpr::In) => FileTag::In,
        Some(FileTagExpr::Out) => FileTag::Out,
        None => FileTag::Untagged,
    }
}

pub fn evaluate(expr: &Expr, ctx: &mut EvalContext) -> Value {
    match expr {
        Expr::BoolLiteral { value, .. } => Value::Bool(*value),
        Expr::IntLiteral { value, .. } => Value::Int(*value),
        Expr::StringLiteral { value, .. } => Value::Str(Rc::new(value.clone())),
        Expr::FilenameLiteral { value, .. } => register_file_path(value.clone(), None, ctx),

        Expr::List { items, .. } => Value::List(Rc::new(items.iter().map(|item| evaluate(item, ctx)).collect())),

        Expr::Record { entries, .. } => {
            let mut fields = IndexMap::new();
            for entry in entries {
                let value = evaluate(&entry.value, ctx);
                fields.insert(entry.name.clone(), value);
            }
            Value::Record(Rc::new(fields))
        }

        Expr::Conditional { condition, then_branch, else_branch, span } => match evaluate(condition, ctx) {
            Value::Unknown => Value::Unknown,
            other => {
                let (taken, untaken) = if other.truthy() { (then_branch, else_branch) } else { (else_branch, then_branch) };
                let result = evaluate(taken, ctx);
                if let (Some(taken_ty), Some(untaken_ty)) = (infer_type(&result, ctx), static_shape(untaken, ctx)) {
                    if ctx.types.supertype(taken_ty, untaken_ty) == ctx.types.nil() {
                        ctx.reporter.report(ErrorReport::error(
                            format!("conditional arms have incompatible types ({} vs {})", ctx.types.describe(taken_ty), ctx.types.describe(untaken_ty)),
                            span.clone().into(),
                        ));
                        return Value::Unknown;
                    }
                }
                result
            }
        },

        Expr::CompoundExpression { declarations, result, .. } => {
            ctx.push_scope();
            evaluate_declarations(declarations, ctx);
            let value = evaluate(result, ctx);
            ctx.pop_scope();
            value
        }

        Expr::Foreach { binding, source, body, span } => match evaluate(source, ctx) {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    ctx.push_scope();
                    ctx.define(binding.clone(), item.clone());
                    out.push(evaluate(body, ctx));
                    ctx.pop_scope();
                }
                Value::List(Rc::new(out))
            }
            Value::Unknown => Value::Unknown,
            other => {
                ctx.reporter.report(ErrorReport::error(format!("foreach expects a list, found {}", other.describe()), span.clone().into()));
                Value::Unknown
            }
        },

        Expr::Function { parameters, body, .. } => Value::Function(Rc::new(Closure { parameters: parameters.clone(), body: body.clone(), captured: ctx.scopes.clone() })),

        Expr::Call { callee, arguments, span } => eval_call(callee, arguments, span, ctx),

        Expr::Action { parameters, command, span } => {
            // A file-typed action parameter (possibly wrapped in `list[...]`)
            // must be tagged `file[in]` or `file[out]`; an untagged `file`
            // parameter is rejected outright rather than defaulted.
            fn file_tag(type_expr: &TypeExpr) -> Option<Option<FileTagExpr>> {
                match type_expr {
                    TypeExpr::File(tag) => Some(*tag),
                    TypeExpr::List(inner) => file_tag(inner),
                    _ => None,
                }
            }

            let mut has_output = false;
            let mut ok = true;
            for param in parameters {
                match file_tag(&param.type_expr) {
                    Some(Some(FileTagExpr::Out)) => has_output = true,
                    Some(Some(FileTagExpr::In)) => {}
                    Some(None) => {
                        ctx.reporter.report(ErrorReport::error(
                            format!("action parameter '{}' must be file[in] or file[out], not untagged file", param.name),
                            span.clone().into(),
                        ));
                        ok = false;
                    }
                    None => {}
                }
            }
            if !has_output {
                ctx.reporter.report(ErrorReport::error("action declares no 'out'-tagged parameter", span.clone().into()));
                ok = false;
            }
            if !ok {
                return Value::Unknown;
            }
            Value::Action(Rc::new(ActionTemplate {
                declared_name: ctx.current_name().map(str::to_string),
                parameters: parameters.clone(),
                body: command.clone(),
                captured: ctx.scopes.clone(),
            }))
        }

        Expr::File { path, tag, span } => match evaluate(path, ctx).as_str() {
            Some(text) => register_file_path(text.to_string(), *tag, ctx),
            None => {
                let described = evaluate(path, ctx).describe();
                ctx.reporter.report(ErrorReport::error(format!("file(...) expects a string path, found {described}"), span.clone().into()));
                Value::Unknown
            }
        },

        Expr::FileList { paths, tag, span } => match evaluate(paths, ctx) {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    match item.as_str() {
                        Some(text) => out.push(register_file_path(text.to_string(), *tag, ctx)),
                        None => {
                            ctx.reporter.report(ErrorReport::error(format!("files[...] expects a list of strings, found {}", item.describe()), span.clone().into()));
                            out.push(Value::Unknown);
                        }
                    }
                }
                Value::List(Rc::new(out))
            }
            Value::Unknown => Value::Unknown,
            other => {
                ctx.reporter.report(ErrorReport::error(format!("files[...] expects a list of strings, found {}", other.describe()), span.clone().into()));
                Value::Unknown
            }
        },

        Expr::NameReference { name, span } => match ctx.lookup(name) {
            Some(value) => value,
            None => {
                ctx.reporter.report(ErrorReport::error(format!("'{name}' is not defined"), span.clone().into()));
                Value::Unknown
            }
        },

        Expr::FieldAccess { base, field, span } => match evaluate(base, ctx) {
            Value::Record(fields) => fields.get(field).cloned().unwrap_or_else(|| {
                ctx.reporter.report(ErrorReport::error(format!("record has no field '{field}'"), span.clone().into()));
                Value::Unknown
            }),
            Value::Unknown => Value::Unknown,
            other => {
                ctx.reporter.report(ErrorReport::error(format!("'.{field}' on non-record value {}", other.describe()), span.clone().into()));
                Value::Unknown
            }
        },

        Expr::FieldQuery { base, field, .. } => match evaluate(base, ctx) {
            Value::Record(fields) => fields.get(field).cloned().unwrap_or(Value::Nil),
            _ => Value::Nil,
        },

        Expr::UnaryOp { operator, operand, span } => {
            let value = evaluate(operand, ctx);
            operators::eval_unary(*operator, value, &span.clone().into(), &mut ctx.reporter)
        }

        Expr::BinaryOp { operator, left, right, span } => {
            let left = evaluate(left, ctx);
            let right = evaluate(right, ctx);
            operators::eval_binary(*operator, left, right, &span.clone().into(), &mut ctx.reporter)
        }

        Expr::Some { inner, .. } => evaluate(inner, ctx),

        Expr::Import { path, arguments, span } => eval_import(path, arguments, span, ctx),

        Expr::TypeDeclaration { name, type_expr, span } => {
            let range: SourceRange = span.clone().into();
            let underlying = resolve_type_expr(type_expr, ctx, &range);
            Value::Type(ctx.types.user_type(name.clone(), underlying))
        }

        Expr::DebugTracePoint { inner, span } => {
            let value = evaluate(inner, ctx);
            ctx.reporter.report(ErrorReport::note(format!("debug: {}", value.describe()), span.clone().into()));
            value
        }
    }
}

/// Parses each CLI `--define NAME=VALUE` value through the expression
/// grammar and evaluates it, binding the results as the `args` record in
/// `ctx`'s root scope before the script itself is evaluated. A value that
/// fails to parse as an expression falls back to a plain string so one bad
/// `--define` doesn't abort the whole compile.
pub fn bind_defines(defines: IndexMap<String, String>, ctx: &mut EvalContext) {
    use nom::Finish;

    let mut args = IndexMap::new();
    for (name, raw) in defines {
        let file = crate::file::SourceFile::new(vec!["<define>".to_string(), name.clone()], raw.clone());
        let state = crate::nom_tools::State::new(file.clone());
        let input = crate::nom_tools::NomSpan::new_extra(file.code(), state);

        let value = match crate::parser::expression::parse(input).finish() {
            Ok((_, expr)) => evaluate(&expr, ctx),
            Err(_) => {
                ctx.reporter
                    .report(ErrorReport::error(format!("could not parse define '{name}={raw}' as an expression"), SourceRange::new(0..raw.len(), file)));
                Value::Str(Rc::new(raw))
            }
        };
        args.insert(name, value);
    }
    ctx.define("args".to_string(), Value::Record(Rc::new(args)));
}

fn register_file_path(path: String, tag: Option<FileTagExpr>, ctx: &mut EvalContext) -> Value {
    let subdir = ctx.subdir();
    let fq = if ctx.fs.path_is_absolute(&path) { path } else { ctx.fs.join_path(&subdir, &path) };
    Value::File(ctx.builder.register_file(fq, file_tag_of(tag)))
}

fn eval_call(callee: &Expr, arguments: &[CallArgument], span: &SpanInfo, ctx: &mut EvalContext) -> Value {
    match evaluate(callee, ctx) {
        Value::Function(closure) => call_closure(&closure, arguments, span, ctx),
        Value::Action(template) => call_action(&template, arguments, span, ctx),
        Value::Builtin(Builtin::Target) => call_target(arguments, span, ctx),
        Value::Unknown => Value::Unknown,
        other => {
            ctx.reporter.report(ErrorReport::error(format!("cannot call {}", other.describe()), span.clone().into()));
            Value::Unknown
        }
    }
}

fn evaluate_arguments(arguments: &[CallArgument], ctx: &mut EvalContext) -> Vec<(Option<String>, Value)> {
    arguments.iter().map(|argument| (argument.name.clone(), evaluate(&argument.value, ctx))).collect()
}

/// Binds evaluated call arguments to a parameter list, either entirely by
/// position or entirely by name — mixing the two in one call is rejected.
/// A parameter missing from the call falls back to its own `default`
/// expression, evaluated in the caller's current scope; only a parameter
/// with no default and no argument is an error.
fn bind_parameters(parameters: &[Parameter], args: &[(Option<String>, Value)], span: &SpanInfo, ctx: &mut EvalContext) -> Option<Vec<(String, Value)>> {
    let all_named = args.iter().all(|(name, _)| name.is_some());
    let all_positional = args.iter().all(|(name, _)| name.is_none());

    if !all_named && !all_positional {
        ctx.reporter.report(ErrorReport::error("cannot mix positional and named arguments in one call", span.clone().into()));
        return None;
    }

    if all_positional {
        if args.len() > parameters.len() {
            ctx.reporter.report(ErrorReport::error(format!("expected at most {} argument(s), found {}", parameters.len(), args.len()), span.clone().into()));
            return None;
        }
        let mut bound = Vec::with_capacity(parameters.len());
        for (index, param) in parameters.iter().enumerate() {
            match args.get(index) {
                Some((_, value)) => bound.push((param.name.clone(), value.clone())),
                None => match default_value(param, span, ctx) {
                    Some(value) => bound.push((param.name.clone(), value)),
                    None => return None,
                },
            }
        }
        return Some(bound);
    }

    let mut bound = Vec::with_capacity(parameters.len());
    for param in parameters {
        match args.iter().find(|(name, _)| name.as_deref() == Some(param.name.as_str())) {
            Some((_, value)) => bound.push((param.name.clone(), value.clone())),
            None => match default_value(param, span, ctx) {
                Some(value) => bound.push((param.name.clone(), value)),
                None => return None,
            },
        }
    }
    Some(bound)
}

/// Evaluates `param`'s default expression, reporting a missing-argument
/// error at `span` if it has none.
fn default_value(param: &Parameter, span: &SpanInfo, ctx: &mut EvalContext) -> Option<Value> {
    match &param.default {
        Some(expr) => Some(evaluate(expr, ctx)),
        None => {
            ctx.reporter.report(ErrorReport::error(format!("missing argument '{}'", param.name), span.clone().into()));
            None
        }
    }
}

fn call_closure(closure: &Closure, arguments: &[CallArgument], span: &SpanInfo, ctx: &mut EvalContext) -> Value {
    let args = evaluate_arguments(arguments, ctx);
    let Some(bound) = bind_parameters(&closure.parameters, &args, span, ctx) else {
        return Value::Unknown;
    };

    let saved = std::mem::replace(&mut ctx.scopes, closure.captured.clone());
    ctx.push_scope();
    for (name, value) in bound {
        ctx.define(name, value);
    }
    let result = evaluate(&closure.body, ctx);
    ctx.scopes = saved;
    result
}

fn collect_files(value: Option<&Value>) -> Vec<Rc<FileNode>> {
    match value {
        Some(Value::File(file)) => vec![file.clone()],
        Some(Value::List(items)) => items.iter().filter_map(|item| match item { Value::File(file) => Some(file.clone()), _ => None }).collect(),
        _ => Vec::new(),
    }
}

/// Calling an action applies its parameters two ways at once: the `in`/`out`
/// parameters render as the literal `${in}`/`${out}` sentinels inside the
/// command text (left for a backend's `Formatter` to rewrite into its own
/// placeholder syntax), while every other parameter substitutes its real,
/// already-evaluated value — and separately supplies the concrete file list
/// the resulting `Build` records as its inputs/outputs.
fn call_action(template: &ActionTemplate, arguments: &[CallArgument], span: &SpanInfo, ctx: &mut EvalContext) -> Value {
    let args = evaluate_arguments(arguments, ctx);
    let Some(bound) = bind_parameters(&template.parameters, &args, span, ctx) else {
        return Value::Unknown;
    };

    let build_name = template.declared_name.clone().or_else(|| ctx.current_name().map(str::to_string)).unwrap_or_else(|| ctx.fresh_name("build"));

    let inputs = collect_files(bound.iter().find(|(name, _)| name == "in").map(|(_, value)| value));
    let outputs = collect_files(bound.iter().find(|(name, _)| name == "out").map(|(_, value)| value));

    if let Some(shared) = outputs.iter().find(|output| inputs.iter().any(|input| input.name == output.name)) {
        ctx.reporter.report(ErrorReport::error(format!("'{}' is bound as both an input and an output of this build", shared.name), span.clone().into()));
        return Value::Unknown;
    }

    let saved = std::mem::replace(&mut ctx.scopes, template.captured.clone());
    ctx.push_scope();
    for (name, value) in &bound {
        let rendered = match name.as_str() {
            "in" => Value::Str(Rc::new("${in}".to_string())),
            "out" => Value::Str(Rc::new("${out}".to_string())),
            _ => value.clone(),
        };
        ctx.define(name.clone(), rendered);
    }
    let command_value = evaluate(&template.body, ctx);
    ctx.scopes = saved;

    let Some(command) = command_value.as_str().map(str::to_string) else {
        ctx.reporter.report(ErrorReport::error(format!("action body must evaluate to a string command, found {}", command_value.describe()), span.clone().into()));
        return Value::Unknown;
    };

    let rule = ctx.builder.add_rule(Rule { name: format!("{build_name}_rule"), command });
    let arguments = bound.into_iter().collect::<IndexMap<_, _>>();
    let build = ctx.builder.add_build(Build { name: build_name, rule, inputs, outputs, extra_deps: Vec::new(), extra_outputs: Vec::new(), arguments });

    Value::Build(build)
}

fn call_target(arguments: &[CallArgument], span: &SpanInfo, ctx: &mut EvalContext) -> Value {
    let args = evaluate_arguments(arguments, ctx);

    let name = args
        .iter()
        .find(|(name, _)| name.as_deref() == Some("name"))
        .and_then(|(_, value)| value.as_str().map(str::to_string))
        .or_else(|| ctx.current_name().map(str::to_string));

    let Some(name) = name else {
        ctx.reporter.report(ErrorReport::error("target(...) requires a 'name' argument", span.clone().into()));
        return Value::Unknown;
    };

    let builds_arg = args.iter().find(|(name, _)| name.as_deref() == Some("builds")).map(|(_, value)| value.clone());
    let value = match builds_arg {
        Some(list @ Value::List(_)) | Some(list @ Value::Build(_)) => list,
        _ => {
            ctx.reporter.report(ErrorReport::error("target(...) requires a 'builds' argument", span.clone().into()));
            return Value::Unknown;
        }
    };

    Value::Target(ctx.builder.add_target(name, value))
}

/// Resolves and evaluates an imported module, caching the result by its
/// canonical path so repeated `import("...")` calls (and import cycles that
/// bottom out rather than loop) only evaluate a module once.
///
/// `arguments` must all be named; they are bundled into a record and
/// injected as the imported module's `args` binding, shadowing whatever
/// `args` the importing script itself received.
fn eval_import(path: &str, arguments: &[CallArgument], span: &SpanInfo, ctx: &mut EvalContext) -> Value {
    let subdir = ctx.subdir();
    let Some(resolved) = ctx.fs.find_module(&ctx.srcroot, &subdir, path) else {
        ctx.reporter.report(ErrorReport::error(format!("cannot find module '{path}'"), span.clone().into()));
        return Value::Unknown;
    };

    if let Some(cached) = ctx.imports.get(&resolved) {
        return cached.clone();
    }

    // Stand in for the module while it evaluates, so a cyclic import bottoms
    // out at an empty record instead of recursing forever.
    ctx.imports.insert(resolved.clone(), Value::Record(Rc::new(IndexMap::new())));

    let mut args_fields = IndexMap::new();
    for argument in arguments {
        let Some(name) = &argument.name else {
            ctx.reporter.report(ErrorReport::error("import(...) arguments must all be named", span.clone().into()));
            continue;
        };
        let value = evaluate(&argument.value, ctx);
        args_fields.insert(name.clone(), value);
    }

    let source = match ctx.fs.read_to_string(&resolved) {
        Ok(source) => source,
        Err(error) => {
            ctx.reporter.report(ErrorReport::error(format!("failed to read '{resolved}': {error}"), span.clone().into()));
            return Value::Unknown;
        }
    };

    let file = crate::file::SourceFile::new(resolved.split('/').map(str::to_string).collect(), source);
    let state = crate::nom_tools::State::new(file);

    let module_value = match crate::parser::parse(&state) {
        Ok((_, ast)) => {
            // A module is evaluated with a fresh scope chain rooted at the
            // importing script's builtins, not its local variables: only
            // `srcroot`/`buildroot`/`target` carry over, while `args` and
            // `subdir` are rebound to the imported module's own.
            let root = new_scope();
            root.borrow_mut().extend(ctx.scopes[0].borrow().iter().map(|(k, v)| (k.clone(), v.clone())));
            root.borrow_mut().insert("args".to_string(), Value::Record(Rc::new(args_fields)));
            let module_dir = ctx.fs.directory_of(&resolved);
            root.borrow_mut().insert("subdir".to_string(), Value::File(Rc::new(FileNode { name: module_dir, tag: FileTag::Untagged })));

            let saved_scopes = std::mem::replace(&mut ctx.scopes, vec![root]);
            let saved_names = std::mem::take(&mut ctx.current_name);
            let bound = evaluate_declarations(&ast.declarations, ctx);
            ctx.scopes = saved_scopes;
            ctx.current_name = saved_names;
            Value::Record(Rc::new(bound))
        }
        Err(error) => {
            for (span, kind) in error.errors.iter() {
                if let nom_language::error::VerboseErrorKind::Context(message) = kind {
                    use crate::nom_tools::ToRange;
                    ctx.reporter.report(ErrorReport::error(*message, SourceRange::new(span.to_range(), span.extra.file.clone())));
                }
            }
            Value::Unknown
        }
    };

    ctx.imports.insert(resolved, module_value.clone());
    module_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OsFilesystem;

    fn context() -> EvalContext<'static> {
        static FS: OsFilesystem = OsFilesystem;
        EvalContext::new(&FS, "/src".to_string(), IndexMap::new())
    }

    fn parse_and_eval(source: &str) -> (Value, EvalContext<'static>) {
        let file = crate::file::SourceFile::new(vec!["<memory>".into()], source.to_string());
        let state = crate::nom_tools::State::new(file);
        let (_, ast) = crate::parser::parse(&state).expect("should parse");
        let mut ctx = context();
        let bound = evaluate_file(&ast, &mut ctx);
        (bound.get("result").cloned().unwrap_or(Value::Nil), ctx)
    }

    #[test]
    fn evaluates_arithmetic() {
        let (value, ctx) = parse_and_eval("result = 1 + 2 * 1;");
        assert!(matches!(value, Value::Int(3)));
        assert!(!ctx.reporter.has_errors());
    }

    #[test]
    fn conditional_picks_branch() {
        let (value, ctx) = parse_and_eval("result = if true { 1 } else { 2 };");
        assert!(matches!(value, Value::Int(1)));
        assert!(!ctx.reporter.has_errors());
    }

    #[test]
    fn foreach_maps_over_list() {
        let (value, ctx) = parse_and_eval("result = foreach x <- [1 2 3] { x + 1 };");
        match value {
            Value::List(items) => {
                let rendered: Vec<_> = items.iter().map(Value::describe).collect();
                assert_eq!(rendered, vec!["2".to_string(), "3".to_string(), "4".to_string()]);
            }
            other => panic!("expected list, got {}", other.describe()),
        }
        assert!(!ctx.reporter.has_errors());
    }

    #[test]
    fn undefined_name_reports_error() {
        let (value, ctx) = parse_and_eval("result = missing;");
        assert!(matches!(value, Value::Unknown));
        assert!(ctx.reporter.has_errors());
    }

    #[test]
    fn action_call_registers_build_with_placeholders() {
        let (value, ctx) = parse_and_eval(
            "compile = action(in: file[in], out: file[out]) { \"cc -c \" + in + \" -o \" + out };\n\
             result = compile(in: file(\"a.c\"), out: file(\"a.o\"));",
        );
        match value {
            Value::Build(build) => {
                assert_eq!(build.rule.command, "cc -c ${in} -o ${out}");
                assert_eq!(build.inputs.len(), 1);
                assert_eq!(build.outputs.len(), 1);
            }
            other => panic!("expected build, got {}", other.describe()),
        }
        assert!(!ctx.reporter.has_errors());
    }

    #[test]
    fn action_call_rejects_shared_input_output() {
        let (value, ctx) = parse_and_eval(
            "compile = action(in: file[in], out: file[out]) { \"cc -c \" + in + \" -o \" + out };\n\
             result = compile(in: file(\"a.c\"), out: file(\"a.c\"));",
        );
        assert!(matches!(value, Value::Unknown));
        assert!(ctx.reporter.has_errors());
    }

    #[test]
    fn missing_argument_falls_back_to_default() {
        let (value, ctx) = parse_and_eval("make = function(count: int = 3) { count }; result = make();");
        assert!(matches!(value, Value::Int(3)));
        assert!(!ctx.reporter.has_errors());
    }
}
