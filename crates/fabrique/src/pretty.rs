//! Pretty-printing the AST back to Fabrique source text. Every construct
//! prints the surface syntax its own parser production accepts, so
//! `pretty_print(parse(src))` reparses to a structurally equal tree —
//! binary operators are parenthesized by precedence since the grammar
//! itself carries no parenthesis nodes to echo back.

use std::io::{self, Write};

use crate::ast::{BinaryOperator, CallArgument, Expr, FileAst, FileTagExpr, Parameter, TypeExpr, UnaryOperator, ValueDeclaration};

const INDENT: &str = "    ";

fn write_indent(sink: &mut dyn Write, level: usize) -> io::Result<()> {
    for _ in 0..level {
        write!(sink, "{INDENT}")?;
    }
    Ok(())
}

/// Prints an entire parsed file as its top-level declarations, one per
/// line.
pub fn print_file(file: &FileAst, sink: &mut dyn Write) -> io::Result<()> {
    for declaration in &file.declarations {
        print_declaration(declaration, sink, 0)?;
    }
    Ok(())
}

/// Convenience wrapper around [`print_file`] for callers that just want the
/// text (tests, `debug(...)` diagnostics, a future `--pretty-print` CLI
/// flag).
pub fn pretty_print(file: &FileAst) -> String {
    let mut buffer = Vec::new();
    print_file(file, &mut buffer).expect("writing to an in-memory buffer never fails");
    String::from_utf8(buffer).expect("the pretty-printer only ever emits valid UTF-8")
}

fn print_declaration(declaration: &ValueDeclaration, sink: &mut dyn Write, level: usize) -> io::Result<()> {
    write_indent(sink, level)?;
    // `type Name = TypeExpr;` is a value declaration whose value is a
    // `TypeDeclaration` wrapper; print it as the sugar form rather than as
    // a value binding of a `Type`.
    if let Expr::TypeDeclaration { name, type_expr, .. } = declaration.value.as_ref() {
        write!(sink, "type {name} = ")?;
        print_type(type_expr, sink)?;
        return writeln!(sink, ";");
    }

    write!(sink, "{}", declaration.name)?;
    if let Some(type_expr) = &declaration.type_expr {
        write!(sink, ": ")?;
        print_type(type_expr, sink)?;
    }
    write!(sink, " = ")?;
    print_expr(&declaration.value, sink, level)?;
    writeln!(sink, ";")
}

fn print_type(type_expr: &TypeExpr, sink: &mut dyn Write) -> io::Result<()> {
    match type_expr {
        TypeExpr::Named(name) => write!(sink, "{name}"),
        TypeExpr::List(inner) => {
            write!(sink, "list[")?;
            print_type(inner, sink)?;
            write!(sink, "]")
        }
        TypeExpr::Maybe(inner) => {
            write!(sink, "maybe[")?;
            print_type(inner, sink)?;
            write!(sink, "]")
        }
        TypeExpr::File(tag) => {
            write!(sink, "file")?;
            print_file_tag(tag, sink)
        }
        TypeExpr::Record(fields) => {
            write!(sink, "record[")?;
            for (index, (name, ty)) in fields.iter().enumerate() {
                if index > 0 {
                    write!(sink, ", ")?;
                }
                write!(sink, "{name}: ")?;
                print_type(ty, sink)?;
            }
            write!(sink, "]")
        }
        TypeExpr::Function(parameters, result) => {
            write!(sink, "(")?;
            for (index, param) in parameters.iter().enumerate() {
                if index > 0 {
                    write!(sink, ", ")?;
                }
                print_type(param, sink)?;
            }
            write!(sink, ") => ")?;
            print_type(result, sink)
        }
    }
}

fn print_file_tag(tag: &Option<FileTagExpr>, sink: &mut dyn Write) -> io::Result<()> {
    match tag {
        Some(FileTagExpr::In) => write!(sink, "[in]"),
        Some(FileTagExpr::Out) => write!(sink, "[out]"),
        None => Ok(()),
    }
}

fn print_parameters(parameters: &[Parameter], sink: &mut dyn Write) -> io::Result<()> {
    for (index, parameter) in parameters.iter().enumerate() {
        if index > 0 {
            write!(sink, ", ")?;
        }
        write!(sink, "{}: ", parameter.name)?;
        print_type(&parameter.type_expr, sink)?;
        if let Some(default) = &parameter.default {
            write!(sink, " = ")?;
            print_expr(default, sink, 0)?;
        }
    }
    Ok(())
}

fn print_call_argument(argument: &CallArgument, sink: &mut dyn Write, level: usize) -> io::Result<()> {
    if let Some(name) = &argument.name {
        write!(sink, "{name}: ")?;
    }
    print_expr(&argument.value, sink, level)
}

fn print_call_arguments(arguments: &[CallArgument], sink: &mut dyn Write, level: usize) -> io::Result<()> {
    for (index, argument) in arguments.iter().enumerate() {
        if index > 0 {
            write!(sink, ", ")?;
        }
        print_call_argument(argument, sink, level)?;
    }
    Ok(())
}

fn print_string_literal(value: &str, sink: &mut dyn Write) -> io::Result<()> {
    write!(sink, "\"")?;
    for c in value.chars() {
        match c {
            '"' => write!(sink, "\\\"")?,
            '\\' => write!(sink, "\\\\")?,
            '\n' => write!(sink, "\\n")?,
            '\r' => write!(sink, "\\r")?,
            '\t' => write!(sink, "\\t")?,
            other => write!(sink, "{other}")?,
        }
    }
    write!(sink, "\"")
}

/// Precedence rank matching `parser::expression`'s `binary_level!` nesting
/// (1 loosest/`||`, 7 tightest/`*` `/`); used to decide when a child
/// `BinaryOp` needs parentheses to reprint into the same tree.
fn precedence(operator: BinaryOperator) -> u8 {
    use BinaryOperator::*;
    match operator {
        Or => 1,
        Xor => 2,
        And => 3,
        Equals | NotEquals => 4,
        LessThan | LessOrEqual | GreaterThan | GreaterOrEqual => 5,
        Add | Subtract | PrefixWith | ScalarAdd => 6,
        Multiply | Divide => 7,
    }
}

fn binary_op_token(operator: BinaryOperator) -> &'static str {
    use BinaryOperator::*;
    match operator {
        Add => "+",
        PrefixWith => "::",
        ScalarAdd => ".+",
        Subtract => "-",
        Multiply => "*",
        Divide => "/",
        Equals => "==",
        NotEquals => "!=",
        LessThan => "<",
        LessOrEqual => "<=",
        GreaterThan => ">",
        GreaterOrEqual => ">=",
        And => "&&",
        Or => "||",
        Xor => "^^",
    }
}

fn unary_op_token(operator: UnaryOperator) -> &'static str {
    match operator {
        UnaryOperator::Not => "!",
        UnaryOperator::Negate => "-",
    }
}

/// Prints a `BinaryOp` operand, parenthesizing it if its own precedence
/// would otherwise regroup differently once reparsed — looser than the
/// parent always needs parens, and a same-precedence operator needs them
/// on the right since the grammar only ever builds same-level chains
/// left-associatively.
fn print_binary_operand(expr: &Expr, sink: &mut dyn Write, level: usize, parent_precedence: u8, is_right: bool) -> io::Result<()> {
    if let Expr::BinaryOp { operator, .. } = expr {
        let child_precedence = precedence(*operator);
        if child_precedence < parent_precedence || (is_right && child_precedence == parent_precedence) {
            write!(sink, "(")?;
            print_expr(expr, sink, level)?;
            return write!(sink, ")");
        }
    }
    print_expr(expr, sink, level)
}

fn print_expr(expr: &Expr, sink: &mut dyn Write, level: usize) -> io::Result<()> {
    match expr {
        Expr::BoolLiteral { value, .. } => write!(sink, "{value}"),
        Expr::IntLiteral { value, .. } => write!(sink, "{value}"),
        Expr::StringLiteral { value, .. } => print_string_literal(value, sink),
        Expr::FilenameLiteral { value, .. } => write!(sink, "{value}"),

        Expr::List { items, .. } => {
            write!(sink, "[")?;
            for item in items.iter() {
                write!(sink, " ")?;
                print_expr(item, sink, level)?;
            }
            if !items.is_empty() {
                write!(sink, " ")?;
            }
            write!(sink, "]")
        }

        Expr::Record { entries, .. } => {
            writeln!(sink, "record {{")?;
            for entry in entries {
                write_indent(sink, level + 1)?;
                write!(sink, "{} = ", entry.name)?;
                print_expr(&entry.value, sink, level + 1)?;
                writeln!(sink, ";")?;
            }
            write_indent(sink, level)?;
            write!(sink, "}}")
        }

        Expr::Conditional { condition, then_branch, else_branch, .. } => {
            write!(sink, "if ")?;
            print_expr(condition, sink, level)?;
            writeln!(sink, " {{")?;
            write_indent(sink, level + 1)?;
            print_expr(then_branch, sink, level + 1)?;
            writeln!(sink)?;
            write_indent(sink, level)?;
            writeln!(sink, "}} else {{")?;
            write_indent(sink, level + 1)?;
            print_expr(else_branch, sink, level + 1)?;
            writeln!(sink)?;
            write_indent(sink, level)?;
            write!(sink, "}}")
        }

        Expr::CompoundExpression { declarations, result, .. } => {
            writeln!(sink, "{{")?;
            for declaration in declarations {
                print_declaration(declaration, sink, level + 1)?;
            }
            write_indent(sink, level + 1)?;
            print_expr(result, sink, level + 1)?;
            writeln!(sink)?;
            write_indent(sink, level)?;
            write!(sink, "}}")
        }

        Expr::Foreach { binding, source, body, .. } => {
            write!(sink, "foreach {binding} <- ")?;
            print_expr(source, sink, level)?;
            write!(sink, " {{ ")?;
            print_expr(body, sink, level)?;
            write!(sink, " }}")
        }

        Expr::Function { parameters, result_type, body, .. } => {
            write!(sink, "function(")?;
            print_parameters(parameters, sink)?;
            write!(sink, ")")?;
            if let Some(result_type) = result_type {
                write!(sink, ": ")?;
                print_type(result_type, sink)?;
            }
            write!(sink, " {{ ")?;
            print_expr(body, sink, level)?;
            write!(sink, " }}")
        }

        Expr::Call { callee, arguments, .. } => {
            print_expr(callee, sink, level)?;
            write!(sink, "(")?;
            print_call_arguments(arguments, sink, level)?;
            write!(sink, ")")
        }

        Expr::Action { parameters, command, .. } => {
            write!(sink, "action(")?;
            print_parameters(parameters, sink)?;
            write!(sink, ") {{ ")?;
            print_expr(command, sink, level)?;
            write!(sink, " }}")
        }

        Expr::File { path, tag, .. } => {
            write!(sink, "file")?;
            print_file_tag(tag, sink)?;
            write!(sink, "(")?;
            print_expr(path, sink, level)?;
            write!(sink, ")")
        }

        Expr::FileList { paths, tag, .. } => {
            write!(sink, "files")?;
            print_file_tag(tag, sink)?;
            write!(sink, "(")?;
            print_expr(paths, sink, level)?;
            write!(sink, ")")
        }

        Expr::NameReference { name, .. } => write!(sink, "{name}"),

        Expr::FieldAccess { base, field, .. } => {
            print_expr(base, sink, level)?;
            write!(sink, ".{field}")
        }

        Expr::FieldQuery { base, field, .. } => {
            print_expr(base, sink, level)?;
            write!(sink, "?.{field}")
        }

        Expr::UnaryOp { operator, operand, .. } => {
            write!(sink, "{}", unary_op_token(*operator))?;
            if matches!(operand.as_ref(), Expr::BinaryOp { .. }) {
                write!(sink, "(")?;
                print_expr(operand, sink, level)?;
                write!(sink, ")")
            } else {
                print_expr(operand, sink, level)
            }
        }

        Expr::BinaryOp { operator, left, right, .. } => {
            let parent_precedence = precedence(*operator);
            print_binary_operand(left, sink, level, parent_precedence, false)?;
            write!(sink, " {} ", binary_op_token(*operator))?;
            print_binary_operand(right, sink, level, parent_precedence, true)
        }

        Expr::Some { inner, .. } => {
            write!(sink, "some(")?;
            print_expr(inner, sink, level)?;
            write!(sink, ")")
        }

        Expr::Import { path, arguments, .. } => {
            write!(sink, "import(")?;
            print_string_literal(path, sink)?;
            for argument in arguments {
                write!(sink, ", ")?;
                print_call_argument(argument, sink, level)?;
            }
            write!(sink, ")")
        }

        Expr::TypeDeclaration { name, type_expr, .. } => {
            write!(sink, "type {name} = ")?;
            print_type(type_expr, sink)
        }

        Expr::DebugTracePoint { inner, .. } => {
            write!(sink, "debug(")?;
            print_expr(inner, sink, level)?;
            write!(sink, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SourceFile;
    use crate::nom_tools::State;

    fn parse(code: &str) -> FileAst {
        let state = State::new(SourceFile::new(vec!["<memory>".into()], code.to_string()));
        crate::parser::parse(&state).expect("should parse").1
    }

    #[test]
    fn prints_typed_declaration() {
        let printed = pretty_print(&parse("x: int = 1 + 2;"));
        assert_eq!(printed, "x: int = 1 + 2;\n");
    }

    #[test]
    fn round_trips_through_reparsing() {
        let source = "srcs = [ \"a.c\" \"b.c\" ];\nobjs = foreach s <- srcs { \"o/\" + s };\n";
        let first = pretty_print(&parse(source));
        let second = pretty_print(&parse(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn parenthesizes_looser_child_operator() {
        let printed = pretty_print(&parse("x = (1 + 2) * 3;"));
        assert_eq!(printed, "x = (1 + 2) * 3;\n");
        // Reparsing the printed text must reproduce the same grouping.
        let reprinted = pretty_print(&parse(&printed));
        assert_eq!(printed, reprinted);
    }
}
