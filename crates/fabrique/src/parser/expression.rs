//! Expression grammar with operator precedence, from `||` (loosest) down
//! through unary operators and postfix field access / calls (tightest).

use std::rc::Rc;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::char;
use nom::combinator::{consumed, cut, map, opt};
use nom::multi::{many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, separated_pair};
use nom::{IResult, Parser};

use crate::ast::{BinaryOperator, CallArgument, Expr, FileTagExpr, Parameter, RecordEntry, UnaryOperator};
use crate::nom_tools::{cleanup, NomSpan, Span, SpanInfo};

use super::{expected_ident, ident, is_keyword, keyword, primitive, type_expr, value::ValueDeclaration, FabriqueParserError};

fn span_of(span: NomSpan<'_>) -> SpanInfo {
    Span::from(span).into()
}

fn fail<'base, O>(input: NomSpan<'base>) -> IResult<NomSpan<'base>, O, FabriqueParserError<'base>> {
    Err(nom::Err::Error(<FabriqueParserError as nom::error::ParseError<NomSpan>>::from_error_kind(input, nom::error::ErrorKind::Tag)))
}

fn parenthesized(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    delimited(cleanup(char('(')), parse, cleanup(char(')'))).parse(input)
}

/// `[ expr expr ... ]` — lists are space-separated, not comma-separated.
fn list_literal(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, items)) = consumed(delimited(cleanup(char('[')), many0(parse), cleanup(char(']')))).parse(input)?;
    Ok((input, Expr::List { items: items.into_iter().map(Rc::new).collect(), span: span_of(full) }))
}

/// `record { name = expr; ... }`. The `record` keyword disambiguates from
/// [`compound_expression`], which also opens on `{`.
fn record_literal(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, declarations)) =
        consumed(preceded(keyword("record"), delimited(cleanup(char('{')), many0(cleanup(ValueDeclaration::parse)), cleanup(char('}'))))).parse(input)?;
    let entries = declarations
        .into_iter()
        .map(|decl| RecordEntry { name: decl.name, value: decl.value, span: decl.span })
        .collect();
    Ok((input, Expr::Record { entries, span: span_of(full) }))
}

fn compound_expression(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (declarations, result))) =
        consumed(delimited(cleanup(char('{')), (many0(cleanup(ValueDeclaration::parse)), cut(parse)), cleanup(char('}')))).parse(input)?;
    Ok((input, Expr::CompoundExpression { declarations, result: Rc::new(result), span: span_of(full) }))
}

fn conditional(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (condition, then_branch, _, else_branch))) = consumed((
        preceded(keyword("if"), cut(parse)),
        preceded(cleanup(char('{')), cut(parse)),
        (cleanup(char('}')), keyword("else"), cleanup(char('{'))),
        cut(parse),
    ))
    .parse(input)?;
    let (input, _) = cleanup(char('}')).parse(input)?;
    Ok((
        input,
        Expr::Conditional { condition: Rc::new(condition), then_branch: Rc::new(then_branch), else_branch: Rc::new(else_branch), span: span_of(full) },
    ))
}

fn foreach(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (binding, source, body))) = consumed((
        preceded(keyword("foreach"), cut(ident())),
        preceded(cleanup(tag("<-")), cut(parse)),
        delimited(cleanup(char('{')), cut(parse), cleanup(char('}'))),
    ))
    .parse(input)?;
    Ok((
        input,
        Expr::Foreach { binding: binding.fragment().to_string(), source: Rc::new(source), body: Rc::new(body), span: span_of(full) },
    ))
}

fn parameter(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Parameter, FabriqueParserError<'_>> {
    let (input, (full, ((name, ty), default))) = consumed((
        separated_pair(ident(), cleanup(char(':')), cut(type_expr::parse)),
        opt(preceded(cleanup(char('=')), cut(parse))),
    ))
    .parse(input)?;
    Ok((
        input,
        Parameter { name: name.fragment().to_string(), type_expr: Rc::new(ty), default: default.map(Rc::new), span: span_of(full) },
    ))
}

fn parameter_list(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Vec<Parameter>, FabriqueParserError<'_>> {
    delimited(cleanup(char('(')), separated_list0(cleanup(char(',')), parameter), cleanup(char(')'))).parse(input)
}

fn function_literal(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (parameters, result_type, body))) = consumed((
        preceded(keyword("function"), cut(parameter_list)),
        opt(preceded(cleanup(char(':')), type_expr::parse)),
        delimited(cleanup(char('{')), cut(parse), cleanup(char('}'))),
    ))
    .parse(input)?;
    Ok((
        input,
        Expr::Function { parameters, result_type: result_type.map(Rc::new), body: Rc::new(body), span: span_of(full) },
    ))
}

fn action_literal(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (parameters, command))) =
        consumed((preceded(keyword("action"), cut(parameter_list)), delimited(cleanup(char('{')), cut(parse), cleanup(char('}'))))).parse(input)?;
    Ok((input, Expr::Action { parameters, command: Rc::new(command), span: span_of(full) }))
}

fn file_tag_suffix(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Option<FileTagExpr>, FabriqueParserError<'_>> {
    opt(delimited(
        cleanup(char('[')),
        alt((map(keyword("in"), |_| FileTagExpr::In), map(keyword("out"), |_| FileTagExpr::Out))),
        cleanup(char(']')),
    ))
    .parse(input)
}

fn file_expr(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (tag, path))) = consumed((preceded(keyword("file"), file_tag_suffix), delimited(cleanup(char('(')), cut(parse), cleanup(char(')'))))).parse(input)?;
    Ok((input, Expr::File { path: Rc::new(path), tag, span: span_of(full) }))
}

fn files_expr(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (tag, paths))) = consumed((preceded(keyword("files"), file_tag_suffix), delimited(cleanup(char('(')), cut(parse), cleanup(char(')'))))).parse(input)?;
    Ok((input, Expr::FileList { paths: Rc::new(paths), tag, span: span_of(full) }))
}

fn import_expr(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (path, arguments))) = consumed(preceded(
        keyword("import"),
        delimited(
            cleanup(char('(')),
            cut(pair(primitive::string, many0(preceded(cleanup(char(',')), call_argument)))),
            cleanup(char(')')),
        ),
    ))
    .parse(input)?;
    let path = match path {
        crate::ast::PrimitiveValue::Str(path) => path,
        _ => unreachable!("string() only produces PrimitiveValue::Str"),
    };
    Ok((input, Expr::Import { path, arguments, span: span_of(full) }))
}

fn some_expr(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, inner)) = consumed(preceded(keyword("some"), delimited(cleanup(char('(')), cut(parse), cleanup(char(')'))))).parse(input)?;
    Ok((input, Expr::Some { inner: Rc::new(inner), span: span_of(full) }))
}

fn debug_expr(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, inner)) = consumed(preceded(keyword("debug"), delimited(cleanup(char('(')), cut(parse), cleanup(char(')'))))).parse(input)?;
    Ok((input, Expr::DebugTracePoint { inner: Rc::new(inner), span: span_of(full) }))
}

fn name_reference(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, name)) = consumed(ident()).parse(input)?;
    let text = name.fragment().to_string();
    if is_keyword(&text) {
        return fail(input);
    }
    Ok((input, Expr::NameReference { name: text, span: span_of(full) }))
}

fn primary(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    cleanup(alt((
        primitive::parse_for_expression,
        parenthesized,
        list_literal,
        record_literal,
        conditional,
        compound_expression,
        foreach,
        function_literal,
        action_literal,
        file_expr,
        files_expr,
        import_expr,
        some_expr,
        debug_expr,
        name_reference,
    )))
    .parse(input)
}

#[derive(Clone)]
enum Suffix {
    Field(String),
    FieldQuery(String),
    Call(Vec<CallArgument>),
}

fn call_argument(input: NomSpan<'_>) -> IResult<NomSpan<'_>, CallArgument, FabriqueParserError<'_>> {
    // A named argument is `ident ':' expr`, distinguished from a bare
    // positional expression by peeking for `ident ':'` not followed by a
    // second `:` (which would make it a nested record/type position).
    let named = opt(nom::combinator::peek(separated_pair(ident(), cleanup(char(':')), nom::combinator::success(())))).parse(input.clone());

    match named {
        Ok((_, Some(_))) => {
            let (input, (name, value)) = separated_pair(ident(), cleanup(char(':')), cut(parse)).parse(input)?;
            Ok((input, CallArgument { name: Some(name.fragment().to_string()), value: Rc::new(value) }))
        }
        _ => {
            let (input, value) = parse(input)?;
            Ok((input, CallArgument { name: None, value: Rc::new(value) }))
        }
    }
}

fn suffix(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Suffix, FabriqueParserError<'_>> {
    alt((
        map(preceded(cleanup(tag("?.")), |i| expected_ident("expected a field name", i)), |name| Suffix::FieldQuery(name.fragment().to_string())),
        // Not `cut`: `.+` is the scalar-add operator, not a field access, so a
        // failed identifier here must backtrack instead of hard-failing.
        map(preceded(cleanup(char('.')), ident()), |name| Suffix::Field(name.fragment().to_string())),
        map(delimited(cleanup(char('(')), separated_list0(cleanup(char(',')), call_argument), cleanup(char(')'))), Suffix::Call),
    ))
    .parse(input)
}

fn postfix(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (base, suffixes))) = consumed(pair(primary, many0(suffix))).parse(input)?;
    let mut expr = base;
    for s in suffixes {
        expr = match s {
            Suffix::Field(field) => Expr::FieldAccess { base: Rc::new(expr), field, span: span_of(full) },
            Suffix::FieldQuery(field) => Expr::FieldQuery { base: Rc::new(expr), field, span: span_of(full) },
            Suffix::Call(arguments) => Expr::Call { callee: Rc::new(expr), arguments, span: span_of(full) },
        };
    }
    Ok((input, expr))
}

fn unary(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (full, (op, operand))) = consumed(pair(
        opt(alt((map(char('!'), |_| UnaryOperator::Not), map(char('-'), |_| UnaryOperator::Negate)))),
        postfix,
    ))
    .parse(input)?;

    Ok((
        input,
        match op {
            Some(operator) => Expr::UnaryOp { operator, operand: Rc::new(operand), span: span_of(full) },
            None => operand,
        },
    ))
}

macro_rules! binary_level {
    ($name:ident, $next:expr, [$($token:expr => $op:expr),+ $(,)?]) => {
        fn $name(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
            let (input, (full, (first, rest))) = consumed(pair(
                $next,
                many0(pair(
                    cleanup(alt(($(map(tag($token), |_| $op)),+,))),
                    $next,
                )),
            ))
            .parse(input)?;

            let mut acc = first;
            for (operator, rhs) in rest {
                acc = Expr::BinaryOp { operator, left: Rc::new(acc), right: Rc::new(rhs), span: span_of(full) };
            }
            Ok((input, acc))
        }
    };
}

binary_level!(multiplicative, unary, ["*" => BinaryOperator::Multiply, "/" => BinaryOperator::Divide]);
binary_level!(additive, multiplicative, ["+" => BinaryOperator::Add, "-" => BinaryOperator::Subtract, "::" => BinaryOperator::PrefixWith, ".+" => BinaryOperator::ScalarAdd]);
binary_level!(relational, additive, ["<=" => BinaryOperator::LessOrEqual, ">=" => BinaryOperator::GreaterOrEqual, "<" => BinaryOperator::LessThan, ">" => BinaryOperator::GreaterThan]);
binary_level!(equality, relational, ["==" => BinaryOperator::Equals, "!=" => BinaryOperator::NotEquals]);
binary_level!(logical_and, equality, ["&&" => BinaryOperator::And]);
binary_level!(logical_xor, logical_and, ["^^" => BinaryOperator::Xor]);
binary_level!(logical_or, logical_xor, ["||" => BinaryOperator::Or]);

pub fn parse(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    cleanup(logical_or).parse(input)
}

#[cfg(test)]
mod tests {
    use crate::{file::SourceFile, nom_tools::State};

    use super::*;

    fn parse_str(code: &str) -> Expr {
        let state = State::new(SourceFile::new(vec!["<memory>".into()], code.to_string()));
        let input = NomSpan::new_extra(code, state);
        parse(input).expect("should parse").1
    }

    #[test]
    fn parses_binary_precedence() {
        let expr = parse_str("1 + 2 == 3");
        assert!(matches!(expr, Expr::BinaryOp { operator: BinaryOperator::Equals, .. }));
    }

    #[test]
    fn parses_field_access_chain() {
        let expr = parse_str("foo.bar.baz");
        assert!(matches!(expr, Expr::FieldAccess { .. }));
    }

    #[test]
    fn parses_call_with_named_args() {
        let expr = parse_str("make(name: \"x\", count: 3)");
        match expr {
            Expr::Call { arguments, .. } => {
                assert_eq!(arguments.len(), 2);
                assert_eq!(arguments[0].name.as_deref(), Some("name"));
            }
            _ => panic!("expected a call expression"),
        }
    }

    #[test]
    fn parses_file_expression_with_tag() {
        let expr = parse_str("file[in](\"a.c\")");
        assert!(matches!(expr, Expr::File { tag: Some(FileTagExpr::In), .. }));
    }

    #[test]
    fn parses_record_literal() {
        let expr = parse_str("record { x = 1; y = 2; }");
        match expr {
            Expr::Record { entries, .. } => assert_eq!(entries.len(), 2),
            _ => panic!("expected a record literal"),
        }
    }

    #[test]
    fn parses_space_separated_list() {
        let expr = parse_str("[ \"a.c\" \"b.c\" ]");
        match expr {
            Expr::List { items, .. } => assert_eq!(items.len(), 2),
            _ => panic!("expected a list literal"),
        }
    }

    #[test]
    fn parses_prefix_with_operator() {
        let expr = parse_str("\"a\" :: srcs");
        assert!(matches!(expr, Expr::BinaryOp { operator: BinaryOperator::PrefixWith, .. }));
    }
}
