//! Top-level and nested value declarations: `name = expr;` and
//! `name: Type = expr;`.

use std::rc::Rc;

use nom::character::complete::char;
use nom::combinator::{consumed, cut, opt};
use nom::sequence::preceded;
use nom::Parser;
use nom::IResult;

use crate::ast::{Expr, ValueDeclaration as ValueDeclarationAst};
use crate::nom_tools::{cleanup, NomSpan, Span};

use super::{expression, ident, keyword, type_expr, FabriqueParserError};

pub struct ValueDeclaration;

impl ValueDeclaration {
    pub fn parse(input: NomSpan<'_>) -> IResult<NomSpan<'_>, ValueDeclarationAst, FabriqueParserError<'_>> {
        nom::branch::alt((Self::parse_type_alias, Self::parse_value)).parse(input)
    }

    /// `type Name = TypeExpr;` — sugar for a value declaration whose value
    /// is a [`Expr::TypeDeclaration`]; evaluating it registers the name in
    /// the type namespace rather than the value namespace.
    fn parse_type_alias(input: NomSpan<'_>) -> IResult<NomSpan<'_>, ValueDeclarationAst, FabriqueParserError<'_>> {
        let (input, (full, (name, type_expr))) =
            consumed((preceded(keyword("type"), cut(ident())), preceded(cleanup(char('=')), cut(type_expr::parse)))).parse(input)?;
        let (input, _) = cleanup(char(';')).parse(input)?;

        let name = name.fragment().to_string();
        let span: crate::nom_tools::SpanInfo = Span::from(full).into();
        Ok((
            input,
            ValueDeclarationAst {
                name: name.clone(),
                type_expr: None,
                value: Rc::new(Expr::TypeDeclaration { name, type_expr: Rc::new(type_expr), span: span.clone() }),
                span,
            },
        ))
    }

    fn parse_value(input: NomSpan<'_>) -> IResult<NomSpan<'_>, ValueDeclarationAst, FabriqueParserError<'_>> {
        let (input, (full, (name, type_expr, value))) = consumed((
            ident(),
            opt(preceded(cleanup(char(':')), cut(type_expr::parse))),
            preceded(cleanup(char('=')), cut(expression::parse)),
        ))
        .parse(input)?;

        let (input, _) = cleanup(char(';')).parse(input)?;

        Ok((
            input,
            ValueDeclarationAst {
                name: name.fragment().to_string(),
                type_expr: type_expr.map(Rc::new),
                value: Rc::new(value),
                span: Span::from(full).into(),
            },
        ))
    }
}
