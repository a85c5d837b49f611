//! Parser for type expressions: `int`, `list[T]`, `maybe[T]`, `file[in]`,
//! record shapes, and function types.

use std::rc::Rc;

use nom::branch::alt;
use nom::character::complete::char;
use nom::combinator::{cut, map, opt};
use nom::multi::separated_list0;
use nom::sequence::{delimited, preceded, separated_pair};
use nom::{IResult, Parser};

use crate::ast::{FileTagExpr, TypeExpr};
use crate::nom_tools::{cleanup, NomSpan};

use super::{expected_ident, ident, keyword, FabriqueParserError};

fn file_tag(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Option<FileTagExpr>, FabriqueParserError<'_>> {
    opt(delimited(
        cleanup(char('[')),
        alt((map(keyword("in"), |_| FileTagExpr::In), map(keyword("out"), |_| FileTagExpr::Out))),
        cleanup(char(']')),
    ))
    .parse(input)
}

fn list_type(input: NomSpan<'_>) -> IResult<NomSpan<'_>, TypeExpr, FabriqueParserError<'_>> {
    let (input, inner) = preceded(keyword("list"), delimited(cleanup(char('[')), cut(parse), cleanup(char(']')))).parse(input)?;
    Ok((input, TypeExpr::List(Rc::new(inner))))
}

fn maybe_type(input: NomSpan<'_>) -> IResult<NomSpan<'_>, TypeExpr, FabriqueParserError<'_>> {
    let (input, inner) = preceded(keyword("maybe"), delimited(cleanup(char('[')), cut(parse), cleanup(char(']')))).parse(input)?;
    Ok((input, TypeExpr::Maybe(Rc::new(inner))))
}

fn file_type(input: NomSpan<'_>) -> IResult<NomSpan<'_>, TypeExpr, FabriqueParserError<'_>> {
    let (input, tag) = preceded(keyword("file"), file_tag).parse(input)?;
    Ok((input, TypeExpr::File(tag)))
}

fn record_type(input: NomSpan<'_>) -> IResult<NomSpan<'_>, TypeExpr, FabriqueParserError<'_>> {
    let field = |input| -> IResult<NomSpan<'_>, (String, Rc<TypeExpr>), FabriqueParserError<'_>> {
        let (input, (name, ty)) = separated_pair(ident(), cleanup(char(':')), cut(parse)).parse(input)?;
        Ok((input, (name.fragment().to_string(), Rc::new(ty))))
    };

    let (input, fields) =
        preceded(keyword("record"), delimited(cleanup(char('[')), separated_list0(cleanup(char(',')), field), cleanup(char(']')))).parse(input)?;
    Ok((input, TypeExpr::Record(fields)))
}

/// `(type, type, ...) => type`. No leading keyword; unambiguous because
/// nothing else in the grammar opens a type with `(`.
fn function_type(input: NomSpan<'_>) -> IResult<NomSpan<'_>, TypeExpr, FabriqueParserError<'_>> {
    let (input, params) = delimited(cleanup(char('(')), separated_list0(cleanup(char(',')), parse), cleanup(char(')'))).parse(input)?;
    let (input, result) = preceded(cleanup(nom::bytes::complete::tag("=>")), cut(parse)).parse(input)?;
    Ok((input, TypeExpr::Function(params.into_iter().map(Rc::new).collect(), Rc::new(result))))
}

fn named_type(input: NomSpan<'_>) -> IResult<NomSpan<'_>, TypeExpr, FabriqueParserError<'_>> {
    let (input, name) = expected_ident("expected a type", input)?;
    Ok((input, TypeExpr::Named(name.fragment().to_string())))
}

pub fn parse(input: NomSpan<'_>) -> IResult<NomSpan<'_>, TypeExpr, FabriqueParserError<'_>> {
    cleanup(alt((list_type, maybe_type, file_type, record_type, function_type, named_type))).parse(input)
}
