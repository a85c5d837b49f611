//! Literal parsing: booleans, integers, quoted strings, and bareword
//! filename literals.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, none_of, one_of};
use nom::combinator::{consumed, opt, recognize, value};
use nom::error::ParseError;
use nom::multi::{fold, many0, many1};
use nom::sequence::delimited;
use nom::{IResult, Parser};

use crate::ast::{Expr, PrimitiveValue};
use crate::nom_tools::{cleanup, NomSpan};

use super::FabriqueParserError;

fn escaped_char(input: NomSpan<'_>) -> IResult<NomSpan<'_>, char, FabriqueParserError<'_>> {
    let (input, c) = none_of("\"")(input)?;
    if c == '\\' {
        alt((value('\n', char('n')), value('\r', char('r')), value('\t', char('t')), value('\\', char('\\')), value('"', char('"')), value('/', char('/')))).parse(input)
    } else {
        Ok((input, c))
    }
}

pub fn string(input: NomSpan<'_>) -> IResult<NomSpan<'_>, PrimitiveValue, FabriqueParserError<'_>> {
    let (input, value) = delimited(
        char('"'),
        fold(0.., escaped_char, String::new, |mut acc, c| {
            acc.push(c);
            acc
        }),
        char('"'),
    )
    .parse(input)?;

    Ok((input, PrimitiveValue::Str(value)))
}

pub fn integer(input: NomSpan<'_>) -> IResult<NomSpan<'_>, PrimitiveValue, FabriqueParserError<'_>> {
    let (input, (sign, digits)) = (opt(one_of("+-")), recognize(many1(one_of("0123456789")))).parse(input)?;
    let magnitude: i64 = digits.fragment().parse().unwrap_or(0);
    let value = if sign == Some('-') { -magnitude } else { magnitude };
    Ok((input, PrimitiveValue::Int(value)))
}

/// A bareword filename token: must contain a `.` or `/` so it cannot be
/// confused with a plain identifier, per the lexer's tokenization rule.
pub fn filename(input: NomSpan<'_>) -> IResult<NomSpan<'_>, PrimitiveValue, FabriqueParserError<'_>> {
    let (input, text) = recognize(many1(alt((nom::character::complete::alphanumeric1, tag("."), tag("_"), tag("-"), tag("/"))))).parse(input)?;
    let fragment = *text.fragment();
    if !fragment.contains('.') && !fragment.contains('/') {
        return Err(nom::Err::Error(FabriqueParserError::from_error_kind(input, nom::error::ErrorKind::Tag)));
    }
    Ok((input, PrimitiveValue::Filename(fragment.to_string())))
}

pub fn parse(input: NomSpan<'_>) -> IResult<NomSpan<'_>, (NomSpan<'_>, PrimitiveValue), FabriqueParserError<'_>> {
    consumed(cleanup(alt((integer, string, value(PrimitiveValue::Bool(true), tag("true")), value(PrimitiveValue::Bool(false), tag("false")), filename)))).parse(input)
}

pub fn parse_for_expression(input: NomSpan<'_>) -> IResult<NomSpan<'_>, Expr, FabriqueParserError<'_>> {
    let (input, (span, value)) = parse(input)?;
    let span: crate::nom_tools::SpanInfo = crate::nom_tools::Span::from(span).into();
    let expr = match value {
        PrimitiveValue::Bool(value) => Expr::BoolLiteral { value, span },
        PrimitiveValue::Int(value) => Expr::IntLiteral { value, span },
        PrimitiveValue::Str(value) => Expr::StringLiteral { value, span },
        PrimitiveValue::Filename(value) => Expr::FilenameLiteral { value, span },
    };
    Ok((input, expr))
}

/// nom trait bound helper for constructing an `Error` verbose-error from an
/// error kind, used by `filename`'s manual backtrack.
trait FromErrorKind<'base> {
    fn from_error_kind(input: NomSpan<'base>, kind: nom::error::ErrorKind) -> Self;
}

impl<'base> FromErrorKind<'base> for FabriqueParserError<'base> {
    fn from_error_kind(input: NomSpan<'base>, kind: nom::error::ErrorKind) -> Self {
        <FabriqueParserError<'base> as nom::error::ParseError<NomSpan<'base>>>::from_error_kind(input, kind)
    }
}
