//! Nom-based parser for Fabrique build scripts.
//!
//! A file is a flat sequence of top-level statements (`type` declarations
//! and value declarations); everything else — records, lists, actions,
//! conditionals, function literals — lives inside the single [`expression`]
//! grammar.

use nom::branch::alt;
use nom::character::complete::{alpha1, alphanumeric1, char};
use nom::combinator::{map, opt, recognize};
use nom::error::context;
use nom::multi::{many0, many0_count};
use nom::sequence::pair;
use nom::Err;
use nom::{IResult, Parser};
use nom_language::error::{VerboseError, VerboseErrorKind};

use crate::ast::FileAst;
use crate::nom_tools::{cleanup, NomSpan, State};

pub mod expression;
pub mod primitive;
pub mod type_expr;
pub mod value;

pub type FabriqueParserError<'base> = VerboseError<NomSpan<'base>>;

/// Parses an entire source file into top-level value declarations.
pub fn parse(state: &State) -> IResult<NomSpan<'_>, FileAst, FabriqueParserError<'_>> {
    let file = state.file.clone();
    let input = NomSpan::new_extra(state.file.code().as_str(), state.clone());

    let (remaining, declarations) = many0(cleanup(value::ValueDeclaration::parse)).parse(input)?;

    if !remaining.fragment().trim().is_empty() {
        return Err(Err::Failure(VerboseError { errors: vec![(remaining, VerboseErrorKind::Context("unknown syntax"))] }));
    }

    Ok((remaining, FileAst { file, declarations }))
}

/// A keyword reserved by the grammar; identifiers must not collide with
/// these to avoid ambiguity with e.g. `if`/`else`/`foreach`/`function`.
pub const KEYWORDS: &[&str] = &[
    "nil", "true", "false", "if", "else", "foreach", "in", "function", "action", "file", "files", "import", "some", "debug", "type", "list", "maybe", "string", "bool", "int",
];

pub fn ident<'base>() -> impl Parser<NomSpan<'base>, Output = NomSpan<'base>, Error = FabriqueParserError<'base>> {
    cleanup(recognize(pair(alt((alpha1, nom::bytes::complete::tag("_"))), many0_count(alt((alphanumeric1, nom::bytes::complete::tag("_")))))))
}

pub fn expected_ident<'base>(message: &'static str, input: NomSpan<'base>) -> IResult<NomSpan<'base>, NomSpan<'base>, FabriqueParserError<'base>> {
    context(message, nom::combinator::cut(ident())).parse(input)
}

pub fn keyword<'base>(word: &'static str) -> impl Parser<NomSpan<'base>, Output = NomSpan<'base>, Error = FabriqueParserError<'base>> {
    cleanup(nom::bytes::complete::tag(word))
}

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

/// `name?` optional-marker used on `maybe`-typed value declarations and in
/// `file`/`maybe` type syntax shorthand.
pub fn question_mark(input: NomSpan<'_>) -> IResult<NomSpan<'_>, bool, FabriqueParserError<'_>> {
    cleanup(map(opt(char('?')), |item| item.is_some())).parse(input)
}

#[cfg(test)]
mod tests {
    use crate::{file::SourceFile, nom_tools::State};

    use super::*;

    #[test]
    fn parses_empty_file() {
        let source = SourceFile::new(vec!["<memory>".into()], String::new());
        let state = State::new(source);
        let result = parse(&state);
        assert!(result.is_ok());
        assert!(result.unwrap().1.declarations.is_empty());
    }

    #[test]
    fn parses_single_declaration() {
        let source = SourceFile::new(vec!["<memory>".into()], "answer = 42;".to_string());
        let state = State::new(source);
        let (_, file) = parse(&state).expect("should parse");
        assert_eq!(file.declarations.len(), 1);
        assert_eq!(file.declarations[0].name, "answer");
    }
}
