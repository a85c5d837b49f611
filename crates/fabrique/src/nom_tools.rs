//! Parser-combinator plumbing shared by every grammar production: span
//! tracking, whitespace/comment cleanup, and the parser state threaded as
//! `nom_locate` extra data.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_until};
use nom::character::complete::{char, multispace0};
use nom::combinator::cut;
use nom::sequence::{preceded, terminated};
use nom::{Parser, sequence::delimited};
use nom_locate::LocatedSpan;
use std::fmt::Display;
use std::hash::Hash;
use std::ops::Range;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::file::SourceFile;
use crate::parser::FabriqueParserError;

/// Parser state carried alongside every span: the file being parsed and an
/// atomic counter used to mint unique synthetic names (for anonymous
/// actions and compound-expression temporaries).
#[derive(Debug, Clone)]
pub struct State {
    pub file: SourceFile,
    pub indexer: Arc<AtomicUsize>,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.file.hash(state);
    }
}

impl State {
    pub fn new(file: SourceFile) -> Self {
        Self { file, indexer: Arc::new(AtomicUsize::new(0)) }
    }

    /// Mints a fresh name unique within this parse, used for anonymous
    /// actions and list/foreach temporaries.
    pub fn next_synthetic_name(&self, prefix: &str) -> String {
        let index = self.indexer.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("${prefix}{index}")
    }
}

pub type NomSpan<'base, T = &'base str> = LocatedSpan<T, State>;

/// A resolved span: text plus its byte range plus the parser state,
/// produced by converting a [`NomSpan`] once parsing of a token completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span<'base> {
    pub text: &'base str,
    pub position: Range<usize>,
    pub state: State,
}

impl Display for Span<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text)
    }
}

impl<'base> From<NomSpan<'base>> for Span<'base> {
    fn from(value: NomSpan<'base>) -> Self {
        Span { text: value.fragment(), position: value.to_range(), state: value.extra.clone() }
    }
}

/// Span information without the borrowed source text, suitable for storage
/// beyond the parser's lifetime (e.g. inside `SourceRange`).
#[derive(Clone, Debug)]
pub struct SpanInfo {
    pub position: Range<usize>,
    pub file: SourceFile,
}

impl SpanInfo {
    pub fn new(position: Range<usize>, file: SourceFile) -> Self {
        Self { position, file }
    }
}

impl From<Span<'_>> for SpanInfo {
    fn from(span: Span<'_>) -> Self {
        SpanInfo::new(span.position.clone(), span.state.file.clone())
    }
}

impl From<&Span<'_>> for SpanInfo {
    fn from(span: &Span<'_>) -> Self {
        SpanInfo::new(span.position.clone(), span.state.file.clone())
    }
}

impl From<SpanInfo> for crate::diagnostics::SourceRange {
    fn from(info: SpanInfo) -> Self {
        crate::diagnostics::SourceRange::new(info.position, info.file)
    }
}

pub trait ToRange {
    fn to_range(&self) -> Range<usize>;
}

impl ToRange for NomSpan<'_> {
    fn to_range(&self) -> Range<usize> {
        let start = self.location_offset();
        let end = match nom::character::complete::alphanumeric1::<NomSpan, ()>(self.clone()) {
            Ok((_, data)) => start + data.fragment().len(),
            Err(_) => start + self.fragment().len(),
        };
        start..end
    }
}

impl ToRange for Span<'_> {
    fn to_range(&self) -> Range<usize> {
        self.position.clone()
    }
}

pub trait Between<T: PartialOrd> {
    fn between(&self, t: T) -> bool;
}

impl<T: PartialOrd> Between<T> for std::ops::Range<T> {
    fn between(&self, t: T) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Strips leading/trailing whitespace (but does not yet consume `/* ... */`
/// comments nested inside the wrapped token — comments are handled at the
/// statement level by [`crate::parser::skip_trivia`]).
pub fn cleanup<'base, O, F: Parser<NomSpan<'base>, Output = O, Error = FabriqueParserError<'base>>>(f: F) -> impl Parser<NomSpan<'base>, Output = O, Error = FabriqueParserError<'base>> {
    delimited(multispace0, f, multispace0)
}

/// Parses and discards a single `/* ... */` block comment.
pub fn block_comment(input: NomSpan<'_>) -> nom::IResult<NomSpan<'_>, NomSpan<'_>, FabriqueParserError<'_>> {
    preceded(char('/'), alt((preceded(char('*'), cut(terminated(take_until("*/"), tag("*/")))),))).parse(input)
}
