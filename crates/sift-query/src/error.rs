//! Error types for query parsing.
//!
//! A failed parse produces exactly one [`ParseError`]: the first problem encountered. Every
//! error records the byte offset of the offending token and a short snippet of its text.

use std::fmt;

use thiserror::Error;

/// Maximum number of characters of source text quoted in a diagnostic.
pub const SNIPPET_LIMIT: usize = 32;

/// The kind of parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// No grammar rule accepts the token.
    #[error("syntax error")]
    Syntax,
    /// The parse stack grew past its configured bound.
    #[error("query is nested too deeply (limit {limit})")]
    StackOverflow {
        /// Configured stack bound.
        limit: usize,
    },
    /// Memory could not be reserved while building the tree.
    #[error("out of memory while building query")]
    AllocationFailure,
    /// A field modifier names a field the schema does not define. Only raised when
    /// unknown fields are rejected.
    #[error("unknown field '{name}'")]
    UnknownField {
        /// The field name as written.
        name: String,
    },
}

/// A parse failure with position information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}{}", near_suffix(.near))]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Byte offset of the offending token.
    pub offset: usize,
    /// Bounded snippet of the offending token's text; empty at end of input.
    pub near: String,
}

impl ParseError {
    /// Creates an error, truncating `near` to [`SNIPPET_LIMIT`] characters.
    pub fn new(kind: ParseErrorKind, offset: usize, near: &str) -> Self {
        Self {
            kind,
            offset,
            near: snippet(near),
        }
    }

    /// Returns true for errors raised at the end-of-input token.
    pub fn at_end(&self) -> bool {
        self.near.is_empty()
    }
}

/// Formats the trailing part of a diagnostic.
fn near_suffix(near: &str) -> String {
    if near.is_empty() {
        String::from(" (end of query)")
    } else {
        format!(" near '{near}'")
    }
}

/// Truncates `text` to at most [`SNIPPET_LIMIT`] characters.
fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// A parse error together with the query it came from.
///
/// Displays the query with a position indicator under the offending token and, for common
/// mistakes, a hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// The underlying parse error.
    pub error: ParseError,
    /// The original query string (if available).
    pub query: Option<String>,
}

impl QueryError {
    /// Wraps a parse error without query context.
    pub fn new(error: ParseError) -> Self {
        Self { error, query: None }
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// The error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.error.kind
    }

    /// Returns the single-line diagnostic without context.
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match &self.error.kind {
            ParseErrorKind::Syntax if self.error.at_end() => {
                Some("The query ended early; check for an unclosed quote or parenthesis")
            }
            ParseErrorKind::Syntax if self.error.near == ":" => {
                Some("A ':' must follow a field modifier, e.g. '@title:hello'")
            }
            ParseErrorKind::Syntax if self.error.near == "|" => {
                Some("'|' joins two terms, e.g. 'hello|world', or two fields, e.g. '@title|body:'")
            }
            ParseErrorKind::StackOverflow { .. } => {
                Some("Reduce the nesting of parentheses and prefix operators")
            }
            ParseErrorKind::UnknownField { .. } => {
                Some("Field names must match a field defined in the schema")
            }
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query error: {}", self.error)?;

        if let Some(query) = &self.query {
            let clamped = self.error.offset.min(query.len());
            let column = query
                .get(..clamped)
                .map_or(clamped, |prefix| prefix.chars().count());
            writeln!(f, "  {query}")?;
            writeln!(f, "  {}^", " ".repeat(column))?;
        }

        if let Some(suggestion) = self.suggestion() {
            write!(f, "hint: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ParseError> for QueryError {
    fn from(error: ParseError) -> Self {
        Self::new(error)
    }
}
