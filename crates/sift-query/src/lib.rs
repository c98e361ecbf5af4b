//! Query grammar, parser and AST for sift search.
//!
//! This crate turns a search query into a tree for the query executor:
//!
//! - **Terms**: `rust` - words that must appear
//! - **Intersection**: `rust async` - juxtaposed expressions must all match
//! - **Phrases**: `"error handling"` - exact sequences
//! - **Negation**: `-deprecated` - expressions that must NOT match
//! - **Optional**: `~tokio` - expressions that may match
//! - **Union**: `rust|golang` - alternatives
//! - **Prefix**: `async*` - every term starting with `async`
//! - **Grouping**: `(a b) c` - precedence control
//! - **Fields**: `@title|body:guide` - restrict an expression to named fields
//!
//! Parsing is driven one token at a time by a bounded shift/reduce automaton. Field names
//! are resolved against a [`FieldResolver`] such as [`Schema`].
//!
//! # Example
//!
//! ```
//! use sift_query::{ParserOptions, Schema, parse_with};
//!
//! let schema = Schema::from_fields(["title", "body"]).unwrap();
//! let query = parse_with(
//!     "@title:guide rust|golang -deprecated",
//!     Some(&schema),
//!     ParserOptions::default(),
//! )
//! .unwrap();
//! assert!(query.is_some());
//! ```

#![warn(missing_docs)]

mod ast;
mod automaton;
mod error;
mod lexer;
mod parser;
mod schema;
mod token;

pub use ast::{AstError, FieldMask, NodeKind, QueryNode};
pub use error::{ParseError, ParseErrorKind, QueryError, SNIPPET_LIMIT};
pub use lexer::{Lexer, tokenize};
pub use parser::{
    DEFAULT_MAX_DEPTH, DriverState, ParseResult, Parser, ParserOptions, UnknownFieldPolicy, parse,
    parse_tokens, parse_with,
};
pub use schema::{FieldResolver, Schema, SchemaError};
pub use token::{Token, TokenKind};
