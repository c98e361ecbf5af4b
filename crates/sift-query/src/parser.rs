//! Query parser driver.
//!
//! A [`Parser`] is fed one token at a time and drives the shift/reduce automaton. Errors
//! never surface from [`Parser::feed`]; they are collected and reported once by
//! [`Parser::finish`].
//!
//! # Lifecycle
//!
//! ```text
//! Empty ──feed──▶ Running ──end of input──▶ Accepted
//!                    │
//!                    └──fatal error / error at end of input──▶ Failed
//! ```
//!
//! A syntax error on any token other than end of input discards that token and keeps
//! going, but the parse is already doomed: only the first diagnostic is kept and the result
//! is reported as failed with no tree.

use tracing::{debug, trace};

use crate::{
    ast::{FieldMask, QueryNode},
    automaton::{Action, Automaton, FieldName, Reduced},
    error::{ParseError, ParseErrorKind, QueryError},
    lexer::Lexer,
    schema::FieldResolver,
    token::{Token, TokenKind},
};

/// Default bound on the parse stack.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// What to do when a field modifier names a field the schema does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// The field contributes no bit to the mask. A query scoped only to unknown fields
    /// therefore matches nothing.
    #[default]
    Ignore,
    /// The parse fails with an [`ParseErrorKind::UnknownField`] diagnostic.
    Reject,
}

/// Parser tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum number of symbols on the parse stack; bounds query nesting.
    pub max_depth: usize,
    /// Handling of unknown field names.
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            unknown_fields: UnknownFieldPolicy::Ignore,
        }
    }
}

/// Where a parser is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No token has been fed yet.
    Empty,
    /// Tokens are being consumed.
    Running,
    /// End of input was reached with a well-formed query.
    Accepted,
    /// The parse failed; no tree will be produced.
    Failed,
}

impl DriverState {
    /// Returns true for `Accepted` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Failed)
    }
}

/// Per-parse state shared with the semantic actions.
pub(crate) struct ParseContext<'s> {
    /// The finished tree, once accepted.
    root: Option<QueryNode>,
    /// False once any error has been recorded.
    ok: bool,
    /// The first error recorded.
    error: Option<ParseError>,
    /// Field resolver, if the query runs against a schema.
    schema: Option<&'s dyn FieldResolver>,
    /// Parser tuning.
    options: ParserOptions,
}

impl<'s> ParseContext<'s> {
    /// Creates an empty context.
    pub(crate) fn new(schema: Option<&'s dyn FieldResolver>, options: ParserOptions) -> Self {
        Self {
            root: None,
            ok: true,
            error: None,
            schema,
            options,
        }
    }

    /// Records `error` unless an earlier error was already recorded.
    fn record(&mut self, error: ParseError) {
        self.ok = false;
        if self.error.is_none() {
            debug!(%error, "query parse error");
            self.error = Some(error);
        } else {
            trace!(%error, "suppressed follow-on parse error");
        }
    }

    /// Computes the field mask for a list of modifier names.
    ///
    /// Returns `None` when there is no schema, leaving the default mask in place. Unknown
    /// names contribute no bit, or are recorded as errors under
    /// [`UnknownFieldPolicy::Reject`]. The names are consumed either way.
    pub(crate) fn resolve_fields(&mut self, fields: &[FieldName]) -> Option<FieldMask> {
        let schema = self.schema?;
        let mut mask = FieldMask::NONE;
        for field in fields {
            match schema.resolve(&field.name) {
                Some(bit) => mask = mask.with_bit(bit),
                None => {
                    debug!(field = %field.name, offset = field.offset, "unknown field");
                    if self.options.unknown_fields == UnknownFieldPolicy::Reject {
                        self.record(ParseError::new(
                            ParseErrorKind::UnknownField {
                                name: field.name.clone(),
                            },
                            field.offset,
                            &field.name,
                        ));
                    }
                }
            }
        }
        Some(mask)
    }
}

/// The outcome of a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// The query tree. `None` for an empty query and for every failed parse.
    pub root: Option<QueryNode>,
    /// True if the query parsed without error.
    pub ok: bool,
    /// The diagnostic for a failed parse.
    pub error_message: Option<String>,
    /// The structured error for a failed parse.
    pub error: Option<ParseError>,
}

impl ParseResult {
    /// Converts into a `Result`, `Ok(None)` meaning an empty query.
    pub fn into_result(self) -> Result<Option<QueryNode>, ParseError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.root),
        }
    }
}

/// Incremental query parser.
///
/// One parser handles exactly one query. Create it, [`feed`](Self::feed) it tokens in
/// order, then [`finish`](Self::finish) it.
pub struct Parser<'a, 's> {
    /// The shift/reduce engine.
    automaton: Automaton<'a>,
    /// Root, error state and schema.
    ctx: ParseContext<'s>,
    /// Lifecycle state.
    state: DriverState,
    /// Offset just past the last token fed, where end of input is placed.
    end: usize,
}

impl<'a, 's> Parser<'a, 's> {
    /// Creates a parser with default options.
    pub fn new(schema: Option<&'s dyn FieldResolver>) -> Self {
        Self::with_options(schema, ParserOptions::default())
    }

    /// Creates a parser with the given options.
    pub fn with_options(schema: Option<&'s dyn FieldResolver>, options: ParserOptions) -> Self {
        Self {
            automaton: Automaton::new(options.max_depth),
            ctx: ParseContext::new(schema, options),
            state: DriverState::Empty,
            end: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Returns false once any error has been seen.
    pub fn is_ok(&self) -> bool {
        self.ctx.ok
    }

    /// Consumes one token, running every reduction it triggers.
    ///
    /// Tokens fed after the parser reached a terminal state are ignored.
    pub fn feed(&mut self, token: Token<'a>) {
        match self.state {
            DriverState::Accepted | DriverState::Failed => {
                trace!(token = %token.kind, "token after end of parse ignored");
                return;
            }
            DriverState::Empty => self.state = DriverState::Running,
            DriverState::Running => {}
        }
        self.end = self.end.max(token.end());

        loop {
            match self.automaton.action(token.kind) {
                Action::Shift => {
                    if let Err(error) = self.automaton.shift(token) {
                        self.fail(Some(error));
                    }
                    return;
                }
                Action::Reduce(rule) => match self.automaton.reduce(rule, &token, &mut self.ctx) {
                    Ok(Reduced::Continue) => {}
                    Ok(Reduced::Accept(root)) => {
                        self.accept(root);
                        return;
                    }
                    Err(error) => {
                        self.fail(Some(error));
                        return;
                    }
                },
                Action::Error => {
                    trace!(token = %token.kind, offset = token.offset, "syntax error, token discarded");
                    self.ctx.record(ParseError::new(
                        ParseErrorKind::Syntax,
                        token.offset,
                        token.text,
                    ));
                    if token.kind == TokenKind::Eof {
                        self.fail(None);
                    }
                    return;
                }
            }
        }
    }

    /// Finishes the parse, feeding end of input if it has not been fed yet.
    pub fn finish(mut self) -> ParseResult {
        if !self.state.is_terminal() {
            self.feed(Token::eof(self.end));
        }

        let error = self.ctx.error.take();
        ParseResult {
            root: self.ctx.root.take(),
            ok: self.ctx.ok,
            error_message: error.as_ref().map(ToString::to_string),
            error,
        }
    }

    /// Completes an accepted parse. A parse that recorded an error earlier still fails.
    fn accept(&mut self, root: Option<QueryNode>) {
        if self.ctx.ok {
            debug!(nodes = root.as_ref().map_or(0, QueryNode::node_count), "query accepted");
            self.ctx.root = root;
            self.state = DriverState::Accepted;
        } else {
            let released = root.as_ref().map_or(0, QueryNode::node_count);
            drop(root);
            debug!(released, "query reduced after an error; tree discarded");
            self.state = DriverState::Failed;
        }
    }

    /// Moves to `Failed`, releasing everything left on the stack.
    fn fail(&mut self, error: Option<ParseError>) {
        if let Some(error) = error {
            self.ctx.record(error);
        }
        let depth = self.automaton.depth();
        let released = self.automaton.release();
        self.ctx.root = None;
        debug!(depth, released, "query parse failed");
        self.state = DriverState::Failed;
    }
}

/// Feeds `tokens` into a new parser and finishes it.
pub fn parse_tokens<'a, I>(
    tokens: I,
    schema: Option<&dyn FieldResolver>,
    options: ParserOptions,
) -> ParseResult
where
    I: IntoIterator<Item = Token<'a>>,
{
    let mut parser = Parser::with_options(schema, options);
    for token in tokens {
        parser.feed(token);
    }
    parser.finish()
}

/// Parses a query string with no schema and default options.
///
/// Returns `Ok(None)` for empty queries, `Ok(Some(node))` for valid queries,
/// or `Err(QueryError)` for invalid syntax.
pub fn parse(input: &str) -> Result<Option<QueryNode>, QueryError> {
    parse_with(input, None, ParserOptions::default())
}

/// Parses a query string against an optional schema.
pub fn parse_with(
    input: &str,
    schema: Option<&dyn FieldResolver>,
    options: ParserOptions,
) -> Result<Option<QueryNode>, QueryError> {
    let tokens = Lexer::new(input).chain([Token::eof(input.len())]);
    parse_tokens(tokens, schema, options)
        .into_result()
        .map_err(|error| QueryError::new(error).with_query(input))
}
