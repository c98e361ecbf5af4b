//! Shift/reduce automaton for the query grammar.
//!
//! # Grammar
//!
//! ```text
//! query        → exprlist | expr | ε
//! exprlist     → expr expr | exprlist expr
//! expr         → union
//!              | "(" expr ")" | "(" exprlist ")"
//!              | TERM | TERM "*"
//!              | "-" expr | "~" expr
//!              | modifierlist ":" expr | modifier ":" expr
//!              | exact "\""
//! modifier     → "@" TERM
//! modifierlist → modifier "|" TERM | modifierlist "|" TERM
//! exact        → "\"" TERM | exact TERM
//! union        → union "|" TERM | TERM "|" TERM
//! ```
//!
//! Precedence is purely structural: `-`, `~` and field modifiers apply to the single `expr`
//! that follows them, because no rule admits an `exprlist` in that position. Juxtaposed
//! expressions intersect, left to right.
//!
//! The parser state is read off the symbols on the stack rather than from generated tables.
//! For this grammar the LR state is determined by the top symbol and, for a handful of
//! symbols, the one or two beneath it. Reductions are only taken when the lookahead may
//! follow the reduced symbol, so an erroneous token is reported before it is ever shifted.

use std::fmt;

use tracing::trace;

use crate::{
    ast::QueryNode,
    error::{ParseError, ParseErrorKind},
    parser::ParseContext,
    token::{Token, TokenKind},
};

/// A field name captured by a modifier, kept until the scoped expression is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldName {
    /// Field name as written in the query.
    pub name: String,
    /// Byte offset of the name.
    pub offset: usize,
}

impl From<Token<'_>> for FieldName {
    fn from(token: Token<'_>) -> Self {
        Self {
            name: token.text.to_string(),
            offset: token.offset,
        }
    }
}

/// A grammar symbol on the parse stack.
#[derive(Debug)]
enum Symbol<'a> {
    /// A shifted terminal.
    Token(Token<'a>),
    /// `expr`
    Expr(QueryNode),
    /// `exprlist`: always a non-exact phrase.
    ExprList(QueryNode),
    /// `union`
    Union(QueryNode),
    /// `exact`: an exact phrase still waiting for its closing quote.
    Exact(QueryNode),
    /// `modifier`
    Modifier(FieldName),
    /// `modifierlist`
    ModifierList(Vec<FieldName>),
}

impl Symbol<'_> {
    /// The grammar symbol, without payload.
    fn sym(&self) -> Sym {
        match self {
            Self::Token(token) => Sym::Tok(token.kind),
            Self::Expr(_) => Sym::Expr,
            Self::ExprList(_) => Sym::ExprList,
            Self::Union(_) => Sym::Union,
            Self::Exact(_) => Sym::Exact,
            Self::Modifier(_) => Sym::Modifier,
            Self::ModifierList(_) => Sym::ModifierList,
        }
    }

    /// The query node carried by this symbol, if any.
    fn node(&self) -> Option<&QueryNode> {
        match self {
            Self::Expr(node) | Self::ExprList(node) | Self::Union(node) | Self::Exact(node) => {
                Some(node)
            }
            Self::Token(_) | Self::Modifier(_) | Self::ModifierList(_) => None,
        }
    }
}

/// Payload-free grammar symbol used to select actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sym {
    /// Terminal.
    Tok(TokenKind),
    /// `expr`
    Expr,
    /// `exprlist`
    ExprList,
    /// `union`
    Union,
    /// `exact`
    Exact,
    /// `modifier`
    Modifier,
    /// `modifierlist`
    ModifierList,
}

/// Grammar productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rule {
    /// `query ::= exprlist`
    QueryExprList,
    /// `query ::= expr`
    QueryExpr,
    /// `query ::=`
    QueryEmpty,
    /// `exprlist ::= expr expr`
    ExprListStart,
    /// `exprlist ::= exprlist expr`
    ExprListAppend,
    /// `expr ::= union`
    ExprUnion,
    /// `expr ::= ( expr )`
    GroupExpr,
    /// `expr ::= ( exprlist )`
    GroupExprList,
    /// `expr ::= TERM`
    ExprTerm,
    /// `expr ::= - expr`
    ExprNot,
    /// `expr ::= ~ expr`
    ExprOptional,
    /// `modifier ::= @ TERM`
    Modifier,
    /// `modifierlist ::= modifier | TERM`
    ModifierListStart,
    /// `modifierlist ::= modifierlist | TERM`
    ModifierListAppend,
    /// `expr ::= TERM *`
    ExprPrefix,
    /// `expr ::= modifierlist : expr`
    ExprFieldList,
    /// `expr ::= modifier : expr`
    ExprField,
    /// `exact ::= " TERM`
    ExactStart,
    /// `exact ::= exact TERM`
    ExactAppend,
    /// `expr ::= exact "`
    ExprExact,
    /// `union ::= union | TERM`
    UnionAppend,
    /// `union ::= TERM | TERM`
    UnionStart,
}

impl Rule {
    /// The production in grammar notation.
    pub(crate) fn production(self) -> &'static str {
        match self {
            Self::QueryExprList => "query ::= exprlist",
            Self::QueryExpr => "query ::= expr",
            Self::QueryEmpty => "query ::=",
            Self::ExprListStart => "exprlist ::= expr expr",
            Self::ExprListAppend => "exprlist ::= exprlist expr",
            Self::ExprUnion => "expr ::= union",
            Self::GroupExpr => "expr ::= '(' expr ')'",
            Self::GroupExprList => "expr ::= '(' exprlist ')'",
            Self::ExprTerm => "expr ::= TERM",
            Self::ExprNot => "expr ::= '-' expr",
            Self::ExprOptional => "expr ::= '~' expr",
            Self::Modifier => "modifier ::= '@' TERM",
            Self::ModifierListStart => "modifierlist ::= modifier '|' TERM",
            Self::ModifierListAppend => "modifierlist ::= modifierlist '|' TERM",
            Self::ExprPrefix => "expr ::= TERM '*'",
            Self::ExprFieldList => "expr ::= modifierlist ':' expr",
            Self::ExprField => "expr ::= modifier ':' expr",
            Self::ExactStart => "exact ::= '\"' TERM",
            Self::ExactAppend => "exact ::= exact TERM",
            Self::ExprExact => "expr ::= exact '\"'",
            Self::UnionAppend => "union ::= union '|' TERM",
            Self::UnionStart => "union ::= TERM '|' TERM",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.production())
    }
}

/// What to do with the lookahead token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Push the lookahead onto the stack.
    Shift,
    /// Replace the top of the stack by the left-hand side of a rule.
    Reduce(Rule),
    /// The lookahead cannot continue the parse.
    Error,
}

/// Outcome of a reduction.
#[derive(Debug)]
pub(crate) enum Reduced {
    /// Keep going with the same lookahead.
    Continue,
    /// The whole query was reduced.
    Accept(Option<QueryNode>),
}

/// Returns true if `la` may follow an `expr`.
fn follows_expr(la: TokenKind) -> bool {
    la == TokenKind::Eof || la == TokenKind::RParen || la.starts_expr()
}

/// Returns true if `la` may follow a `union`.
fn follows_union(la: TokenKind) -> bool {
    la == TokenKind::Or || follows_expr(la)
}

/// Returns true if `la` may follow a `modifier` or `modifierlist`.
fn follows_modifier(la: TokenKind) -> bool {
    matches!(la, TokenKind::Colon | TokenKind::Or)
}

/// Returns true if `la` may follow an `exact`.
fn follows_exact(la: TokenKind) -> bool {
    matches!(la, TokenKind::Quote | TokenKind::Term)
}

/// Reduces by `rule` if `ok`, otherwise reports an error.
fn reduce_if(ok: bool, rule: Rule) -> Action {
    if ok { Action::Reduce(rule) } else { Action::Error }
}

/// Shifts if `ok`, otherwise reports an error.
fn shift_if(ok: bool) -> Action {
    if ok { Action::Shift } else { Action::Error }
}

/// The parse stack and the grammar-driven transitions over it.
pub(crate) struct Automaton<'a> {
    /// Working stack of grammar symbols.
    stack: Vec<Symbol<'a>>,
    /// Maximum number of symbols the stack may hold.
    max_depth: usize,
}

impl<'a> Automaton<'a> {
    /// Creates an automaton whose stack holds at most `max_depth` symbols.
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
        }
    }

    /// Number of symbols on the stack.
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The symbol `n` entries below the top, if present.
    fn sym(&self, n: usize) -> Option<Sym> {
        self.stack.len().checked_sub(n + 1).map(|i| self.stack[i].sym())
    }

    /// Chooses the action for lookahead `la` in the current state.
    pub(crate) fn action(&self, la: TokenKind) -> Action {
        use TokenKind as T;

        let Some(top) = self.sym(0) else {
            return match la {
                T::Eof => Action::Reduce(Rule::QueryEmpty),
                _ => shift_if(la.starts_expr()),
            };
        };
        let below = self.sym(1);

        match top {
            Sym::Tok(T::Term) => match below {
                Some(Sym::Tok(T::At)) => reduce_if(follows_modifier(la), Rule::Modifier),
                Some(Sym::Tok(T::Quote)) => reduce_if(follows_exact(la), Rule::ExactStart),
                Some(Sym::Exact) => reduce_if(follows_exact(la), Rule::ExactAppend),
                Some(Sym::Tok(T::Or)) => match self.sym(2) {
                    Some(Sym::Union) => reduce_if(follows_union(la), Rule::UnionAppend),
                    Some(Sym::Tok(T::Term)) => reduce_if(follows_union(la), Rule::UnionStart),
                    Some(Sym::Modifier) => {
                        reduce_if(follows_modifier(la), Rule::ModifierListStart)
                    }
                    Some(Sym::ModifierList) => {
                        reduce_if(follows_modifier(la), Rule::ModifierListAppend)
                    }
                    _ => Action::Error,
                },
                _ => match la {
                    T::Star | T::Or => Action::Shift,
                    _ => reduce_if(follows_expr(la), Rule::ExprTerm),
                },
            },
            Sym::Tok(T::Star) => reduce_if(follows_expr(la), Rule::ExprPrefix),
            Sym::Tok(T::Quote) if below == Some(Sym::Exact) => {
                reduce_if(follows_expr(la), Rule::ExprExact)
            }
            Sym::Tok(T::Quote | T::At | T::Or) => shift_if(la == T::Term),
            Sym::Tok(T::LParen | T::Minus | T::Tilde | T::Colon) => shift_if(la.starts_expr()),
            Sym::Tok(T::RParen) => match below {
                Some(Sym::Expr) => reduce_if(follows_expr(la), Rule::GroupExpr),
                Some(Sym::ExprList) => reduce_if(follows_expr(la), Rule::GroupExprList),
                _ => Action::Error,
            },
            Sym::Tok(T::Eof) => Action::Error,
            Sym::Union => match la {
                T::Or => Action::Shift,
                _ => reduce_if(follows_expr(la), Rule::ExprUnion),
            },
            Sym::Modifier | Sym::ModifierList => shift_if(follows_modifier(la)),
            Sym::Exact => shift_if(follows_exact(la)),
            Sym::ExprList => match below {
                None if la == T::Eof => Action::Reduce(Rule::QueryExprList),
                None => shift_if(la.starts_expr()),
                Some(Sym::Tok(T::LParen)) => shift_if(la == T::RParen || la.starts_expr()),
                _ => Action::Error,
            },
            Sym::Expr => match below {
                None if la == T::Eof => Action::Reduce(Rule::QueryExpr),
                None => shift_if(la.starts_expr()),
                Some(Sym::Tok(T::LParen)) => shift_if(la == T::RParen || la.starts_expr()),
                Some(Sym::Tok(T::Minus)) => reduce_if(follows_expr(la), Rule::ExprNot),
                Some(Sym::Tok(T::Tilde)) => reduce_if(follows_expr(la), Rule::ExprOptional),
                Some(Sym::Tok(T::Colon)) => match self.sym(2) {
                    Some(Sym::Modifier) => reduce_if(follows_expr(la), Rule::ExprField),
                    Some(Sym::ModifierList) => reduce_if(follows_expr(la), Rule::ExprFieldList),
                    _ => Action::Error,
                },
                Some(Sym::Expr) => reduce_if(follows_expr(la), Rule::ExprListStart),
                Some(Sym::ExprList) => reduce_if(follows_expr(la), Rule::ExprListAppend),
                _ => Action::Error,
            },
        }
    }

    /// Pushes `token` onto the stack.
    pub(crate) fn shift(&mut self, token: Token<'a>) -> Result<(), ParseError> {
        if self.stack.len() >= self.max_depth {
            return Err(ParseError::new(
                ParseErrorKind::StackOverflow {
                    limit: self.max_depth,
                },
                token.offset,
                token.text,
            ));
        }
        self.stack.try_reserve(1).map_err(|_| out_of_memory(&token))?;
        trace!(token = %token.kind, offset = token.offset, depth = self.stack.len() + 1, "shift");
        self.stack.push(Symbol::Token(token));
        Ok(())
    }

    /// Reduces the top of the stack by `rule`, running its semantic action.
    ///
    /// `la` is the lookahead that triggered the reduction; it is only used for positions
    /// in diagnostics.
    pub(crate) fn reduce(
        &mut self,
        rule: Rule,
        la: &Token<'_>,
        ctx: &mut ParseContext<'_>,
    ) -> Result<Reduced, ParseError> {
        trace!(rule = rule.production(), depth = self.stack.len(), "reduce");

        let symbol = match rule {
            Rule::QueryExprList | Rule::QueryExpr => {
                return Ok(Reduced::Accept(Some(self.pop_node())));
            }
            Rule::QueryEmpty => return Ok(Reduced::Accept(None)),
            Rule::ExprListStart => {
                let right = self.pop_node();
                let left = self.pop_node();
                let mut list = QueryNode::phrase(false);
                append(&mut list, left, la)?;
                append(&mut list, right, la)?;
                Symbol::ExprList(list)
            }
            Rule::ExprListAppend => {
                let right = self.pop_node();
                let mut list = self.pop_node();
                append(&mut list, right, la)?;
                Symbol::ExprList(list)
            }
            Rule::ExprUnion => Symbol::Expr(self.pop_node()),
            Rule::GroupExpr | Rule::GroupExprList => {
                self.pop_token();
                let inner = self.pop_node();
                self.pop_token();
                Symbol::Expr(inner)
            }
            Rule::ExprTerm => Symbol::Expr(QueryNode::term(self.pop_token().text)),
            Rule::ExprNot => {
                let child = self.pop_node();
                self.pop_token();
                Symbol::Expr(QueryNode::not(child))
            }
            Rule::ExprOptional => {
                let child = self.pop_node();
                self.pop_token();
                Symbol::Expr(QueryNode::optional(child))
            }
            Rule::Modifier => {
                let name = self.pop_token();
                self.pop_token();
                Symbol::Modifier(FieldName::from(name))
            }
            Rule::ModifierListStart | Rule::ModifierListAppend => {
                let name = self.pop_token();
                self.pop_token();
                let mut names = self.pop_fields();
                names.try_reserve(1).map_err(|_| out_of_memory(la))?;
                names.push(FieldName::from(name));
                Symbol::ModifierList(names)
            }
            Rule::ExprPrefix => {
                self.pop_token();
                let term = self.pop_token();
                Symbol::Expr(QueryNode::prefix(term.text))
            }
            Rule::ExprField | Rule::ExprFieldList => {
                let mut expr = self.pop_node();
                self.pop_token();
                let fields = self.pop_fields();
                if let Some(mask) = ctx.resolve_fields(&fields) {
                    expr.set_field_mask(mask);
                }
                Symbol::Expr(expr)
            }
            Rule::ExactStart => {
                let term = self.pop_token();
                self.pop_token();
                let mut phrase = QueryNode::phrase(true);
                append(&mut phrase, QueryNode::term(term.text), la)?;
                Symbol::Exact(phrase)
            }
            Rule::ExactAppend => {
                let term = self.pop_token();
                let mut phrase = self.pop_node();
                append(&mut phrase, QueryNode::term(term.text), la)?;
                Symbol::Exact(phrase)
            }
            Rule::ExprExact => {
                self.pop_token();
                Symbol::Expr(self.pop_node())
            }
            Rule::UnionAppend => {
                let term = self.pop_token();
                self.pop_token();
                let mut union = self.pop_node();
                append(&mut union, QueryNode::term(term.text), la)?;
                Symbol::Union(union)
            }
            Rule::UnionStart => {
                let right = self.pop_token();
                self.pop_token();
                let left = self.pop_token();
                let mut union = QueryNode::union();
                append(&mut union, QueryNode::term(left.text), la)?;
                append(&mut union, QueryNode::term(right.text), la)?;
                Symbol::Union(union)
            }
        };

        // Every reduction that gets here popped at least one symbol, so this never grows
        // the stack.
        self.stack.push(symbol);
        Ok(Reduced::Continue)
    }

    /// Discards every symbol on the stack, releasing any partially built trees.
    ///
    /// Returns the number of query nodes released.
    pub(crate) fn release(&mut self) -> usize {
        let released = self
            .stack
            .iter()
            .filter_map(Symbol::node)
            .map(QueryNode::node_count)
            .sum();
        self.stack.clear();
        released
    }

    // `action()` selects a rule only when the symbols it pops sit on top of the stack, so the
    // pop helpers below never see another symbol or an empty stack.

    /// Pops a terminal.
    fn pop_token(&mut self) -> Token<'a> {
        match self.stack.pop() {
            Some(Symbol::Token(token)) => token,
            other => unreachable!("expected a terminal on the parse stack, found {other:?}"),
        }
    }

    /// Pops any node-carrying nonterminal.
    fn pop_node(&mut self) -> QueryNode {
        match self.stack.pop() {
            Some(Symbol::Expr(node))
            | Some(Symbol::ExprList(node))
            | Some(Symbol::Union(node))
            | Some(Symbol::Exact(node)) => node,
            other => unreachable!("expected a query node on the parse stack, found {other:?}"),
        }
    }

    /// Pops a `modifier` or `modifierlist` as a list of names.
    fn pop_fields(&mut self) -> Vec<FieldName> {
        match self.stack.pop() {
            Some(Symbol::Modifier(name)) => vec![name],
            Some(Symbol::ModifierList(names)) => names,
            other => unreachable!("expected a field modifier on the parse stack, found {other:?}"),
        }
    }
}

/// Appends `child` to `parent`, mapping failure to a parse error at `la`.
fn append(parent: &mut QueryNode, child: QueryNode, la: &Token<'_>) -> Result<(), ParseError> {
    parent.append_child(child).map_err(|_| out_of_memory(la))
}

/// Builds an allocation-failure error at `token`.
fn out_of_memory(token: &Token<'_>) -> ParseError {
    ParseError::new(ParseErrorKind::AllocationFailure, token.offset, token.text)
}
