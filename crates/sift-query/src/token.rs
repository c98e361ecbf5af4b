//! Typed tokens consumed by the parser.
//!
//! The token set is deliberately tiny. The same [`TokenKind::Or`] kind is used both as a
//! boolean union and as the separator inside a field list (`@title|body:`); the parser
//! decides which from the grammar rule that is active, never from the token itself.

use std::fmt;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// `|`: union, or field-list separator after a modifier.
    Or,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `"`: opens or closes an exact phrase.
    Quote,
    /// A word.
    Term,
    /// `@`: starts a field modifier.
    At,
    /// `-`: negation prefix.
    Minus,
    /// `~`: optional prefix.
    Tilde,
    /// `*`: prefix-match suffix.
    Star,
    /// `:`: ends a field modifier.
    Colon,
}

impl TokenKind {
    /// Returns true if a token of this kind can begin an expression.
    pub fn starts_expr(self) -> bool {
        matches!(
            self,
            Self::LParen | Self::Term | Self::Minus | Self::Tilde | Self::At | Self::Quote
        )
    }

    /// Short human-readable name used in diagnostics and traces.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Eof => "end of query",
            Self::Or => "'|'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Quote => "'\"'",
            Self::Term => "term",
            Self::At => "'@'",
            Self::Minus => "'-'",
            Self::Tilde => "'~'",
            Self::Star => "'*'",
            Self::Colon => "':'",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token borrowed from the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The source text of the token. Empty for [`TokenKind::Eof`].
    pub text: &'a str,
    /// Byte offset of the token in the query.
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// Creates a token.
    pub fn new(kind: TokenKind, text: &'a str, offset: usize) -> Self {
        Self { kind, text, offset }
    }

    /// Creates the end-of-input sentinel at `offset`.
    pub fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            text: "",
            offset,
        }
    }

    /// Byte length of the token text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the token has no text (only the end-of-input sentinel).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset just past the end of the token.
    pub fn end(&self) -> usize {
        self.offset + self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_starters() {
        for kind in [
            TokenKind::LParen,
            TokenKind::Term,
            TokenKind::Minus,
            TokenKind::Tilde,
            TokenKind::At,
            TokenKind::Quote,
        ] {
            assert!(kind.starts_expr(), "{kind:?}");
        }
        for kind in [
            TokenKind::Eof,
            TokenKind::Or,
            TokenKind::RParen,
            TokenKind::Star,
            TokenKind::Colon,
        ] {
            assert!(!kind.starts_expr(), "{kind:?}");
        }
    }

    #[test]
    fn eof_is_empty() {
        let tok = Token::eof(7);
        assert_eq!(tok.kind, TokenKind::Eof);
        assert!(tok.is_empty());
        assert_eq!(tok.end(), 7);
    }

    #[test]
    fn length_and_end() {
        let tok = Token::new(TokenKind::Term, "hello", 3);
        assert_eq!(tok.len(), 5);
        assert_eq!(tok.end(), 8);
    }
}
