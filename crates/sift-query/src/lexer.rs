//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of typed tokens for the parser. The lexer never
//! fails: characters that carry no meaning in the query language separate terms and are
//! otherwise dropped.

use std::{iter::Peekable, str::CharIndices};

use crate::token::{Token, TokenKind};

/// Tokenizes a query string lazily.
///
/// Yields tokens in input order and never rewinds. The end-of-input token is not yielded;
/// the parser synthesises it when it is finished.
pub struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<CharIndices<'a>>,
    /// End offset of the most recent term, used to attach a `*` suffix.
    term_end: Option<usize>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            term_end: None,
        }
    }

    /// Byte offset one past the end of the input.
    pub fn end_offset(&self) -> usize {
        self.input.len()
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            let (pos, ch) = *self.chars.peek()?;

            if is_term_char(ch) {
                return Some(self.read_term(pos));
            }

            self.chars.next();
            let kind = match ch {
                '|' => TokenKind::Or,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '"' => TokenKind::Quote,
                '@' => TokenKind::At,
                '-' => TokenKind::Minus,
                '~' => TokenKind::Tilde,
                ':' => TokenKind::Colon,
                // Only a star glued to the preceding term is a prefix marker.
                '*' if self.term_end == Some(pos) => TokenKind::Star,
                _ => {
                    self.term_end = None;
                    continue;
                }
            };

            self.term_end = None;
            return Some(Token::new(kind, &self.input[pos..pos + ch.len_utf8()], pos));
        }
    }

    /// Reads a maximal run of term characters starting at `start`.
    fn read_term(&mut self, start: usize) -> Token<'a> {
        let mut end = start;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if !is_term_char(ch) {
                break;
            }
            end = pos + ch.len_utf8();
            self.chars.next();
        }
        self.term_end = Some(end);
        Token::new(TokenKind::Term, &self.input[start..end], start)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Characters that make up a term.
fn is_term_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || (!ch.is_ascii() && !ch.is_whitespace())
}

/// Convenience function to tokenize a whole query string.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}
