//! Implementation of `sift tokens`.

use std::process::ExitCode;

use sift_query::{Lexer, Token};

use crate::cli::args::TokensCommand;

/// Prints one line per token: byte offset, kind and source text.
pub fn run(cmd: &TokensCommand) -> ExitCode {
    let mut lexer = Lexer::new(&cmd.query);
    for token in lexer.by_ref() {
        println!("{}", format_token(&token));
    }
    println!("{}", format_token(&Token::eof(lexer.end_offset())));
    ExitCode::SUCCESS
}

/// Formats a token as an aligned row.
fn format_token(token: &Token<'_>) -> String {
    let kind = format!("{:?}", token.kind);
    format!("{:>4}  {kind:<6}  {}", token.offset, token.text)
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use sift_query::TokenKind;

    use super::*;

    #[test]
    fn rows_are_aligned() {
        assert_eq!(
            format_token(&Token::new(TokenKind::Term, "hello", 3)),
            "   3  Term    hello"
        );
        assert_eq!(
            format_token(&Token::new(TokenKind::Colon, ":", 6)),
            "   6  Colon   :"
        );
        assert_eq!(format_token(&Token::eof(12)), "  12  Eof");
    }
}
