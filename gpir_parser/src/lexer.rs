//! Span-tracking wrapper around the logos-generated lexer.

use logos::Logos;

use crate::error::{ParseError, ParseResult};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize a whole source text.
pub fn tokenize(source: &str) -> ParseResult<Vec<SpannedToken>> {
    let source_map = SourceMap::new(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = source_map.span(range.start, range.end);
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => return Err(ParseError::UnrecognizedToken { span }),
        }
    }
    Ok(tokens)
}
