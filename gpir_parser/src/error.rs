//! Parse and lowering error types.

use thiserror::Error;

use crate::span::Span;

/// Everything that can go wrong turning text into a module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The lexer could not recognize a token
    #[error("unrecognized token at {span:?}")]
    UnrecognizedToken { span: Span },

    /// Unexpected token
    #[error("unexpected token '{found}' at {span:?}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    /// Unexpected end of input
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    /// Unknown stage tag
    #[error("unknown stage '{name}' at {span:?}")]
    UnknownStage { name: String, span: Span },

    /// A `$Name` that no declaration introduces
    #[error("unknown type name '${name}' at {span:?}")]
    UnknownType { name: String, span: Span },

    /// A `%name` or `@name` with no matching definition
    #[error("unknown value '{name}' at {span:?}")]
    UnknownValue { name: String, span: Span },

    /// A `'name` that labels no block of the enclosing function
    #[error("unknown block '{name}' at {span:?}")]
    UnknownBlock { name: String, span: Span },

    /// A name introduced twice in one scope
    #[error("duplicate definition of '{name}' at {span:?}")]
    DuplicateDefinition { name: String, span: Span },
}

impl ParseError {
    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
