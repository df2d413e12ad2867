//! gpir_parser
//!
//! Lexer and parser for the textual GPIR module format. Parsing produces a
//! private syntax tree which lowering resolves into a [`gpir::Module`]; the
//! result round-trips with [`gpir::ir::print_module`].
//!
//! # Example
//!
//! ```
//! let source = "module \"m\"\nstage raw\n";
//! let module = gpir_parser::parse_module(source).expect("parse failed");
//! assert_eq!(module.name, "m");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod span;
pub mod token;

pub use error::{ParseError, ParseResult};
pub use lexer::{tokenize, SpannedToken};
pub use parser::Parser;
pub use span::{SourceMap, Span};
pub use token::Token;

/// Parse a textual module into a [`gpir::Module`].
pub fn parse_module(source: &str) -> ParseResult<gpir::Module> {
    let ast = Parser::new(source)?.parse_module_ast()?;
    lower::lower_module(&ast)
}
