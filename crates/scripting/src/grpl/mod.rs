//! GRPL Language Front End
//!
//! GRPL is a postfix, stack-based language: literals push values, words run
//! commands, and `if`/`while`/`fun` blocks nest statement lists.

pub mod lexer;
pub mod ast;
pub mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use ast::{strip_all, IfBranch, Statement};
pub use parser::Parser;

use crate::error::ParseError;

/// Parse a complete program
pub fn parse(source: &str) -> Result<Vec<Statement>, ParseError> {
    Parser::new(source)?.parse()
}
