//! Lexical analysis for Mica source code.

mod cursor;
#[allow(clippy::module_inception)]
mod lexer;
mod token;

pub use lexer::Lexer;
pub use mica_core::Span;
pub use token::{Token, TokenKind, lookup_keyword};
