//! Lexer and parser for Mica source code.
//!
//! ```
//! use mica_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! match Parser::parse("void main() { write(42); }", &arena) {
//!     Ok(program) => assert_eq!(program.items().len(), 1),
//!     Err(err) => panic!("{err}"),
//! }
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{Parser, Program};
pub use lexer::{Lexer, Span, Token, TokenKind};
