//! Abstract syntax tree for Mica and the parser that builds it.
//!
//! The tree is a closed set of tagged unions allocated in a [`bumpalo::Bump`]
//! arena; every phase walks it with one `match` per node kind.
//!
//! # Example
//!
//! ```
//! use mica_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     class Counter {
//!         int value;
//!         void bump() { value = value + 1; }
//!     }
//!     void main() { write(1); }
//! "#;
//!
//! let program = Parser::parse(source, &arena).unwrap();
//! assert_eq!(program.items().len(), 2);
//! ```

pub mod decl;
pub mod expr;
pub mod ops;
pub mod stmt;
pub mod types;

mod decl_parser;
mod expr_parser;
mod parser;
mod stmt_parser;

pub use mica_core::{ParseError, ParseErrorKind};

pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;
pub use types::*;

use mica_core::Span;

/// A parsed compilation unit.
#[derive(Debug, Clone, Copy)]
pub struct Program<'ast> {
    items: &'ast [Item<'ast>],
    span: Span,
    expr_count: u32,
}

impl<'ast> Program<'ast> {
    pub(crate) fn new(items: &'ast [Item<'ast>], span: Span, expr_count: u32) -> Self {
        Self {
            items,
            span,
            expr_count,
        }
    }

    /// Top-level items in source order.
    pub fn items(&self) -> &'ast [Item<'ast>] {
        self.items
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Number of expression nodes; every [`ExprId`] is below this.
    pub fn expr_count(&self) -> u32 {
        self.expr_count
    }

    pub fn classes(&self) -> impl Iterator<Item = &'ast ClassDecl<'ast>> + 'ast {
        self.items.iter().filter_map(|item| match item {
            Item::Class(class) => Some(class),
            _ => None,
        })
    }
}
