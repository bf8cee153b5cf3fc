//! Shared vocabulary of the Mica toolchain.
//!
//! - [`Span`]: source locations
//! - [`Type`] and the compatibility rules in [`types`]
//! - [`SymbolHash`]: deterministic class and method handles
//! - the error taxonomy in [`error`]

pub mod error;
pub mod span;
pub mod symbol_hash;
pub mod types;

pub use error::{
    CodeGenError, Diagnostic, DiagnosticKind, Diagnostics, LexError, MicaError, ParseError,
    ParseErrorKind, RuntimeError,
};
pub use span::Span;
pub use symbol_hash::SymbolHash;
pub use types::Type;
