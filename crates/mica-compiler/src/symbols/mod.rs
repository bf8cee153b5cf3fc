//! Symbols and the scoped table that holds them.
//!
//! One [`SymbolTable`] holds globals and the locals of the method being
//! analyzed. Every class owns a second table for its members, which also
//! carries the locals of that class's methods while they are analyzed.

mod symbol;
mod table;

pub use symbol::{Builtin, ClassSymbol, MethodSymbol, ParameterSymbol, Symbol, VariableSymbol};
pub use table::{AlreadyDeclared, OUTERMOST, SymbolTable};
