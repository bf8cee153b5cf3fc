//! Mica Compiler
//!
//! Semantic analysis and code generation for Mica programs.
//!
//! ## Architecture
//!
//! - **Analysis**: one walk over the tree builds the symbol table, checks
//!   every scoping and typing rule and decorates each expression with its
//!   type. All problems are collected as diagnostics.
//! - **Generation**: runs only on programs without diagnostics and drives an
//!   [`Emitter`] backend; [`BytecodeBackend`] produces a [`BytecodeModule`].
//!
//! ## Modules
//!
//! - [`symbols`]: leveled symbol table
//! - [`sema`]: the analyzer
//! - [`emit`]: instruction set and backend contract
//! - [`codegen`]: tree walk from decorated AST to instructions
//! - [`bytecode`]: the bytecode backend and module format
//!
//! ## Example
//!
//! ```
//! use bumpalo::Bump;
//! use mica_compiler::{BytecodeBackend, analyze, generate};
//! use mica_parser::Parser;
//!
//! let arena = Bump::new();
//! let program = Parser::parse("void main() { int x; x = 5; write(x); }", &arena).unwrap();
//! let analysis = analyze(&program);
//! assert!(analysis.is_ok());
//!
//! let module = generate(&program, &analysis, BytecodeBackend::default(), None).unwrap();
//! assert!(module.entry.is_some());
//! ```

pub mod bytecode;
pub mod codegen;
pub mod emit;
pub mod sema;
pub mod symbols;

pub use bytecode::{BytecodeBackend, BytecodeModule, OpCode, ValueKind};
pub use codegen::{CodeGenerator, generate};
pub use emit::{Emitter, Instruction, Label, MethodSink, Numeric};
pub use sema::{Analysis, Analyzer, Binding, Decorations, analyze};
pub use symbols::{Builtin, Symbol, SymbolTable};

pub use mica_core::CodeGenError;
