//! Mica
//!
//! Compiler and virtual machine for Mica, a small class-based C-like
//! teaching language.
//!
//! The pipeline lives in the workspace crates ([`mica_parser`] for syntax,
//! [`mica_compiler`] for analysis and bytecode); this crate ties them
//! together in a [`Driver`] and executes the result on a [`vm::Vm`].
//!
//! ## Example
//!
//! ```
//! use mica::{CompileOptions, Driver};
//!
//! let driver = Driver::new(CompileOptions::default());
//! let compilation = driver
//!     .compile_source("void main() { int i; i = 6; write(i * 7); }")
//!     .unwrap();
//! let execution = driver.run(&compilation.module, "".as_bytes());
//! assert_eq!(execution.stdout, "42\n");
//! ```

pub mod driver;
pub mod vm;

pub use driver::{CompileFailure, CompileOptions, Compilation, Driver, Execution};
pub use mica_compiler::BytecodeModule;
pub use mica_core::{Diagnostic, DiagnosticKind, MicaError, RuntimeError};
