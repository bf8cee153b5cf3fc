//! Bytecode virtual machine.
//!
//! - [`value`]: runtime values
//! - [`memory`]: the object heap
//! - [`interpreter`]: the instruction loop

pub mod interpreter;
pub mod memory;
pub mod value;

pub use interpreter::{MAX_ARRAY_LEN, MAX_FRAMES, Vm};
pub use memory::{Handle, HeapObject, ObjectHeap};
pub use value::Value;
