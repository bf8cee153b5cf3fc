//! Bytecode backend: opcodes, chunks, the constant pool and the module format.

mod backend;
mod chunk;
mod constant;
mod module;
mod opcode;

pub use backend::BytecodeBackend;
pub use chunk::BytecodeChunk;
pub use constant::{Constant, ConstantPool};
pub use module::{BytecodeModule, ClassLayout, Function, ValueKind};
pub use opcode::OpCode;
