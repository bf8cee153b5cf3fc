//! Bytecode operation codes.
//!
//! Each opcode is a single byte with its operands following inline,
//! big-endian. Jump targets are absolute offsets into the function's code.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes for the Mica stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push constant from the module pool.
    /// Operand: u16 constant index
    Constant = 0,
    PushNull,
    PushTrue,
    PushFalse,
    PushZero,
    PushOne,

    // =========================================================================
    // Stack
    // =========================================================================
    Pop,

    // =========================================================================
    // Storage
    // =========================================================================
    /// Operand: u16 slot
    GetLocal,
    /// Operand: u16 slot
    SetLocal,
    /// Operand: u16 slot
    GetGlobal,
    /// Operand: u16 slot
    SetGlobal,
    /// Pops the object. Operand: u16 field index
    GetField,
    /// Pops the value, then the object. Operand: u16 field index
    SetField,
    /// Pops the index, then the array.
    GetElement,
    /// Pops the value, the index, then the array.
    SetElement,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    AddI32,
    SubI32,
    MulI32,
    DivI32,
    ModI32,
    NegI32,
    AddF64,
    SubF64,
    MulF64,
    DivF64,
    ModF64,
    NegF64,

    // =========================================================================
    // Logic and comparison
    // =========================================================================
    Not,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // =========================================================================
    // Conversions
    // =========================================================================
    I32toF64,
    F64toI32,
    CharToI32,
    I32toChar,
    ArrayLength,

    // =========================================================================
    // Control flow
    // =========================================================================
    /// Operand: u32 absolute target
    Jump,
    /// Pops the condition. Operand: u32 absolute target
    JumpIfFalse,
    /// Pops the condition. Operand: u32 absolute target
    JumpIfTrue,
    /// Operand: u16 constant index of the method hash, u8 argument count
    Call,
    /// Return the value on top of the stack.
    Return,
    ReturnVoid,

    // =========================================================================
    // Objects and I/O
    // =========================================================================
    /// Operand: u16 constant index of the class hash
    New,
    /// Pops the length. Operand: u8 element kind
    NewArray,
    /// Operand: u8 value kind
    Read,
    Write,
}

impl OpCode {
    /// Decode a byte, or `None` if it is not an opcode.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::NewArray | OpCode::Read => 1,
            OpCode::Constant
            | OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetGlobal
            | OpCode::SetGlobal
            | OpCode::GetField
            | OpCode::SetField
            | OpCode::New => 2,
            OpCode::Call => 3,
            OpCode::Jump | OpCode::JumpIfFalse | OpCode::JumpIfTrue => 4,
            _ => 0,
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            OpCode::Jump | OpCode::JumpIfFalse | OpCode::JumpIfTrue
        )
    }

    /// Mnemonic used by the disassembler.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Constant => "CONSTANT",
            OpCode::PushNull => "PUSH_NULL",
            OpCode::PushTrue => "PUSH_TRUE",
            OpCode::PushFalse => "PUSH_FALSE",
            OpCode::PushZero => "PUSH_ZERO",
            OpCode::PushOne => "PUSH_ONE",
            OpCode::Pop => "POP",
            OpCode::GetLocal => "GET_LOCAL",
            OpCode::SetLocal => "SET_LOCAL",
            OpCode::GetGlobal => "GET_GLOBAL",
            OpCode::SetGlobal => "SET_GLOBAL",
            OpCode::GetField => "GET_FIELD",
            OpCode::SetField => "SET_FIELD",
            OpCode::GetElement => "GET_ELEMENT",
            OpCode::SetElement => "SET_ELEMENT",
            OpCode::AddI32 => "ADD_I32",
            OpCode::SubI32 => "SUB_I32",
            OpCode::MulI32 => "MUL_I32",
            OpCode::DivI32 => "DIV_I32",
            OpCode::ModI32 => "MOD_I32",
            OpCode::NegI32 => "NEG_I32",
            OpCode::AddF64 => "ADD_F64",
            OpCode::SubF64 => "SUB_F64",
            OpCode::MulF64 => "MUL_F64",
            OpCode::DivF64 => "DIV_F64",
            OpCode::ModF64 => "MOD_F64",
            OpCode::NegF64 => "NEG_F64",
            OpCode::Not => "NOT",
            OpCode::Equal => "EQUAL",
            OpCode::NotEqual => "NOT_EQUAL",
            OpCode::Less => "LESS",
            OpCode::LessEqual => "LESS_EQUAL",
            OpCode::Greater => "GREATER",
            OpCode::GreaterEqual => "GREATER_EQUAL",
            OpCode::I32toF64 => "I32_TO_F64",
            OpCode::F64toI32 => "F64_TO_I32",
            OpCode::CharToI32 => "CHAR_TO_I32",
            OpCode::I32toChar => "I32_TO_CHAR",
            OpCode::ArrayLength => "ARRAY_LENGTH",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::JumpIfTrue => "JUMP_IF_TRUE",
            OpCode::Call => "CALL",
            OpCode::Return => "RETURN",
            OpCode::ReturnVoid => "RETURN_VOID",
            OpCode::New => "NEW",
            OpCode::NewArray => "NEW_ARRAY",
            OpCode::Read => "READ",
            OpCode::Write => "WRITE",
        }
    }
}
