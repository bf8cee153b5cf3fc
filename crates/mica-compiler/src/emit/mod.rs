//! The boundary between the code generator and a concrete backend.
//!
//! The generator speaks only in [`Instruction`]s and [`Label`]s; a backend
//! decides encoding, layout and what the finished artifact is. Slots handed
//! out by [`Emitter::declare_local`] are never reused within a method.

use std::fmt;
use std::path::Path;

use mica_core::{CodeGenError, SymbolHash, Type};

/// A jump target inside one method. Created unbound, placed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

/// Handle to a method whose body is being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodSink(pub u32);

/// Operand width of an arithmetic instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Numeric {
    Int,
    Double,
}

impl Numeric {
    /// `Double` if the type is double, otherwise `Int`.
    pub fn of(ty: &Type) -> Self {
        if *ty == Type::Double {
            Numeric::Double
        } else {
            Numeric::Int
        }
    }
}

/// Stack machine instructions.
///
/// Stores pop their value; field and element stores additionally pop the
/// object (and index) pushed before the value. Calls pop `argc` values,
/// receiver first, and push the result of non-void methods.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    PushInt(i32),
    PushDouble(f64),
    PushChar(char),
    PushBool(bool),
    PushString(String),
    PushNull,
    Pop,

    LoadLocal(u32),
    StoreLocal(u32),
    LoadGlobal(u32),
    StoreGlobal(u32),
    LoadField(u32),
    StoreField(u32),
    LoadElement,
    StoreElement,

    Add(Numeric),
    Sub(Numeric),
    Mul(Numeric),
    Div(Numeric),
    Rem(Numeric),
    Neg(Numeric),
    Not,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    IntToDouble,
    DoubleToInt,
    CharToInt,
    IntToChar,
    ArrayLength,

    Jump(Label),
    JumpIfFalse(Label),
    JumpIfTrue(Label),

    Call { method: SymbolHash, argc: u32 },
    Return,
    ReturnVoid,

    New(SymbolHash),
    /// Allocate an array with this element type; the length is on the stack.
    NewArray(Type),
    /// Parse one token of the given type from input and push it.
    Read(Type),
    Write,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushInt(v) => write!(f, "push.i {v}"),
            Instruction::PushDouble(v) => write!(f, "push.d {v}"),
            Instruction::PushChar(c) => write!(f, "push.c {c:?}"),
            Instruction::PushBool(b) => write!(f, "push.b {b}"),
            Instruction::PushString(s) => write!(f, "push.s {s:?}"),
            Instruction::Jump(l) => write!(f, "jump L{}", l.0),
            Instruction::JumpIfFalse(l) => write!(f, "jump.false L{}", l.0),
            Instruction::JumpIfTrue(l) => write!(f, "jump.true L{}", l.0),
            Instruction::Call { method, argc } => write!(f, "call {method} {argc}"),
            Instruction::NewArray(ty) => write!(f, "new.array {ty}"),
            Instruction::Read(ty) => write!(f, "read {ty}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// A code generation backend.
///
/// Methods and types are defined in program order; a method's body is
/// emitted completely before the next method is defined.
pub trait Emitter {
    /// What [`Emitter::finalize`] produces.
    type Artifact;

    /// Define a class layout with fields in slot order.
    fn define_type(&mut self, name: &str, fields: &[Type]) -> SymbolHash;

    /// Reserve a global slot.
    fn declare_global(&mut self, name: &str, ty: &Type) -> Result<u32, CodeGenError>;

    /// Start a method. `params` excludes the receiver of instance methods.
    fn define_method(
        &mut self,
        owner: Option<&str>,
        name: &str,
        return_type: &Type,
        params: &[Type],
    ) -> MethodSink;

    /// Reserve a fresh local slot in `method`.
    fn declare_local(&mut self, method: MethodSink, ty: &Type) -> Result<u32, CodeGenError>;

    /// Source line attached to subsequently emitted instructions.
    fn set_line(&mut self, _method: MethodSink, _line: u32) {}

    fn emit(&mut self, method: MethodSink, instruction: Instruction) -> Result<(), CodeGenError>;

    fn new_label(&mut self, method: MethodSink) -> Label;

    /// Bind `label` to the next instruction emitted into `method`.
    fn mark_label(&mut self, method: MethodSink, label: Label);

    /// Resolve labels, assemble the artifact and write it to `output` if given.
    fn finalize(self, output: Option<&Path>) -> Result<Self::Artifact, CodeGenError>;
}
