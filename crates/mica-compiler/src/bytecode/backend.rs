//! [`Emitter`] implementation producing a [`BytecodeModule`].

use std::path::Path;

use mica_core::{CodeGenError, SymbolHash, Type};
use tracing::{debug, trace};

use super::{
    BytecodeChunk, BytecodeModule, ClassLayout, Constant, ConstantPool, Function, OpCode, ValueKind,
};
use crate::emit::{Emitter, Instruction, Label, MethodSink, Numeric};

/// Placeholder written into jump operands until labels are resolved.
const UNPATCHED: u32 = u32::MAX;

#[derive(Debug)]
struct MethodBuilder {
    name: String,
    hash: SymbolHash,
    is_global: bool,
    arity: usize,
    returns_value: bool,
    locals: Vec<ValueKind>,
    chunk: BytecodeChunk,
    line: u32,
    labels: Vec<Option<u32>>,
    /// Operand offsets of jumps, with the label each one targets.
    fixups: Vec<(usize, Label)>,
}

impl MethodBuilder {
    fn limit(&self, what: &'static str) -> CodeGenError {
        CodeGenError::LimitExceeded {
            method: self.name.clone(),
            what,
        }
    }
}

/// Encodes instructions into per-function [`BytecodeChunk`]s.
#[derive(Debug)]
pub struct BytecodeBackend {
    entry_point: String,
    constants: ConstantPool,
    classes: Vec<ClassLayout>,
    globals: Vec<ValueKind>,
    methods: Vec<MethodBuilder>,
}

impl Default for BytecodeBackend {
    fn default() -> Self {
        Self::new("main")
    }
}

impl BytecodeBackend {
    /// A backend whose module starts in the global method `entry_point`.
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
            constants: ConstantPool::new(),
            classes: Vec::new(),
            globals: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn method(&mut self, sink: MethodSink) -> &mut MethodBuilder {
        &mut self.methods[sink.0 as usize]
    }

    fn constant(&mut self, sink: MethodSink, constant: Constant) -> Result<u16, CodeGenError> {
        let idx = self.constants.add(constant);
        u16::try_from(idx).map_err(|_| self.methods[sink.0 as usize].limit("constants"))
    }

    fn encode_slot(builder: &mut MethodBuilder, op: OpCode, slot: u32) -> Result<(), CodeGenError> {
        let slot = u16::try_from(slot).map_err(|_| builder.limit("slots"))?;
        let line = builder.line;
        builder.chunk.write_op(op, line);
        builder.chunk.write_u16(slot, line);
        Ok(())
    }

    fn encode_constant(
        &mut self,
        sink: MethodSink,
        op: OpCode,
        constant: Constant,
    ) -> Result<(), CodeGenError> {
        let idx = self.constant(sink, constant)?;
        let builder = self.method(sink);
        let line = builder.line;
        builder.chunk.write_op(op, line);
        builder.chunk.write_u16(idx, line);
        Ok(())
    }

    fn encode_jump(builder: &mut MethodBuilder, op: OpCode, label: Label) {
        let line = builder.line;
        builder.chunk.write_op(op, line);
        builder.fixups.push((builder.chunk.current_offset(), label));
        builder.chunk.write_u32(UNPATCHED, line);
    }

    fn arithmetic(width: Numeric, int: OpCode, double: OpCode) -> OpCode {
        match width {
            Numeric::Int => int,
            Numeric::Double => double,
        }
    }

    fn finish(mut builder: MethodBuilder) -> Result<Function, CodeGenError> {
        for (offset, label) in std::mem::take(&mut builder.fixups) {
            let target = builder
                .labels
                .get(label.0 as usize)
                .copied()
                .flatten()
                .ok_or_else(|| CodeGenError::UnboundLabel {
                    method: builder.name.clone(),
                    label: label.0,
                })?;
            builder.chunk.patch_u32(offset, target);
        }
        let arity = u8::try_from(builder.arity).map_err(|_| builder.limit("parameters"))?;
        Ok(Function {
            name: builder.name,
            hash: builder.hash,
            arity,
            has_receiver: !builder.is_global,
            returns_value: builder.returns_value,
            locals: builder.locals,
            chunk: builder.chunk,
        })
    }
}

impl Emitter for BytecodeBackend {
    type Artifact = BytecodeModule;

    fn define_type(&mut self, name: &str, fields: &[Type]) -> SymbolHash {
        let hash = SymbolHash::from_class(name);
        trace!(class = name, fields = fields.len(), "define type");
        self.classes.push(ClassLayout {
            name: name.to_string(),
            hash,
            fields: fields.iter().map(ValueKind::of).collect(),
        });
        hash
    }

    fn declare_global(&mut self, name: &str, ty: &Type) -> Result<u32, CodeGenError> {
        let slot = self.globals.len() as u32;
        if slot > u32::from(u16::MAX) {
            return Err(CodeGenError::LimitExceeded {
                method: name.to_string(),
                what: "globals",
            });
        }
        self.globals.push(ValueKind::of(ty));
        Ok(slot)
    }

    fn define_method(
        &mut self,
        owner: Option<&str>,
        name: &str,
        return_type: &Type,
        params: &[Type],
    ) -> MethodSink {
        let sink = MethodSink(self.methods.len() as u32);
        let qualified = match owner {
            Some(owner) => format!("{owner}.{name}"),
            None => name.to_string(),
        };
        trace!(method = %qualified, params = params.len(), "define method");
        self.methods.push(MethodBuilder {
            name: qualified,
            hash: SymbolHash::for_method(owner, name),
            is_global: owner.is_none(),
            arity: params.len() + usize::from(owner.is_some()),
            returns_value: *return_type != Type::Void,
            locals: Vec::new(),
            chunk: BytecodeChunk::new(),
            line: 0,
            labels: Vec::new(),
            fixups: Vec::new(),
        });
        sink
    }

    fn declare_local(&mut self, method: MethodSink, ty: &Type) -> Result<u32, CodeGenError> {
        let builder = self.method(method);
        let slot = builder.locals.len() as u32;
        if slot > u32::from(u16::MAX) {
            return Err(builder.limit("locals"));
        }
        builder.locals.push(ValueKind::of(ty));
        Ok(slot)
    }

    fn set_line(&mut self, method: MethodSink, line: u32) {
        self.method(method).line = line;
    }

    fn emit(&mut self, method: MethodSink, instruction: Instruction) -> Result<(), CodeGenError> {
        use Instruction as I;

        let op = match instruction {
            I::PushInt(0) => OpCode::PushZero,
            I::PushInt(1) => OpCode::PushOne,
            I::PushInt(v) => {
                return self.encode_constant(method, OpCode::Constant, Constant::Int(v));
            }
            I::PushDouble(v) => {
                return self.encode_constant(method, OpCode::Constant, Constant::Double(v));
            }
            I::PushChar(c) => {
                return self.encode_constant(method, OpCode::Constant, Constant::Char(c));
            }
            I::PushString(s) => {
                return self.encode_constant(method, OpCode::Constant, Constant::String(s));
            }
            I::New(class) => {
                return self.encode_constant(method, OpCode::New, Constant::Class(class));
            }
            I::Call { method: target, argc } => {
                let idx = self.constant(method, Constant::Method(target))?;
                let builder = self.method(method);
                let argc = u8::try_from(argc).map_err(|_| builder.limit("arguments"))?;
                let line = builder.line;
                builder.chunk.write_op(OpCode::Call, line);
                builder.chunk.write_u16(idx, line);
                builder.chunk.write_byte(argc, line);
                return Ok(());
            }
            I::LoadLocal(slot) => {
                return Self::encode_slot(self.method(method), OpCode::GetLocal, slot);
            }
            I::StoreLocal(slot) => {
                return Self::encode_slot(self.method(method), OpCode::SetLocal, slot);
            }
            I::LoadGlobal(slot) => {
                return Self::encode_slot(self.method(method), OpCode::GetGlobal, slot);
            }
            I::StoreGlobal(slot) => {
                return Self::encode_slot(self.method(method), OpCode::SetGlobal, slot);
            }
            I::LoadField(index) => {
                return Self::encode_slot(self.method(method), OpCode::GetField, index);
            }
            I::StoreField(index) => {
                return Self::encode_slot(self.method(method), OpCode::SetField, index);
            }
            I::Jump(label) => {
                Self::encode_jump(self.method(method), OpCode::Jump, label);
                return Ok(());
            }
            I::JumpIfFalse(label) => {
                Self::encode_jump(self.method(method), OpCode::JumpIfFalse, label);
                return Ok(());
            }
            I::JumpIfTrue(label) => {
                Self::encode_jump(self.method(method), OpCode::JumpIfTrue, label);
                return Ok(());
            }
            I::NewArray(element) => {
                let builder = self.method(method);
                let line = builder.line;
                builder.chunk.write_op(OpCode::NewArray, line);
                builder
                    .chunk
                    .write_byte(ValueKind::of(&element).into(), line);
                return Ok(());
            }
            I::Read(ty) => {
                let builder = self.method(method);
                let line = builder.line;
                builder.chunk.write_op(OpCode::Read, line);
                builder.chunk.write_byte(ValueKind::of(&ty).into(), line);
                return Ok(());
            }
            I::PushBool(true) => OpCode::PushTrue,
            I::PushBool(false) => OpCode::PushFalse,
            I::PushNull => OpCode::PushNull,
            I::Pop => OpCode::Pop,
            I::LoadElement => OpCode::GetElement,
            I::StoreElement => OpCode::SetElement,
            I::Add(w) => Self::arithmetic(w, OpCode::AddI32, OpCode::AddF64),
            I::Sub(w) => Self::arithmetic(w, OpCode::SubI32, OpCode::SubF64),
            I::Mul(w) => Self::arithmetic(w, OpCode::MulI32, OpCode::MulF64),
            I::Div(w) => Self::arithmetic(w, OpCode::DivI32, OpCode::DivF64),
            I::Rem(w) => Self::arithmetic(w, OpCode::ModI32, OpCode::ModF64),
            I::Neg(w) => Self::arithmetic(w, OpCode::NegI32, OpCode::NegF64),
            I::Not => OpCode::Not,
            I::Equal => OpCode::Equal,
            I::NotEqual => OpCode::NotEqual,
            I::Less => OpCode::Less,
            I::LessEqual => OpCode::LessEqual,
            I::Greater => OpCode::Greater,
            I::GreaterEqual => OpCode::GreaterEqual,
            I::IntToDouble => OpCode::I32toF64,
            I::DoubleToInt => OpCode::F64toI32,
            I::CharToInt => OpCode::CharToI32,
            I::IntToChar => OpCode::I32toChar,
            I::ArrayLength => OpCode::ArrayLength,
            I::Return => OpCode::Return,
            I::ReturnVoid => OpCode::ReturnVoid,
            I::Write => OpCode::Write,
        };
        let builder = self.method(method);
        let line = builder.line;
        builder.chunk.write_op(op, line);
        Ok(())
    }

    fn new_label(&mut self, method: MethodSink) -> Label {
        let builder = self.method(method);
        let label = Label(builder.labels.len() as u32);
        builder.labels.push(None);
        label
    }

    fn mark_label(&mut self, method: MethodSink, label: Label) {
        let builder = self.method(method);
        let offset = builder.chunk.current_offset() as u32;
        if let Some(slot) = builder.labels.get_mut(label.0 as usize) {
            *slot = Some(offset);
        }
    }

    fn finalize(self, output: Option<&Path>) -> Result<BytecodeModule, CodeGenError> {
        let entry = self
            .methods
            .iter()
            .find(|m| m.is_global && m.name == self.entry_point && m.arity == 0)
            .map(|m| m.hash);

        let functions = self
            .methods
            .into_iter()
            .map(Self::finish)
            .collect::<Result<Vec<_>, _>>()?;

        let module = BytecodeModule {
            functions,
            classes: self.classes,
            globals: self.globals,
            constants: self.constants.into_constants(),
            entry,
        };
        debug!(
            functions = module.functions.len(),
            classes = module.classes.len(),
            constants = module.constants.len(),
            has_entry = module.entry.is_some(),
            "bytecode module assembled"
        );

        if let Some(path) = output {
            module.write_to(path)?;
            debug!(path = %path.display(), "artifact written");
        }
        Ok(module)
    }
}
