//! The compiled artifact: functions, class layouts, globals and constants.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use mica_core::{CodeGenError, SymbolHash, Type};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{BytecodeChunk, Constant, OpCode};

/// Storage class of a slot, which fixes its default value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u8)]
pub enum ValueKind {
    Int = 0,
    Double,
    Char,
    Bool,
    String,
    /// Objects and arrays; defaults to null.
    Reference,
}

impl ValueKind {
    pub fn of(ty: &Type) -> Self {
        match ty {
            Type::Int => ValueKind::Int,
            Type::Double => ValueKind::Double,
            Type::Char => ValueKind::Char,
            Type::Bool => ValueKind::Bool,
            Type::String => ValueKind::String,
            _ => ValueKind::Reference,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// `name` or `Class.name`.
    pub name: String,
    pub hash: SymbolHash,
    /// Values popped by a call, receiver included.
    pub arity: u8,
    /// Whether slot 0 holds the receiver of an instance method.
    pub has_receiver: bool,
    pub returns_value: bool,
    /// Kind of every local slot, parameters first.
    pub locals: Vec<ValueKind>,
    pub chunk: BytecodeChunk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLayout {
    pub name: String,
    pub hash: SymbolHash,
    pub fields: Vec<ValueKind>,
}

/// A complete compiled program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BytecodeModule {
    pub functions: Vec<Function>,
    pub classes: Vec<ClassLayout>,
    pub globals: Vec<ValueKind>,
    pub constants: Vec<Constant>,
    /// The method execution starts in, if the program has one.
    pub entry: Option<SymbolHash>,
}

impl BytecodeModule {
    pub fn function(&self, hash: SymbolHash) -> Option<&Function> {
        self.functions.iter().find(|f| f.hash == hash)
    }

    pub fn function_named(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn class(&self, hash: SymbolHash) -> Option<&ClassLayout> {
        self.classes.iter().find(|c| c.hash == hash)
    }

    /// Index of every function by hash, for call dispatch.
    pub fn function_index(&self) -> FxHashMap<SymbolHash, usize> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.hash, i))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the module to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), CodeGenError> {
        let artifact_error = |message: String| CodeGenError::Artifact {
            path: path.display().to_string(),
            message,
        };
        let json = self.to_json().map_err(|e| artifact_error(e.to_string()))?;
        fs::write(path, json).map_err(|e| artifact_error(e.to_string()))
    }

    /// Human readable listing of every function.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for function in &self.functions {
            let _ = writeln!(
                out,
                "== {} (arity {}, {} locals) ==",
                function.name,
                function.arity,
                function.locals.len()
            );
            let chunk = &function.chunk;
            for (offset, op) in chunk.instructions() {
                let line = chunk.line_at(offset).unwrap_or(0);
                let _ = write!(out, "{offset:04} {line:>4} {:<14}", op.name());
                let operand = self.describe_operand(chunk, offset, op);
                let _ = writeln!(out, "{operand}");
            }
        }
        out
    }

    fn describe_operand(&self, chunk: &BytecodeChunk, offset: usize, op: OpCode) -> String {
        let at = offset + 1;
        match op {
            OpCode::Constant | OpCode::New => chunk
                .read_u16(at)
                .map(|idx| match self.constants.get(idx as usize) {
                    Some(constant) => format!(" {idx} ({constant:?})"),
                    None => format!(" {idx} (?)"),
                })
                .unwrap_or_default(),
            OpCode::Call => {
                let idx = chunk.read_u16(at).unwrap_or(0);
                let argc = chunk.read_byte(at + 2).unwrap_or(0);
                let target = match self.constants.get(idx as usize) {
                    Some(Constant::Method(hash)) => self
                        .function(*hash)
                        .map_or_else(|| hash.to_string(), |f| f.name.clone()),
                    _ => "?".to_string(),
                };
                format!(" {target} argc={argc}")
            }
            OpCode::NewArray | OpCode::Read => chunk
                .read_byte(at)
                .and_then(ValueKind::from_u8)
                .map(|kind| format!(" {kind:?}"))
                .unwrap_or_default(),
            op if op.is_jump() => chunk
                .read_u32(at)
                .map(|target| format!(" -> {target:04}"))
                .unwrap_or_default(),
            op if op.operand_size() == 2 => chunk
                .read_u16(at)
                .map(|slot| format!(" {slot}"))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BytecodeModule {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_u16(0, 1);
        chunk.write_op(OpCode::Write, 1);
        chunk.write_op(OpCode::ReturnVoid, 2);
        let hash = SymbolHash::from_function("main");
        BytecodeModule {
            functions: vec![Function {
                name: "main".into(),
                hash,
                arity: 0,
                has_receiver: false,
                returns_value: false,
                locals: vec![ValueKind::Int],
                chunk,
            }],
            classes: vec![],
            globals: vec![ValueKind::Double],
            constants: vec![Constant::String("hi".into())],
            entry: Some(hash),
        }
    }

    #[test]
    fn value_kinds() {
        assert_eq!(ValueKind::of(&Type::Char), ValueKind::Char);
        assert_eq!(
            ValueKind::of(&Type::array_of(Type::Int)),
            ValueKind::Reference
        );
        assert_eq!(
            ValueKind::from_u8(ValueKind::Bool.into()),
            Some(ValueKind::Bool)
        );
        assert_eq!(ValueKind::from_u8(42), None);
    }

    #[test]
    fn json_preserves_the_module() {
        let module = sample();
        let json = module.to_json().unwrap();
        assert_eq!(BytecodeModule::from_json(&json).unwrap(), module);
    }

    #[test]
    fn disassembly_lists_instructions() {
        let listing = sample().disassemble();
        assert!(listing.starts_with("== main (arity 0, 1 locals) =="));
        assert!(listing.contains("CONSTANT"));
        assert!(listing.contains("String(\"hi\")"));
        assert!(listing.contains("RETURN_VOID"));
    }

    #[test]
    fn lookup_by_hash_and_name() {
        let module = sample();
        let main = SymbolHash::from_function("main");
        assert!(module.function(main).is_some());
        assert_eq!(module.function_named("main").map(|f| f.hash), Some(main));
        assert_eq!(module.function_index().get(&main), Some(&0));
    }
}
