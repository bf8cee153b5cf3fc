//! Bytecode for a single function, with line information.

use serde::{Deserialize, Serialize};

use super::OpCode;

/// Encoded instructions of one function.
///
/// `lines` runs parallel to `code`: every byte, operand bytes included,
/// carries the source line it was emitted for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeChunk {
    code: Vec<u8>,
    lines: Vec<u32>,
}

impl BytecodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op.into(), line);
    }

    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, line);
        }
    }

    /// Write a 32-bit operand (big-endian).
    pub fn write_u32(&mut self, value: u32, line: u32) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, line);
        }
    }

    /// Overwrite a previously written 32-bit operand.
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.code[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Offset the next byte will be written at.
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.code.get(offset..offset + 4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.read_byte(offset).and_then(OpCode::from_u8)
    }

    /// Offsets and opcodes of every instruction, skipping operands.
    pub fn instructions(&self) -> Vec<(usize, OpCode)> {
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < self.code.len() {
            match self.read_op(offset) {
                Some(op) => {
                    out.push((offset, op));
                    offset += 1 + op.operand_size();
                }
                None => offset += 1,
            }
        }
        out
    }

    /// The opcode sequence, ignoring operands.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instructions().into_iter().map(|(_, op)| op).collect()
    }

    /// Check that this chunk holds exactly the given opcode sequence.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Check that the given opcodes appear in order, not necessarily adjacent.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut wanted = expected.iter().peekable();
        for op in &actual {
            if wanted.peek() == Some(&op) {
                wanted.next();
            }
        }
        if wanted.peek().is_some() {
            let remaining: Vec<_> = wanted.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}
