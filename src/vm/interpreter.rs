//! The bytecode interpreter.
//!
//! A stack machine: every frame owns its locals, operands live on one
//! shared stack, and calls pop their arguments (receiver first) straight
//! into the callee's leading slots. Input and output are passed to
//! [`Vm::run`] rather than taken from the process.

use std::cmp::Ordering;
use std::io::{self, BufRead, Write};

use mica_compiler::bytecode::{Constant, Function};
use mica_compiler::{BytecodeModule, OpCode, ValueKind};
use mica_core::{RuntimeError, SymbolHash};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::memory::{Handle, HeapObject, ObjectHeap};
use super::value::Value;

type Result<T> = std::result::Result<T, RuntimeError>;

/// Deepest call nesting before execution stops with a stack overflow.
pub const MAX_FRAMES: usize = 1024;

/// Longest array `new T[n]` may allocate.
pub const MAX_ARRAY_LEN: usize = 1 << 24;

#[derive(Debug)]
struct StackFrame<'m> {
    function: &'m Function,
    ip: usize,
    locals: Vec<Value>,
    /// Operand stack height when the frame was entered.
    base: usize,
}

/// Executes one [`BytecodeModule`].
pub struct Vm<'m> {
    module: &'m BytecodeModule,
    functions: FxHashMap<SymbolHash, usize>,
    stack: Vec<Value>,
    frames: Vec<StackFrame<'m>>,
    globals: Vec<Value>,
    heap: ObjectHeap,
    /// Source line of the instruction being executed.
    line: u32,
}

impl<'m> Vm<'m> {
    pub fn new(module: &'m BytecodeModule) -> Self {
        Self {
            module,
            functions: module.function_index(),
            stack: Vec::new(),
            frames: Vec::new(),
            globals: Self::fresh_globals(module),
            heap: ObjectHeap::new(),
            line: 0,
        }
    }

    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    /// Run the module's entry point to completion.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self, mut input: impl BufRead, mut output: impl Write) -> Result<()> {
        let entry = self.module.entry.ok_or(RuntimeError::NoEntryPoint)?;
        self.stack.clear();
        self.frames.clear();
        self.globals = Self::fresh_globals(self.module);
        self.line = 0;

        debug!(
            functions = self.module.functions.len(),
            "starting execution"
        );
        self.invoke(entry, 0)?;
        while !self.frames.is_empty() {
            self.step(&mut input, &mut output)?;
        }
        output.flush()?;
        debug!(objects = self.heap.len(), "execution finished");
        Ok(())
    }

    fn fresh_globals(module: &BytecodeModule) -> Vec<Value> {
        defaults(&module.globals)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn step(&mut self, input: &mut impl BufRead, output: &mut impl Write) -> Result<()> {
        let (function, at) = match self.frames.last() {
            Some(frame) => (frame.function, frame.ip),
            None => return Err(RuntimeError::StackUnderflow),
        };
        let chunk = &function.chunk;
        let byte = chunk.read_byte(at).ok_or_else(|| {
            RuntimeError::CorruptModule(format!(
                "`{}` runs past the end of its code",
                function.name
            ))
        })?;
        let op = OpCode::from_u8(byte).ok_or(RuntimeError::InvalidOpcode(byte))?;
        self.line = chunk.line_at(at).unwrap_or(self.line);
        let operands = at + 1;
        self.frame_mut()?.ip = operands + op.operand_size();

        match op {
            OpCode::Constant => {
                let index = operand_u16(function, operands)?;
                let value = match self.constant(index)? {
                    Constant::Int(v) => Value::Int(*v),
                    Constant::Double(v) => Value::Double(*v),
                    Constant::Char(c) => Value::Char(*c),
                    Constant::String(s) => Value::Str(s.as_str().into()),
                    other => return Err(corrupt(format!("{other:?} is not a pushable constant"))),
                };
                self.stack.push(value);
            }
            OpCode::PushNull => self.stack.push(Value::Null),
            OpCode::PushTrue => self.stack.push(Value::Bool(true)),
            OpCode::PushFalse => self.stack.push(Value::Bool(false)),
            OpCode::PushZero => self.stack.push(Value::Int(0)),
            OpCode::PushOne => self.stack.push(Value::Int(1)),
            OpCode::Pop => {
                self.pop()?;
            }

            OpCode::GetLocal => {
                let slot = operand_u16(function, operands)? as usize;
                let value = self.frame_mut()?.locals.get(slot).cloned();
                let value = value.ok_or_else(|| bad_slot("local", slot))?;
                self.stack.push(value);
            }
            OpCode::SetLocal => {
                let slot = operand_u16(function, operands)? as usize;
                let value = self.pop()?;
                let target = self.frame_mut()?.locals.get_mut(slot);
                *target.ok_or_else(|| bad_slot("local", slot))? = value;
            }
            OpCode::GetGlobal => {
                let slot = operand_u16(function, operands)? as usize;
                let value = self.globals.get(slot).cloned();
                let value = value.ok_or_else(|| bad_slot("global", slot))?;
                self.stack.push(value);
            }
            OpCode::SetGlobal => {
                let slot = operand_u16(function, operands)? as usize;
                let value = self.pop()?;
                let target = self.globals.get_mut(slot);
                *target.ok_or_else(|| bad_slot("global", slot))? = value;
            }
            OpCode::GetField => {
                let index = operand_u16(function, operands)? as usize;
                let object = self.pop_object()?;
                let value = self.fields(object)?.get(index).cloned();
                let value = value.ok_or_else(|| bad_slot("field", index))?;
                self.stack.push(value);
            }
            OpCode::SetField => {
                let index = operand_u16(function, operands)? as usize;
                let value = self.pop()?;
                let object = self.pop_object()?;
                let target = self.fields(object)?.get_mut(index);
                *target.ok_or_else(|| bad_slot("field", index))? = value;
            }
            OpCode::GetElement => {
                let index = self.pop_int()?;
                let array = self.pop_object()?;
                let slot = self.element(array, index)?;
                let value = self.items(array)?[slot].clone();
                self.stack.push(value);
            }
            OpCode::SetElement => {
                let value = self.pop()?;
                let index = self.pop_int()?;
                let array = self.pop_object()?;
                let slot = self.element(array, index)?;
                self.items(array)?[slot] = value;
            }

            OpCode::AddI32 => self.int_op(|a, b| Ok(a.wrapping_add(b)))?,
            OpCode::SubI32 => self.int_op(|a, b| Ok(a.wrapping_sub(b)))?,
            OpCode::MulI32 => self.int_op(|a, b| Ok(a.wrapping_mul(b)))?,
            OpCode::DivI32 => {
                let line = self.line;
                self.int_op(|a, b| match b {
                    0 => Err(RuntimeError::DivisionByZero { line }),
                    _ => Ok(a.wrapping_div(b)),
                })?
            }
            OpCode::ModI32 => {
                let line = self.line;
                self.int_op(|a, b| match b {
                    0 => Err(RuntimeError::DivisionByZero { line }),
                    _ => Ok(a.wrapping_rem(b)),
                })?
            }
            OpCode::NegI32 => {
                let v = self.pop_int()?;
                self.stack.push(Value::Int(v.wrapping_neg()));
            }
            OpCode::AddF64 => self.double_op(|a, b| a + b)?,
            OpCode::SubF64 => self.double_op(|a, b| a - b)?,
            OpCode::MulF64 => self.double_op(|a, b| a * b)?,
            OpCode::DivF64 => self.double_op(|a, b| a / b)?,
            OpCode::ModF64 => self.double_op(|a, b| a % b)?,
            OpCode::NegF64 => {
                let v = self.pop_double()?;
                self.stack.push(Value::Double(-v));
            }

            OpCode::Not => {
                let v = self.pop_bool()?;
                self.stack.push(Value::Bool(!v));
            }
            OpCode::Equal => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.stack.push(Value::Bool(a == b));
            }
            OpCode::NotEqual => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.stack.push(Value::Bool(a != b));
            }
            OpCode::Less => self.relational(Ordering::is_lt)?,
            OpCode::LessEqual => self.relational(Ordering::is_le)?,
            OpCode::Greater => self.relational(Ordering::is_gt)?,
            OpCode::GreaterEqual => self.relational(Ordering::is_ge)?,

            OpCode::I32toF64 => {
                let v = self.pop_int()?;
                self.stack.push(Value::Double(f64::from(v)));
            }
            OpCode::F64toI32 => {
                // Truncates toward zero and saturates; NaN becomes 0.
                let v = self.pop_double()?;
                self.stack.push(Value::Int(v as i32));
            }
            OpCode::CharToI32 => {
                let c = self.pop_char()?;
                self.stack.push(Value::Int(c as i32));
            }
            OpCode::I32toChar => {
                let v = self.pop_int()?;
                let c = u32::try_from(v)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.stack.push(Value::Char(c));
            }
            OpCode::ArrayLength => {
                let array = self.pop_object()?;
                let len = self.items(array)?.len();
                self.stack.push(Value::Int(len as i32));
            }

            OpCode::Jump => {
                let target = jump_target(function, operands)?;
                self.frame_mut()?.ip = target;
            }
            OpCode::JumpIfFalse => {
                let target = jump_target(function, operands)?;
                if !self.pop_bool()? {
                    self.frame_mut()?.ip = target;
                }
            }
            OpCode::JumpIfTrue => {
                let target = jump_target(function, operands)?;
                if self.pop_bool()? {
                    self.frame_mut()?.ip = target;
                }
            }
            OpCode::Call => {
                let index = operand_u16(function, operands)?;
                let argc = operand_u8(function, operands + 2)? as usize;
                let method = match self.constant(index)? {
                    Constant::Method(hash) => *hash,
                    other => return Err(corrupt(format!("{other:?} is not a call target"))),
                };
                self.invoke(method, argc)?;
            }
            OpCode::Return => {
                let value = self.pop()?;
                self.leave()?;
                if !self.frames.is_empty() {
                    self.stack.push(value);
                }
            }
            OpCode::ReturnVoid => self.leave()?,

            OpCode::New => {
                let index = operand_u16(function, operands)?;
                let class = match self.constant(index)? {
                    Constant::Class(hash) => *hash,
                    other => return Err(corrupt(format!("{other:?} is not a class"))),
                };
                let layout = self
                    .module
                    .class(class)
                    .ok_or_else(|| corrupt(format!("no layout for class {class}")))?;
                let fields = defaults(&layout.fields);
                let value = self.allocate(HeapObject::Instance { class, fields });
                self.stack.push(value);
            }
            OpCode::NewArray => {
                let element = value_kind(operand_u8(function, operands)?)?;
                let size = self.pop_int()?;
                if size < 0 {
                    return Err(RuntimeError::NegativeArraySize {
                        size,
                        line: self.line,
                    });
                }
                let items = self.array_items(element, size)?;
                let value = self.allocate(HeapObject::Array { element, items });
                self.stack.push(value);
            }
            OpCode::Read => {
                let kind = value_kind(operand_u8(function, operands)?)?;
                let value = read_value(input, kind)?;
                self.stack.push(value);
            }
            OpCode::Write => {
                let value = self.pop()?;
                writeln!(output, "{value}")?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn invoke(&mut self, hash: SymbolHash, argc: usize) -> Result<()> {
        let module = self.module;
        let function = self
            .functions
            .get(&hash)
            .and_then(|&index| module.functions.get(index))
            .ok_or(RuntimeError::UnknownFunction(hash))?;

        if argc != function.arity as usize {
            return Err(corrupt(format!(
                "`{}` takes {} arguments but was called with {argc}",
                function.name, function.arity
            )));
        }
        if self.frames.len() >= MAX_FRAMES {
            return Err(RuntimeError::StackOverflow {
                depth: self.frames.len(),
                line: self.line,
            });
        }
        let split = self
            .stack
            .len()
            .checked_sub(argc)
            .ok_or(RuntimeError::StackUnderflow)?;
        let args = self.stack.split_off(split);
        if function.has_receiver && args.first().is_some_and(Value::is_null) {
            return Err(RuntimeError::NullReference { line: self.line });
        }
        if args.len() > function.locals.len() {
            return Err(corrupt(format!("`{}` has fewer slots than parameters", function.name)));
        }

        let mut locals = defaults(&function.locals);
        for (slot, arg) in locals.iter_mut().zip(args) {
            *slot = arg;
        }
        trace!(function = %function.name, depth = self.frames.len() + 1, "call");
        self.frames.push(StackFrame {
            function,
            ip: 0,
            locals,
            base: self.stack.len(),
        });
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or(RuntimeError::StackUnderflow)?;
        self.stack.truncate(frame.base);
        Ok(())
    }

    fn frame_mut(&mut self) -> Result<&mut StackFrame<'m>> {
        self.frames.last_mut().ok_or(RuntimeError::StackUnderflow)
    }

    fn constant(&self, index: u16) -> Result<&'m Constant> {
        self.module
            .constants
            .get(index as usize)
            .ok_or_else(|| corrupt(format!("constant {index} out of range")))
    }

    // =========================================================================
    // Heap
    // =========================================================================

    fn allocate(&mut self, object: HeapObject) -> Value {
        Value::Ref(self.heap.alloc(object))
    }

    /// Default-filled storage for a new array of `size` elements.
    fn array_items(&self, element: ValueKind, size: i32) -> Result<Vec<Value>> {
        let too_large = || RuntimeError::ArrayTooLarge {
            size,
            line: self.line,
        };
        let len = size as usize;
        if len > MAX_ARRAY_LEN {
            return Err(too_large());
        }
        let mut items = Vec::new();
        items.try_reserve_exact(len).map_err(|_| too_large())?;
        items.resize(len, Value::default_for(element));
        Ok(items)
    }

    fn fields(&mut self, handle: Handle) -> Result<&mut Vec<Value>> {
        match self.heap.get_mut(handle) {
            Some(HeapObject::Instance { fields, .. }) => Ok(fields),
            Some(HeapObject::Array { .. }) => Err(corrupt("array used as an object".to_string())),
            None => Err(dangling(handle)),
        }
    }

    fn items(&mut self, handle: Handle) -> Result<&mut Vec<Value>> {
        match self.heap.get_mut(handle) {
            Some(HeapObject::Array { items, .. }) => Ok(items),
            Some(HeapObject::Instance { .. }) => {
                Err(corrupt("object used as an array".to_string()))
            }
            None => Err(dangling(handle)),
        }
    }

    /// Bounds-checked slot for `array[index]`.
    fn element(&mut self, array: Handle, index: i32) -> Result<usize> {
        let line = self.line;
        let len = self.items(array)?.len();
        usize::try_from(index)
            .ok()
            .filter(|&slot| slot < len)
            .ok_or(RuntimeError::IndexOutOfBounds { index, len, line })
    }

    // =========================================================================
    // Operand stack
    // =========================================================================

    fn pop(&mut self) -> Result<Value> {
        let floor = self.frames.last().map_or(0, |frame| frame.base);
        if self.stack.len() <= floor {
            return Err(RuntimeError::StackUnderflow);
        }
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop_int(&mut self) -> Result<i32> {
        let value = self.pop()?;
        value.as_int().ok_or_else(|| mismatch("int", &value))
    }

    fn pop_double(&mut self) -> Result<f64> {
        let value = self.pop()?;
        value.as_double().ok_or_else(|| mismatch("double", &value))
    }

    fn pop_char(&mut self) -> Result<char> {
        let value = self.pop()?;
        value.as_char().ok_or_else(|| mismatch("char", &value))
    }

    fn pop_bool(&mut self) -> Result<bool> {
        let value = self.pop()?;
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }

    /// Pop an object or array handle; null is a runtime error.
    fn pop_object(&mut self) -> Result<Handle> {
        match self.pop()? {
            Value::Ref(handle) => Ok(handle),
            Value::Null => Err(RuntimeError::NullReference { line: self.line }),
            other => Err(mismatch("reference", &other)),
        }
    }

    fn int_op(&mut self, op: impl FnOnce(i32, i32) -> Result<i32>) -> Result<()> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        self.stack.push(Value::Int(op(a, b)?));
        Ok(())
    }

    fn double_op(&mut self, op: impl FnOnce(f64, f64) -> f64) -> Result<()> {
        let b = self.pop_double()?;
        let a = self.pop_double()?;
        self.stack.push(Value::Double(op(a, b)));
        Ok(())
    }

    fn relational(&mut self, test: fn(Ordering) -> bool) -> Result<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = match (a.compare(&b), &a, &b) {
            (Some(ordering), _, _) => test(ordering),
            // NaN is unordered: every relational test fails.
            (None, Value::Double(_), Value::Double(_)) => false,
            _ => {
                return Err(corrupt(format!(
                    "cannot order {} and {}",
                    a.type_name(),
                    b.type_name()
                )));
            }
        };
        self.stack.push(Value::Bool(result));
        Ok(())
    }
}

// =============================================================================
// Operands
// =============================================================================

fn operand_u8(function: &Function, offset: usize) -> Result<u8> {
    let operand = function.chunk.read_byte(offset);
    operand.ok_or_else(|| truncated(function))
}

fn operand_u16(function: &Function, offset: usize) -> Result<u16> {
    let operand = function.chunk.read_u16(offset);
    operand.ok_or_else(|| truncated(function))
}

fn jump_target(function: &Function, offset: usize) -> Result<usize> {
    let target = function.chunk.read_u32(offset);
    let target = target.ok_or_else(|| truncated(function))? as usize;
    if target > function.chunk.len() {
        return Err(corrupt(format!("jump to {target} leaves `{}`", function.name)));
    }
    Ok(target)
}

fn value_kind(byte: u8) -> Result<ValueKind> {
    ValueKind::from_u8(byte).ok_or_else(|| corrupt(format!("unknown value kind {byte}")))
}

fn corrupt(message: String) -> RuntimeError {
    RuntimeError::CorruptModule(message)
}

fn truncated(function: &Function) -> RuntimeError {
    corrupt(format!("truncated operand in `{}`", function.name))
}

fn bad_slot(what: &str, slot: usize) -> RuntimeError {
    corrupt(format!("{what} slot {slot} does not exist"))
}

fn dangling(handle: Handle) -> RuntimeError {
    corrupt(format!("dangling handle {handle}"))
}

fn mismatch(expected: &str, found: &Value) -> RuntimeError {
    corrupt(format!(
        "expected {expected} on the stack, found {}",
        found.type_name()
    ))
}

fn defaults(kinds: &[ValueKind]) -> Vec<Value> {
    kinds.iter().map(|&kind| Value::default_for(kind)).collect()
}

// =============================================================================
// Input
// =============================================================================

fn kind_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int => "int",
        ValueKind::Double => "double",
        ValueKind::Char => "char",
        ValueKind::Bool => "bool",
        ValueKind::String => "string",
        ValueKind::Reference => "reference",
    }
}

/// Parse the next whitespace-separated token as a value of `kind`.
fn read_value(input: &mut impl BufRead, kind: ValueKind) -> Result<Value> {
    let expected = kind_name(kind);
    let token = next_token(input)?.ok_or_else(|| RuntimeError::EndOfInput {
        expected: expected.to_string(),
    })?;
    let invalid = || RuntimeError::InvalidInput {
        input: token.clone(),
        expected: expected.to_string(),
    };

    match kind {
        ValueKind::Int => token.parse().map(Value::Int).map_err(|_| invalid()),
        ValueKind::Double => token.parse().map(Value::Double).map_err(|_| invalid()),
        ValueKind::Char => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(invalid()),
            }
        }
        ValueKind::Bool => match token.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        ValueKind::String => Ok(Value::Str(token.into())),
        ValueKind::Reference => Err(corrupt("cannot read into a reference".to_string())),
    }
}

/// The next run of non-whitespace bytes, or `None` at end of input.
fn next_token(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut token = Vec::new();
    loop {
        let buffer = input.fill_buf()?;
        if buffer.is_empty() {
            break;
        }
        let skip = if token.is_empty() {
            buffer
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count()
        } else {
            0
        };
        let rest = &buffer[skip..];
        let len = rest.iter().take_while(|b| !b.is_ascii_whitespace()).count();
        token.extend_from_slice(&rest[..len]);
        let done = len < rest.len();
        input.consume(skip + len);
        if done {
            break;
        }
    }
    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&token).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use mica_compiler::{BytecodeBackend, analyze, generate};
    use mica_parser::Parser;

    fn compile(source: &str) -> BytecodeModule {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).expect("parse");
        let analysis = analyze(&program);
        assert!(analysis.is_ok(), "{}", analysis.diagnostics);
        generate(&program, &analysis, BytecodeBackend::default(), None).expect("generate")
    }

    fn run_with_input(source: &str, input: &str) -> (String, Result<()>) {
        let module = compile(source);
        let mut out = Vec::new();
        let result = Vm::new(&module).run(input.as_bytes(), &mut out);
        (String::from_utf8(out).expect("utf-8"), result)
    }

    fn run(source: &str) -> (String, Result<()>) {
        run_with_input(source, "")
    }

    fn output(source: &str) -> String {
        let (out, result) = run(source);
        result.expect("program runs");
        out
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let out = output(
            "void main() { int x; x = 2147483647; write(x + 1); write(7 / 2); write(-7 % 3); }",
        );
        assert_eq!(out, "-2147483648\n3\n-1\n");
    }

    #[test]
    fn doubles_and_widening() {
        let out = output("void main() { double d; d = 1; write(d / 4); write(3 * 0.5); }");
        assert_eq!(out, "0.25\n1.5\n");
    }

    #[test]
    fn double_division_by_zero_is_infinite() {
        assert_eq!(output("void main() { write(1.0 / 0.0); }"), "inf\n");
    }

    #[test]
    fn integer_division_by_zero_fails() {
        let (_, result) = run("void main() { int z; z = 0;\n write(5 / z); }");
        assert_eq!(result, Err(RuntimeError::DivisionByZero { line: 2 }));
    }

    #[test]
    fn arrays_are_bounds_checked() {
        let (out, result) = run(
            "void main() { int[] a; a = new int[3]; a[1] = 4; write(a[1] + len(a));\n a[3] = 1; }",
        );
        assert_eq!(out, "7\n");
        assert_eq!(
            result,
            Err(RuntimeError::IndexOutOfBounds {
                index: 3,
                len: 3,
                line: 2
            })
        );
    }

    #[test]
    fn negative_array_size_fails() {
        let (_, result) = run("void main() { int[] a; a = new int[0 - 2]; }");
        assert!(matches!(
            result,
            Err(RuntimeError::NegativeArraySize { size: -2, .. })
        ));
    }

    #[test]
    fn null_field_access_fails() {
        let (_, result) = run("class P { int x; } void main() { P p; write(p.x); }");
        assert!(matches!(result, Err(RuntimeError::NullReference { .. })));
    }

    #[test]
    fn objects_keep_their_fields() {
        let out = output(
            "class Counter { int n; void bump() { n = n + 1; } int get() { return n; } }
             void main() { Counter c; c = new Counter(); c.bump(); c.bump(); write(c.get()); }",
        );
        assert_eq!(out, "2\n");
    }

    #[test]
    fn method_call_on_null_receiver_fails() {
        let (_, result) = run(
            "class Counter { int n; int get() { return n; } } \
             void main() { Counter c; write(c.get()); }",
        );
        assert!(matches!(result, Err(RuntimeError::NullReference { .. })));
    }

    #[test]
    fn recursion() {
        let out = output(
            "int fact(int n) { if (n <= 1) { return 1; } return n * fact(n - 1); }
             void main() { write(fact(10)); }",
        );
        assert_eq!(out, "3628800\n");
    }

    #[test]
    fn unbounded_recursion_overflows() {
        let (_, result) =
            run("int down(int n) { return down(n + 1); } void main() { write(down(0)); }");
        assert!(matches!(
            result,
            Err(RuntimeError::StackOverflow { depth: MAX_FRAMES, .. })
        ));
    }

    #[test]
    fn read_parses_tokens_by_type() {
        let (out, result) = run_with_input(
            "void main() { int i; double d; char c; bool b; string s;
               read(i); read(d); read(c); read(b); read(s);
               write(i + 1); write(d); write(c); write(b); write(s); }",
            "  41\n2.5 x\ttrue  hello\n",
        );
        result.expect("program runs");
        assert_eq!(out, "42\n2.5\nx\ntrue\nhello\n");
    }

    #[test]
    fn read_reports_bad_and_missing_input() {
        let source = "void main() { int i; read(i); }";
        let (_, result) = run_with_input(source, "abc");
        assert_eq!(
            result,
            Err(RuntimeError::InvalidInput {
                input: "abc".to_string(),
                expected: "int".to_string()
            })
        );
        let (_, result) = run_with_input(source, "   \n");
        assert_eq!(
            result,
            Err(RuntimeError::EndOfInput {
                expected: "int".to_string()
            })
        );
    }

    #[test]
    fn chars_convert_through_builtins() {
        assert_eq!(
            output("void main() { write(ord('A')); write(chr(98)); }"),
            "65\nb\n"
        );
    }

    #[test]
    fn uninitialized_string_prints_null() {
        assert_eq!(output("void main() { string s; write(s); }"), "null\n");
    }

    #[test]
    fn missing_entry_point() {
        let module = compile("int helper() { return 1; }");
        let result = Vm::new(&module).run(io::empty(), io::sink());
        assert_eq!(result, Err(RuntimeError::NoEntryPoint));
    }

    #[test]
    fn every_allocation_stays_on_the_heap() {
        let module = compile(
            "void main() { int i; int[] keep; keep = new int[1];
               i = 0; while (i < 50) { int[] tmp; tmp = new int[8]; i = i + 1; }
               write(len(keep)); }",
        );
        let mut out = Vec::new();
        let mut vm = Vm::new(&module);
        vm.run(io::empty(), &mut out).expect("program runs");
        assert_eq!(out, b"1\n");
        assert_eq!(vm.heap().len(), 51);
    }

    #[test]
    fn oversized_arrays_are_refused() {
        let module = compile("void main() {\n int[] a;\n a = new int[2147483647];\n}");
        let result = Vm::new(&module).run(io::empty(), io::sink());
        assert_eq!(
            result,
            Err(RuntimeError::ArrayTooLarge {
                size: i32::MAX,
                line: 3
            })
        );
    }

    #[test]
    fn tokens_span_buffer_refills() {
        let mut input = io::BufReader::with_capacity(2, "ab cdef".as_bytes());
        assert_eq!(next_token(&mut input).unwrap().as_deref(), Some("ab"));
        assert_eq!(next_token(&mut input).unwrap().as_deref(), Some("cdef"));
        assert_eq!(next_token(&mut input).unwrap(), None);
    }
}
