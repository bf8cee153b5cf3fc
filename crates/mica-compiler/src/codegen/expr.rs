//! Expression lowering.

use mica_core::types::{needs_widening, promoted_operand};
use mica_core::{CodeGenError, SymbolHash, Type};
use mica_parser::ast::*;

use super::{CodeGenerator, RECEIVER_SLOT, Result, unresolved};
use crate::emit::{Emitter, Instruction, Numeric};
use crate::sema::Binding;
use crate::symbols::Builtin;

/// Where a plain name lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Place {
    Local(u32),
    /// A field of the receiver.
    Field(u32),
    Global(u32),
}

impl<E: Emitter> CodeGenerator<'_, E> {
    /// Push the value of `expr` and return its type.
    pub(super) fn expr(&mut self, expr: &Expr<'_>) -> Result<Type> {
        let ty = self.type_of(expr)?;
        match expr.kind {
            ExprKind::Literal(literal) => self.literal(&literal)?,
            ExprKind::Name(ident) => match self.place(expr, ident)? {
                Place::Local(slot) => self.emit(Instruction::LoadLocal(slot))?,
                Place::Field(index) => {
                    self.emit(Instruction::LoadLocal(RECEIVER_SLOT))?;
                    self.emit(Instruction::LoadField(index))?;
                }
                Place::Global(slot) => self.emit(Instruction::LoadGlobal(slot))?,
            },
            ExprKind::Field(field) => {
                let object = self.expr(field.object)?;
                let index = self.field_index(&object, field.field)?;
                self.emit(Instruction::LoadField(index))?;
            }
            ExprKind::Index(index) => {
                self.expr(index.array)?;
                self.expr(index.index)?;
                self.emit(Instruction::LoadElement)?;
            }
            ExprKind::Call(call) => self.call(expr, call)?,
            ExprKind::Unary(unary) => {
                let operand = self.expr(unary.operand)?;
                match unary.op {
                    UnaryOp::Neg => self.emit(Instruction::Neg(Numeric::of(&operand)))?,
                    UnaryOp::Not => self.emit(Instruction::Not)?,
                }
            }
            ExprKind::Binary(binary) => self.binary(binary, &ty)?,
            ExprKind::Cast(cast) => {
                let source = self.expr(cast.operand)?;
                match (&ty, &source) {
                    (Type::Double, Type::Int) => self.emit(Instruction::IntToDouble)?,
                    (Type::Int, Type::Double) => self.emit(Instruction::DoubleToInt)?,
                    _ => {}
                }
            }
            ExprKind::NewObject(class) => {
                self.emit(Instruction::New(SymbolHash::from_class(class.name)))?;
            }
            ExprKind::NewArray(new_array) => {
                self.coerced(new_array.length, &Type::Int)?;
                let element = ty
                    .element()
                    .cloned()
                    .ok_or(CodeGenError::MissingType { span: expr.span })?;
                self.emit(Instruction::NewArray(element))?;
            }
        }
        Ok(ty)
    }

    /// Push `expr` converted to `target`.
    pub(super) fn coerced(&mut self, expr: &Expr<'_>, target: &Type) -> Result<()> {
        let ty = self.expr(expr)?;
        if needs_widening(target, &ty) {
            self.emit(Instruction::IntToDouble)?;
        }
        Ok(())
    }

    pub(super) fn literal(&mut self, literal: &Literal<'_>) -> Result<()> {
        let instruction = match *literal {
            Literal::Int(v) => Instruction::PushInt(v),
            Literal::Double(v) => Instruction::PushDouble(v),
            Literal::Char(c) => Instruction::PushChar(c),
            Literal::Bool(b) => Instruction::PushBool(b),
            Literal::String(s) => Instruction::PushString(s.to_string()),
            Literal::Null => Instruction::PushNull,
        };
        self.emit(instruction)
    }

    /// Push the value a declaration without initializer starts with.
    pub(super) fn default_value(&mut self, ty: &Type) -> Result<()> {
        let instruction = match ty {
            Type::Int => Instruction::PushInt(0),
            Type::Double => Instruction::PushDouble(0.0),
            Type::Char => Instruction::PushChar('\0'),
            Type::Bool => Instruction::PushBool(false),
            _ => Instruction::PushNull,
        };
        self.emit(instruction)
    }

    // =========================================
    // Storage
    // =========================================

    pub(super) fn place(&self, expr: &Expr<'_>, ident: Ident<'_>) -> Result<Place> {
        let found = match self.decorations.binding(expr.id) {
            Some(Binding::Local) => self.scope.lookup(ident.name).map(|v| Place::Local(v.slot)),
            Some(Binding::Field) => self
                .class
                .and_then(|class| class.field_index(ident.name))
                .map(|index| Place::Field(index as u32)),
            Some(Binding::Global) => self.globals.get(ident.name).copied().map(Place::Global),
            _ => None,
        };
        found.ok_or_else(|| unresolved(ident.name, ident.span))
    }

    pub(super) fn field_index(&self, object: &Type, field: Ident<'_>) -> Result<u32> {
        let class = self.class_of(object, field.span)?;
        class
            .field_index(field.name)
            .map(|index| index as u32)
            .ok_or_else(|| unresolved(field.name, field.span))
    }

    /// Store into a designator. `value` pushes the value once any object
    /// and index have been pushed; it receives the target's type.
    pub(super) fn store(
        &mut self,
        target: &Expr<'_>,
        value: impl FnOnce(&mut Self, &Type) -> Result<()>,
    ) -> Result<()> {
        let ty = self.type_of(target)?;
        match target.kind {
            ExprKind::Name(ident) => match self.place(target, ident)? {
                Place::Local(slot) => {
                    value(self, &ty)?;
                    self.emit(Instruction::StoreLocal(slot))
                }
                Place::Field(index) => {
                    self.emit(Instruction::LoadLocal(RECEIVER_SLOT))?;
                    value(self, &ty)?;
                    self.emit(Instruction::StoreField(index))
                }
                Place::Global(slot) => {
                    value(self, &ty)?;
                    self.emit(Instruction::StoreGlobal(slot))
                }
            },
            ExprKind::Field(field) => {
                let object = self.expr(field.object)?;
                let index = self.field_index(&object, field.field)?;
                value(self, &ty)?;
                self.emit(Instruction::StoreField(index))
            }
            ExprKind::Index(index) => {
                self.expr(index.array)?;
                self.expr(index.index)?;
                value(self, &ty)?;
                self.emit(Instruction::StoreElement)
            }
            _ => Err(CodeGenError::InvalidTarget {
                name: ty.to_string(),
                span: target.span,
            }),
        }
    }

    // =========================================
    // Operators
    // =========================================

    fn binary(&mut self, binary: &BinaryExpr<'_>, result: &Type) -> Result<()> {
        let op = binary.op;
        match op.class() {
            OperatorClass::Logical => self.short_circuit(binary),
            OperatorClass::Arithmetic => {
                self.coerced(binary.lhs, result)?;
                self.coerced(binary.rhs, result)?;
                let width = Numeric::of(result);
                self.emit(match op {
                    BinaryOp::Add => Instruction::Add(width),
                    BinaryOp::Sub => Instruction::Sub(width),
                    BinaryOp::Mul => Instruction::Mul(width),
                    BinaryOp::Div => Instruction::Div(width),
                    _ => Instruction::Rem(width),
                })
            }
            OperatorClass::Relational | OperatorClass::Equality => {
                let lhs = self.type_of(binary.lhs)?;
                let rhs = self.type_of(binary.rhs)?;
                match promoted_operand(&lhs, &rhs) {
                    Some(common) => {
                        self.coerced(binary.lhs, &common)?;
                        self.coerced(binary.rhs, &common)?;
                    }
                    None => {
                        self.expr(binary.lhs)?;
                        self.expr(binary.rhs)?;
                    }
                }
                self.emit(match op {
                    BinaryOp::Equal => Instruction::Equal,
                    BinaryOp::NotEqual => Instruction::NotEqual,
                    BinaryOp::Less => Instruction::Less,
                    BinaryOp::LessEqual => Instruction::LessEqual,
                    BinaryOp::Greater => Instruction::Greater,
                    _ => Instruction::GreaterEqual,
                })
            }
        }
    }

    /// `a && b` and `a || b` evaluate `b` only when `a` does not decide.
    ///
    /// ```text
    /// [a]; JumpIfFalse/JumpIfTrue short; [b]; Jump end
    /// short: push false/true
    /// end:
    /// ```
    fn short_circuit(&mut self, binary: &BinaryExpr<'_>) -> Result<()> {
        let is_and = binary.op == BinaryOp::And;
        let short = self.new_label();
        let end = self.new_label();

        self.expr(binary.lhs)?;
        self.emit(if is_and {
            Instruction::JumpIfFalse(short)
        } else {
            Instruction::JumpIfTrue(short)
        })?;
        self.expr(binary.rhs)?;
        self.emit(Instruction::Jump(end))?;
        self.mark(short);
        self.emit(Instruction::PushBool(!is_and))?;
        self.mark(end);
        Ok(())
    }

    // =========================================
    // Calls
    // =========================================

    fn call(&mut self, expr: &Expr<'_>, call: &CallExpr<'_>) -> Result<()> {
        let name = call.name;
        let binding = self
            .decorations
            .binding(expr.id)
            .cloned()
            .ok_or_else(|| unresolved(name.name, name.span))?;

        let owner = match binding {
            Binding::Builtin(builtin) => {
                let arg = call
                    .args
                    .first()
                    .ok_or_else(|| unresolved(name.name, name.span))?;
                self.expr(arg)?;
                return self.emit(match builtin {
                    Builtin::Len => Instruction::ArrayLength,
                    Builtin::Ord => Instruction::CharToInt,
                    Builtin::Chr => Instruction::IntToChar,
                });
            }
            Binding::Method { owner } => owner,
            _ => {
                return Err(CodeGenError::InvalidTarget {
                    name: name.name.to_string(),
                    span: name.span,
                });
            }
        };

        let symbols = self.symbols;
        let method = match &owner {
            Some(class) => symbols.class(class).and_then(|c| c.method(name.name)),
            None => symbols.method(name.name),
        }
        .ok_or_else(|| unresolved(name.name, name.span))?;

        let mut argc = call.args.len() as u32;
        if owner.is_some() {
            match call.receiver {
                Some(receiver) => {
                    self.expr(receiver)?;
                }
                None => self.emit(Instruction::LoadLocal(RECEIVER_SLOT))?,
            }
            argc += 1;
        }
        for (arg, param) in call.args.iter().zip(method.param_types()) {
            self.coerced(arg, param)?;
        }
        self.emit(Instruction::Call {
            method: method.hash(),
            argc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{compile, main_ops};
    use crate::bytecode::OpCode::{self, *};

    #[test]
    fn mixed_arithmetic_widens_the_int_operand() {
        let ops = main_ops("double d; d = 1.5 + 2;");
        assert_eq!(
            ops,
            vec![
                Constant, SetLocal, Constant, Constant, I32toF64, AddF64, SetLocal, ReturnVoid,
            ]
        );
    }

    #[test]
    fn assignment_widens_int_into_double() {
        let ops = main_ops("double d; int i; i = 3; d = i;");
        assert_eq!(&ops[6..], &[GetLocal, I32toF64, SetLocal, ReturnVoid]);
    }

    #[test]
    fn comparison_widens_to_common_type() {
        let ops = main_ops("bool b; b = 2 < 2.5;");
        assert_eq!(
            &ops[2..],
            &[Constant, I32toF64, Constant, Less, SetLocal, ReturnVoid]
        );
    }

    #[test]
    fn and_short_circuits() {
        let ops = main_ops("bool b; b = false && true;");
        assert_eq!(
            &ops[2..],
            &[
                PushFalse,
                JumpIfFalse,
                PushTrue,
                Jump,
                PushFalse,
                SetLocal,
                ReturnVoid,
            ]
        );
    }

    #[test]
    fn or_short_circuits() {
        let ops = main_ops("bool b; b = true || false;");
        assert_eq!(
            &ops[2..],
            &[
                PushTrue, JumpIfTrue, PushFalse, Jump, PushTrue, SetLocal, ReturnVoid,
            ]
        );
    }

    #[test]
    fn casts_convert_numbers() {
        let ops = main_ops("int i; i = (int) 2.7;");
        assert_eq!(&ops[2..], &[Constant, F64toI32, SetLocal, ReturnVoid]);
    }

    #[test]
    fn builtins_lower_to_instructions() {
        let ops =
            main_ops("int[] a; int n; char c; a = new int[3]; n = len(a); c = chr(ord('a') + 1);");
        let expected: &[OpCode] = &[ArrayLength, CharToI32, PushOne, AddI32, I32toChar];
        for op in expected {
            assert!(ops.contains(op), "missing {op:?} in {ops:?}");
        }
        assert!(!ops.contains(&Call));
    }

    #[test]
    fn field_and_element_access() {
        let module = compile(
            "class Box { int[] items; } \
             void main() { Box b; b = new Box(); b.items = new int[2]; \
             b.items[1] = 7; write(b.items[1]); }",
        );
        let main = module.function_named("main").unwrap();
        main.chunk
            .assert_contains_opcodes(&[New, NewArray, SetField, SetElement, GetElement, Write]);
    }

    #[test]
    fn calls_push_receiver_then_arguments() {
        let module = compile(
            "class Counter { int n; void add(double d) { n = n + (int) d; } } \
             void main() { Counter c; c = new Counter(); c.add(1); }",
        );
        let main = module.function_named("main").unwrap();
        let ops = main.chunk.opcodes();
        let call = ops.iter().position(|op| *op == Call).unwrap();
        assert_eq!(&ops[call - 3..=call], &[GetLocal, PushOne, I32toF64, Call]);
    }

    #[test]
    fn implicit_receiver_for_sibling_methods() {
        let module =
            compile("class A { int one() { return 1; } int two() { return one() + one(); } }");
        let two = module.function_named("A.two").unwrap();
        two.chunk
            .assert_opcodes(&[GetLocal, Call, GetLocal, Call, AddI32, Return]);
    }
}
