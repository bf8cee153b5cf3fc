//! Statement lowering.

use mica_core::Type;
use mica_parser::ast::*;

use super::{CodeGenerator, Result};
use crate::emit::{Emitter, Instruction};

impl<E: Emitter> CodeGenerator<'_, E> {
    pub(super) fn stmt(&mut self, stmt: &Stmt<'_>) -> Result<()> {
        self.line(stmt.span());
        match *stmt {
            Stmt::VarDecl(decl) => self.local_decl(&decl),
            Stmt::Assign(assign) => self.assign(&assign),
            Stmt::Call(call) => {
                let result = self.expr(call.call)?;
                if result != Type::Void {
                    self.emit(Instruction::Pop)?;
                }
                Ok(())
            }
            Stmt::If(if_stmt) => self.if_stmt(if_stmt),
            Stmt::While(while_stmt) => self.while_stmt(while_stmt),
            Stmt::For(for_stmt) => self.for_stmt(for_stmt),
            Stmt::Switch(switch) => self.switch(switch),
            Stmt::Break(span) => {
                let target = self.breaks.target(span)?;
                self.emit(Instruction::Jump(target))
            }
            Stmt::Return(ret) => match ret.value {
                Some(value) => {
                    let return_type = self.return_type.clone();
                    self.coerced(value, &return_type)?;
                    self.emit(Instruction::Return)
                }
                None => self.emit(Instruction::ReturnVoid),
            },
            Stmt::Read(read) => self.store(read.target, |this, ty| {
                this.emit(Instruction::Read(ty.clone()))
            }),
            Stmt::Write(write) => {
                self.expr(write.value)?;
                self.emit(Instruction::Write)
            }
            Stmt::Block(block) => self.block(&block),
            Stmt::Empty(_) => Ok(()),
        }
    }

    fn block(&mut self, block: &Block<'_>) -> Result<()> {
        self.scope.push_scope();
        for stmt in block.stmts {
            self.stmt(stmt)?;
        }
        self.scope.pop_scope();
        Ok(())
    }

    /// Every declared name gets a fresh slot and an explicit initial store,
    /// so re-entering a block starts from the default again.
    fn local_decl(&mut self, decl: &LocalDecl<'_>) -> Result<()> {
        let ty = decl.ty.to_type();
        for var in decl.vars {
            match var.init {
                Some(init) => self.coerced(init, &ty)?,
                None => self.default_value(&ty)?,
            }
            let slot = self.declare_local(&ty)?;
            self.scope.declare(var.name.name, ty.clone(), slot);
            self.emit(Instruction::StoreLocal(slot))?;
        }
        Ok(())
    }

    fn assign(&mut self, assign: &AssignStmt<'_>) -> Result<()> {
        let value = assign.value;
        self.store(assign.target, |this, ty| this.coerced(value, ty))
    }

    /// ```text
    /// [cond]; JumpIfFalse else
    /// [then]; Jump end
    /// else: [else]
    /// end:
    /// ```
    fn if_stmt(&mut self, if_stmt: &IfStmt<'_>) -> Result<()> {
        let otherwise = self.new_label();
        self.expr(if_stmt.condition)?;
        self.emit(Instruction::JumpIfFalse(otherwise))?;
        self.stmt(&if_stmt.then_branch)?;

        match &if_stmt.else_branch {
            Some(else_branch) => {
                let end = self.new_label();
                self.emit(Instruction::Jump(end))?;
                self.mark(otherwise);
                self.stmt(else_branch)?;
                self.mark(end);
            }
            None => self.mark(otherwise),
        }
        Ok(())
    }

    /// ```text
    /// top: [cond]; JumpIfFalse end
    /// [body]; Jump top
    /// end:
    /// ```
    fn while_stmt(&mut self, while_stmt: &WhileStmt<'_>) -> Result<()> {
        let top = self.new_label();
        let end = self.new_label();
        self.mark(top);
        self.expr(while_stmt.condition)?;
        self.emit(Instruction::JumpIfFalse(end))?;

        self.breaks.enter(end);
        self.stmt(&while_stmt.body)?;
        self.breaks.exit();

        self.emit(Instruction::Jump(top))?;
        self.mark(end);
        Ok(())
    }

    /// ```text
    /// [init]
    /// top: [cond]; JumpIfFalse end
    /// [body]; [update]; Jump top
    /// end:
    /// ```
    fn for_stmt(&mut self, for_stmt: &ForStmt<'_>) -> Result<()> {
        self.scope.push_scope();
        match &for_stmt.init {
            Some(ForInit::VarDecl(decl)) => self.local_decl(decl)?,
            Some(ForInit::Assign(assign)) => self.assign(assign)?,
            None => {}
        }

        let top = self.new_label();
        let end = self.new_label();
        self.mark(top);
        if let Some(condition) = for_stmt.condition {
            self.expr(condition)?;
            self.emit(Instruction::JumpIfFalse(end))?;
        }

        self.breaks.enter(end);
        self.stmt(&for_stmt.body)?;
        self.breaks.exit();

        if let Some(update) = &for_stmt.update {
            self.stmt(update)?;
        }
        self.emit(Instruction::Jump(top))?;
        self.mark(end);
        self.scope.pop_scope();
        Ok(())
    }

    /// Compare the selector against each label in source order; sections
    /// fall through into the next one.
    ///
    /// ```text
    /// [selector]; StoreLocal tmp
    /// LoadLocal tmp; push label_i; Equal; JumpIfTrue case_i    (per label)
    /// Jump default | end
    /// case_0: [body_0]
    /// case_1: [body_1]
    /// ...
    /// end:
    /// ```
    fn switch(&mut self, switch: &SwitchStmt<'_>) -> Result<()> {
        let selector = self.expr(switch.selector)?;
        let temp = self.declare_local(&selector)?;
        self.emit(Instruction::StoreLocal(temp))?;

        let end = self.new_label();
        let mut sections = Vec::with_capacity(switch.cases.len());
        let mut default = None;
        for case in switch.cases {
            let section = self.new_label();
            sections.push(section);
            match &case.label {
                Some(label) => {
                    self.line(label.span);
                    self.emit(Instruction::LoadLocal(temp))?;
                    self.literal(&label.value)?;
                    self.emit(Instruction::Equal)?;
                    self.emit(Instruction::JumpIfTrue(section))?;
                }
                None => default = Some(section),
            }
        }
        self.emit(Instruction::Jump(default.unwrap_or(end)))?;

        self.breaks.enter(end);
        self.scope.push_scope();
        for (case, section) in switch.cases.iter().zip(sections) {
            self.mark(section);
            for stmt in case.body {
                self.stmt(stmt)?;
            }
        }
        self.scope.pop_scope();
        self.breaks.exit();

        self.mark(end);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{compile, main_ops};
    use crate::bytecode::OpCode::*;

    #[test]
    fn if_without_else() {
        let ops = main_ops("if (true) write(1);");
        assert_eq!(ops, vec![PushTrue, JumpIfFalse, PushOne, Write, ReturnVoid]);
    }

    #[test]
    fn if_with_else_jumps_over_else_branch() {
        let ops = main_ops("if (false) write(1); else write(0);");
        assert_eq!(
            ops,
            vec![
                PushFalse,
                JumpIfFalse,
                PushOne,
                Write,
                Jump,
                PushZero,
                Write,
                ReturnVoid,
            ]
        );
    }

    #[test]
    fn while_loops_back_to_condition() {
        let module = compile("void main() { int i; while (i < 3) i = i + 1; }");
        let chunk = &module.function_named("main").unwrap().chunk;
        chunk.assert_opcodes(&[
            PushZero, SetLocal, GetLocal, Constant, Less, JumpIfFalse, GetLocal, PushOne, AddI32,
            SetLocal, Jump, ReturnVoid,
        ]);
        // `Jump` goes back to the condition at offset 4; `JumpIfFalse` exits to the return.
        let instructions = chunk.instructions();
        let (jump_at, _) = instructions[10];
        let (exit_at, _) = instructions[11];
        let (branch_at, _) = instructions[5];
        assert_eq!(chunk.read_u32(jump_at + 1), Some(4));
        assert_eq!(chunk.read_u32(branch_at + 1), Some(exit_at as u32));
    }

    #[test]
    fn for_runs_update_after_body() {
        let ops = main_ops("for (int i = 0; i < 3; i = i + 1) { write(i); }");
        assert_eq!(
            ops,
            vec![
                PushZero, SetLocal, GetLocal, Constant, Less, JumpIfFalse, GetLocal, Write,
                GetLocal, PushOne, AddI32, SetLocal, Jump, ReturnVoid,
            ]
        );
    }

    #[test]
    fn break_jumps_to_loop_end() {
        let module = compile("void main() { while (true) { break; } }");
        let chunk = &module.function_named("main").unwrap().chunk;
        chunk.assert_opcodes(&[PushTrue, JumpIfFalse, Jump, Jump, ReturnVoid]);
        let instructions = chunk.instructions();
        let end = instructions[4].0 as u32;
        assert_eq!(chunk.read_u32(instructions[1].0 + 1), Some(end));
        assert_eq!(chunk.read_u32(instructions[2].0 + 1), Some(end));
    }

    #[test]
    fn switch_is_a_compare_chain() {
        let ops = main_ops(
            "int x; x = 2; \
             switch (x) { case 1: write(1); break; case 2: write(2); default: write(0); }",
        );
        // x = 2, then the selector is spilled to a temporary.
        let prologue = [PushZero, SetLocal, Constant, SetLocal, GetLocal, SetLocal];
        // One compare per case label.
        let compares = [
            GetLocal, PushOne, Equal, JumpIfTrue, GetLocal, Constant, Equal, JumpIfTrue,
        ];
        // Jump to default, then the bodies; case 2 falls through into default.
        let bodies = [
            Jump, PushOne, Write, Jump, Constant, Write, PushZero, Write, ReturnVoid,
        ];
        assert_eq!(ops, [&prologue[..], &compares[..], &bodies[..]].concat());
    }

    #[test]
    fn call_statement_discards_result() {
        let module = compile("int f() { return 1; } void g() { } void main() { f(); g(); }");
        module
            .function_named("main")
            .unwrap()
            .chunk
            .assert_opcodes(&[Call, Pop, Call, ReturnVoid]);
    }

    #[test]
    fn read_stores_into_target() {
        let module = compile("int[] a; void main() { a = new int[1]; read(a[0]); }");
        module
            .function_named("main")
            .unwrap()
            .chunk
            .assert_contains_opcodes(&[GetGlobal, PushZero, Read, SetElement]);
    }

    #[test]
    fn return_widens_value() {
        let module = compile("double half(int n) { return n; }");
        module
            .function_named("half")
            .unwrap()
            .chunk
            .assert_opcodes(&[GetLocal, I32toF64, Return]);
    }
}
