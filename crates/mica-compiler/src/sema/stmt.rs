//! Statement checking.

use std::fmt;

use mica_core::{DiagnosticKind, Type};
use mica_parser::ast::*;
use rustc_hash::FxHashSet;

use super::expr::literal_type;
use super::{Analyzer, Breakable};

/// Hashable identity of a case label value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LabelKey {
    Int(i32),
    Char(char),
    Bool(bool),
    Double(u64),
    String(String),
    Null,
}

impl From<&Literal<'_>> for LabelKey {
    fn from(literal: &Literal<'_>) -> Self {
        match *literal {
            Literal::Int(v) => LabelKey::Int(v),
            Literal::Char(c) => LabelKey::Char(c),
            Literal::Bool(b) => LabelKey::Bool(b),
            Literal::Double(d) => LabelKey::Double(d.to_bits()),
            Literal::String(s) => LabelKey::String(s.to_string()),
            Literal::Null => LabelKey::Null,
        }
    }
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKey::Int(v) => write!(f, "{v}"),
            LabelKey::Char(c) => write!(f, "{c:?}"),
            LabelKey::Bool(b) => write!(f, "{b}"),
            LabelKey::Double(bits) => write!(f, "{}", f64::from_bits(*bits)),
            LabelKey::String(s) => write!(f, "{s:?}"),
            LabelKey::Null => write!(f, "null"),
        }
    }
}

impl Analyzer {
    pub(super) fn check_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::VarDecl(decl) => self.check_local_decl(decl),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Call(call) => {
                self.check_expr(call.call);
            }
            Stmt::If(if_stmt) => {
                self.check_condition(if_stmt.condition);
                self.check_stmt(&if_stmt.then_branch);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.check_stmt(else_branch);
                }
            }
            Stmt::While(while_stmt) => {
                self.check_condition(while_stmt.condition);
                self.breakables.enter(Breakable::Loop);
                self.check_stmt(&while_stmt.body);
                self.breakables.exit();
            }
            Stmt::For(for_stmt) => self.check_for(for_stmt),
            Stmt::Switch(switch) => self.check_switch(switch),
            Stmt::Break(span) => {
                if !self.breakables.can_break() {
                    self.report(
                        DiagnosticKind::IllegalBreak,
                        *span,
                        "break outside loop or switch",
                    );
                }
            }
            Stmt::Return(ret) => self.check_return(ret),
            Stmt::Read(read) => {
                let target = self.check_expr(read.target);
                if !target.is_readable() {
                    self.mismatch(read.target.span, format!("cannot read into {target}"));
                }
            }
            Stmt::Write(write) => {
                let value = self.check_expr(write.value);
                if !value.is_printable() {
                    self.mismatch(write.value.span, format!("cannot write {value}"));
                }
            }
            Stmt::Block(block) => self.check_block(block),
            Stmt::Empty(_) => {}
        }
    }

    pub(super) fn check_block(&mut self, block: &Block<'_>) {
        self.scope_mut().open_scope();
        for stmt in block.stmts {
            self.check_stmt(stmt);
        }
        self.scope_mut().close_scope();
    }

    fn check_local_decl(&mut self, decl: &LocalDecl<'_>) {
        let ty = self.resolve_type(&decl.ty);
        for var in decl.vars {
            if let Some(init) = var.init {
                let value = self.check_expr(init);
                self.check_assignable(&ty, &value, init.span);
            }
            let declared = self
                .scope_mut()
                .insert_variable(var.name.name, ty.clone(), var.name.span);
            if let Err(err) = declared {
                self.duplicate(err, var.name.span);
            }
        }
    }

    fn check_assign(&mut self, assign: &AssignStmt<'_>) {
        let target = self.check_expr(assign.target);
        let value = self.check_expr(assign.value);
        self.check_assignable(&target, &value, assign.value.span);
    }

    fn check_condition(&mut self, condition: &Expr<'_>) {
        let ty = self.check_expr(condition);
        if !matches!(ty, Type::Bool | Type::Unknown) {
            self.mismatch(
                condition.span,
                format!("condition must be bool, found {ty}"),
            );
        }
    }

    fn check_for(&mut self, for_stmt: &ForStmt<'_>) {
        self.scope_mut().open_scope();
        match &for_stmt.init {
            Some(ForInit::VarDecl(decl)) => self.check_local_decl(decl),
            Some(ForInit::Assign(assign)) => self.check_assign(assign),
            None => {}
        }
        if let Some(condition) = for_stmt.condition {
            self.check_condition(condition);
        }
        self.breakables.enter(Breakable::Loop);
        self.check_stmt(&for_stmt.body);
        self.breakables.exit();
        if let Some(update) = &for_stmt.update {
            self.check_stmt(update);
        }
        self.scope_mut().close_scope();
    }

    fn check_switch(&mut self, switch: &SwitchStmt<'_>) {
        let selector = self.check_expr(switch.selector);
        if !selector.is_switchable() {
            self.mismatch(
                switch.selector.span,
                format!("switch selector must be int or char, found {selector}"),
            );
        }

        let mut seen = FxHashSet::default();
        let mut has_default = false;
        for case in switch.cases {
            let Some(label) = &case.label else {
                if has_default {
                    self.report(
                        DiagnosticKind::DuplicateCaseLabel,
                        case.span,
                        "switch has more than one default label",
                    );
                }
                has_default = true;
                continue;
            };

            let label_type = literal_type(&label.value);
            if matches!(selector, Type::Int | Type::Char) && label_type != selector {
                self.mismatch(
                    label.span,
                    format!(
                        "case label of type {label_type} does not match selector type {selector}"
                    ),
                );
                continue;
            }
            let key = LabelKey::from(&label.value);
            if seen.contains(&key) {
                self.report(
                    DiagnosticKind::DuplicateCaseLabel,
                    label.span,
                    format!("duplicate case label {key}"),
                );
            } else {
                seen.insert(key);
            }
        }

        self.breakables.enter(Breakable::Switch);
        self.scope_mut().open_scope();
        for case in switch.cases {
            for stmt in case.body {
                self.check_stmt(stmt);
            }
        }
        self.scope_mut().close_scope();
        self.breakables.exit();
    }

    fn check_return(&mut self, ret: &ReturnStmt<'_>) {
        let expected = self.return_type.clone();
        match (ret.value, &expected) {
            (Some(value), Type::Void) => {
                self.check_expr(value);
                self.mismatch(value.span, "void method cannot return a value");
            }
            (Some(value), _) => {
                let found = self.check_expr(value);
                if !mica_core::types::is_assignable(&expected, &found) {
                    self.mismatch(
                        value.span,
                        format!("cannot return {found} from a method returning {expected}"),
                    );
                }
            }
            (None, Type::Void) => {}
            (None, _) => {
                self.mismatch(ret.span, format!("missing return value of type {expected}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{analyze_source, kinds};
    use mica_core::DiagnosticKind::*;

    fn main(stmts: &str) -> String {
        format!("void main() {{ {stmts} }}")
    }

    #[test]
    fn local_redeclaration_in_same_block() {
        assert_eq!(kinds(&main("int x; double x;")), vec![DuplicateDeclaration]);
    }

    #[test]
    fn inner_block_may_shadow() {
        assert!(kinds(&main("int x; { double x; x = 1.5; } x = 2;")).is_empty());
    }

    #[test]
    fn names_die_with_their_block() {
        assert_eq!(
            kinds(&main("{ int y; } y = 1;")),
            vec![UndeclaredIdentifier]
        );
    }

    #[test]
    fn initializer_sees_outer_binding() {
        assert!(kinds(&main("int x; x = 1; { int y = x + 1; write(y); }")).is_empty());
        assert_eq!(kinds(&main("int x = 1.5;")), vec![TypeMismatch]);
    }

    #[test]
    fn condition_must_be_bool() {
        assert_eq!(kinds(&main("if (1) write(1);")), vec![TypeMismatch]);
        assert_eq!(kinds(&main("while (0) { }")), vec![TypeMismatch]);
        assert_eq!(kinds(&main("for (;1;) { }")), vec![TypeMismatch]);
    }

    #[test]
    fn break_placement() {
        assert_eq!(kinds(&main("break;")), vec![IllegalBreak]);
        assert_eq!(kinds(&main("if (true) { break; }")), vec![IllegalBreak]);
        assert!(kinds(&main("while (true) { if (true) break; }")).is_empty());
        assert!(kinds(&main("switch (1) { case 1: break; }")).is_empty());
    }

    #[test]
    fn for_variable_is_scoped_to_loop() {
        let source = main("for (int i = 0; i < 3; i = i + 1) { write(i); } i = 4;");
        assert_eq!(kinds(&source), vec![UndeclaredIdentifier]);
    }

    #[test]
    fn switch_labels() {
        let source =
            "char c; c = 'a'; switch (c) { case 'a': case 'b': write(1); default: write(2); }";
        assert!(kinds(&main(source)).is_empty());
        assert_eq!(
            kinds(&main("switch (1) { case 1: break; case 2: break; case 1: break; }")),
            vec![DuplicateCaseLabel]
        );
        assert_eq!(
            kinds(&main("switch (1) { default: break; default: break; }")),
            vec![DuplicateCaseLabel]
        );
        assert_eq!(
            kinds(&main("switch (1) { case 'a': break; }")),
            vec![TypeMismatch]
        );
        assert_eq!(
            kinds(&main("switch (true) { case 1: break; }")),
            vec![TypeMismatch]
        );
    }

    #[test]
    fn negative_case_labels() {
        assert_eq!(
            kinds(&main("switch (0) { case -1: break; case 1: break; case -1: break; }")),
            vec![DuplicateCaseLabel]
        );
    }

    #[test]
    fn return_rules() {
        assert_eq!(kinds("void f() { return 1; }"), vec![TypeMismatch]);
        assert_eq!(kinds("int f() { return; }"), vec![TypeMismatch]);
        assert_eq!(kinds("int f() { return true; }"), vec![TypeMismatch]);
        assert!(kinds("double f() { return 1; }").is_empty());
    }

    #[test]
    fn missing_return() {
        let analysis = analyze_source("int f(int a) { if (a > 0) return 1; }");
        let diagnostic = analysis.diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.kind, MissingReturn);
        assert_eq!(analysis.diagnostics.len(), 1);
        assert!(diagnostic.message.contains("'f'"));
        assert!(kinds("void f() { }").is_empty());
    }

    #[test]
    fn read_and_write_targets() {
        let source = "int i; char c; double d; read(i); read(c); read(d); write(\"ok\");";
        assert!(kinds(&main(source)).is_empty());
        assert_eq!(kinds(&main("int[] a; read(a);")), vec![TypeMismatch]);
        assert_eq!(kinds(&main("int[] a; write(a);")), vec![TypeMismatch]);
    }

    #[test]
    fn parameters_and_body_share_a_level() {
        assert_eq!(
            kinds("void f(int a) { int a; }"),
            vec![DuplicateDeclaration]
        );
        assert_eq!(
            kinds("void f(int a, int a) { }"),
            vec![DuplicateDeclaration]
        );
    }

    #[test]
    fn recursion_sees_own_signature() {
        let source = "int fact(int n) { if (n <= 1) return 1; else return n * fact(n - 1); }";
        assert!(kinds(source).is_empty());
    }

    #[test]
    fn methods_are_visible_only_after_declaration() {
        let source = "void main() { g(); }\nvoid g() { }";
        assert_eq!(kinds(source), vec![UndeclaredIdentifier]);
    }

    #[test]
    fn locals_shadow_fields() {
        let source =
            "class C { int v; void set(int v) { v = v; } int get() { double v; return 1; } }";
        assert!(kinds(source).is_empty());
    }
}
