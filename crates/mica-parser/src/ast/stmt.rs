//! Statement nodes.

use crate::ast::expr::{Expr, Literal};
use crate::ast::types::{Ident, TypeExpr};
use mica_core::Span;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `int a, b = 1;` inside a method body.
    VarDecl(LocalDecl<'ast>),
    /// `designator = expr;`
    Assign(AssignStmt<'ast>),
    /// `f(x);` or `obj.m();`; the expression is always an `ExprKind::Call`.
    Call(CallStmt<'ast>),
    If(&'ast IfStmt<'ast>),
    While(&'ast WhileStmt<'ast>),
    For(&'ast ForStmt<'ast>),
    Switch(&'ast SwitchStmt<'ast>),
    Break(Span),
    Return(ReturnStmt<'ast>),
    Read(ReadStmt<'ast>),
    Write(WriteStmt<'ast>),
    Block(Block<'ast>),
    /// A lone `;`.
    Empty(Span),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Call(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Switch(s) => s.span,
            Stmt::Break(span) => *span,
            Stmt::Return(s) => s.span,
            Stmt::Read(s) => s.span,
            Stmt::Write(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::Empty(span) => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalDecl<'ast> {
    pub ty: TypeExpr<'ast>,
    pub vars: &'ast [VarDeclarator<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDeclarator<'ast> {
    pub name: Ident<'ast>,
    pub init: Option<&'ast Expr<'ast>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignStmt<'ast> {
    pub target: &'ast Expr<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallStmt<'ast> {
    pub call: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_branch: Stmt<'ast>,
    pub else_branch: Option<Stmt<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub body: Stmt<'ast>,
    pub span: Span,
}

/// `for (init; condition; update) body`; every header part is optional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub init: Option<ForInit<'ast>>,
    pub condition: Option<&'ast Expr<'ast>>,
    /// An assignment or call statement.
    pub update: Option<Stmt<'ast>>,
    pub body: Stmt<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForInit<'ast> {
    VarDecl(LocalDecl<'ast>),
    Assign(AssignStmt<'ast>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchStmt<'ast> {
    pub selector: &'ast Expr<'ast>,
    pub cases: &'ast [SwitchCase<'ast>],
    pub span: Span,
}

/// One `case L:` or `default:` section and the statements after it.
///
/// Execution falls through into the next section unless a `break` intervenes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchCase<'ast> {
    /// `None` for `default`.
    pub label: Option<CaseLabel<'ast>>,
    pub body: &'ast [Stmt<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseLabel<'ast> {
    pub value: Literal<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadStmt<'ast> {
    pub target: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteStmt<'ast> {
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}
