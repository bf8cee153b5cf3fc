//! Expression nodes.
//!
//! Every expression carries an [`ExprId`], unique within one [`Program`],
//! so later phases can attach facts (such as resolved types) in side tables
//! without mutating the arena-allocated tree.
//!
//! [`Program`]: crate::ast::Program

use crate::ast::types::{Ident, TypeExpr};
use crate::ast::{BinaryOp, UnaryOp};
use mica_core::Span;

/// Identity of an expression node, assigned in parse order starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expr<'ast> {
    pub id: ExprId,
    pub kind: ExprKind<'ast>,
    pub span: Span,
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether the expression names a storage location.
    pub fn is_designator(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Name(_) | ExprKind::Field(_) | ExprKind::Index(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprKind<'ast> {
    Literal(Literal<'ast>),
    /// A bare name: local, parameter, field of `this` or global.
    Name(Ident<'ast>),
    /// `object.field`
    Field(&'ast FieldExpr<'ast>),
    /// `array[index]`
    Index(&'ast IndexExpr<'ast>),
    /// `f(args)` or `object.m(args)`
    Call(&'ast CallExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    /// `(T) operand`
    Cast(&'ast CastExpr<'ast>),
    /// `new C()`
    NewObject(Ident<'ast>),
    /// `new T[length]`
    NewArray(&'ast NewArrayExpr<'ast>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'ast> {
    Int(i32),
    Double(f64),
    Char(char),
    Bool(bool),
    String(&'ast str),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub field: Ident<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub array: &'ast Expr<'ast>,
    pub index: &'ast Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    /// The object for `object.m(...)`; `None` for a bare call.
    pub receiver: Option<&'ast Expr<'ast>>,
    pub name: Ident<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub op: BinaryOp,
    pub lhs: &'ast Expr<'ast>,
    pub rhs: &'ast Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub target: TypeExpr<'ast>,
    pub operand: &'ast Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewArrayExpr<'ast> {
    /// Element type; never itself an array.
    pub element: TypeExpr<'ast>,
    pub length: &'ast Expr<'ast>,
}
