//! Top-level and class-member declarations.

use crate::ast::stmt::Block;
use crate::ast::types::{Ident, ReturnType, TypeExpr};
use mica_core::Span;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'ast> {
    Class(ClassDecl<'ast>),
    Var(VarDecl<'ast>),
    Method(MethodDecl<'ast>),
}

impl<'ast> Item<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Item::Class(c) => c.span,
            Item::Var(v) => v.span,
            Item::Method(m) => m.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'ast> {
    pub name: Ident<'ast>,
    pub members: &'ast [ClassMember<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassMember<'ast> {
    Field(VarDecl<'ast>),
    Method(MethodDecl<'ast>),
}

/// A global or field declaration. These never carry initializers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    pub ty: TypeExpr<'ast>,
    pub names: &'ast [Ident<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodDecl<'ast> {
    pub return_type: ReturnType<'ast>,
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub body: Block<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub ty: TypeExpr<'ast>,
    pub name: Ident<'ast>,
    pub span: Span,
}
