//! Type annotations as written in source.

use mica_core::{Span, Type};

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// The base of a type annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeBase<'ast> {
    Int,
    Double,
    Char,
    Bool,
    String,
    /// A class name; resolved by the analyzer.
    Named(Ident<'ast>),
}

/// `int`, `Point`, `char[]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeExpr<'ast> {
    pub base: TypeBase<'ast>,
    pub is_array: bool,
    pub span: Span,
}

impl<'ast> TypeExpr<'ast> {
    /// The class name this annotation depends on, if any.
    pub fn class_name(&self) -> Option<Ident<'ast>> {
        match self.base {
            TypeBase::Named(ident) => Some(ident),
            _ => None,
        }
    }

    /// Convert to a [`Type`], trusting that any class name exists.
    pub fn to_type(&self) -> Type {
        let base = match self.base {
            TypeBase::Int => Type::Int,
            TypeBase::Double => Type::Double,
            TypeBase::Char => Type::Char,
            TypeBase::Bool => Type::Bool,
            TypeBase::String => Type::String,
            TypeBase::Named(ident) => Type::class(ident.name),
        };
        if self.is_array {
            Type::array_of(base)
        } else {
            base
        }
    }
}

/// A method's declared result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType<'ast> {
    Void(Span),
    Type(TypeExpr<'ast>),
}

impl<'ast> ReturnType<'ast> {
    pub fn span(&self) -> Span {
        match self {
            ReturnType::Void(span) => *span,
            ReturnType::Type(ty) => ty.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_type() {
        let span = Span::new(1, 1, 3);
        let ints = TypeExpr {
            base: TypeBase::Int,
            is_array: true,
            span,
        };
        assert_eq!(ints.to_type(), Type::array_of(Type::Int));

        let point = TypeExpr {
            base: TypeBase::Named(Ident::new("Point", span)),
            is_array: false,
            span,
        };
        assert_eq!(point.to_type(), Type::class("Point"));
        assert_eq!(point.class_name().map(|i| i.name), Some("Point"));
    }
}
