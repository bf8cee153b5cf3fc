//! Top-level parsing: classes, globals and methods.

use bumpalo::collections::Vec as BVec;

use super::parser::Parser;
use crate::ast::decl::*;
use crate::ast::types::{Ident, ReturnType, TypeExpr};
use crate::ast::{ParseError, ParseErrorKind, Program};
use crate::lexer::TokenKind;
use mica_core::Span;

impl<'ast> Parser<'ast> {
    /// `{ ClassDecl | VarDecl | MethodDecl } EOF`
    pub(crate) fn parse_program(&mut self) -> Result<Program<'ast>, ParseError> {
        let start = self.peek().span;
        let mut items = BVec::new_in(self.arena);
        while !self.check(TokenKind::Eof) {
            items.push(self.parse_item()?);
        }
        let span = items
            .last()
            .map_or(start, |item: &Item<'ast>| start.merge(item.span()));
        Ok(Program::new(items.into_bump_slice(), span, self.expr_count()))
    }

    fn parse_item(&mut self) -> Result<Item<'ast>, ParseError> {
        if self.check(TokenKind::Class) {
            return Ok(Item::Class(self.parse_class()?));
        }
        match self.parse_member()? {
            ClassMember::Field(var) => Ok(Item::Var(var)),
            ClassMember::Method(method) => Ok(Item::Method(method)),
        }
    }

    /// `class Name { { VarDecl | MethodDecl } }`
    fn parse_class(&mut self) -> Result<ClassDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Class)?.span;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LeftBrace)?;
        let mut members = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) {
            if self.check(TokenKind::Eof) {
                return Err(ParseError::unexpected_eof(self.peek().span));
            }
            members.push(self.parse_member()?);
        }
        let close = self.expect(TokenKind::RightBrace)?.span;
        Ok(ClassDecl {
            name,
            members: members.into_bump_slice(),
            span: start.merge(close),
        })
    }

    /// A variable or method declaration, at global or class-member level.
    fn parse_member(&mut self) -> Result<ClassMember<'ast>, ParseError> {
        let token = *self.peek();
        if token.kind == TokenKind::Void {
            self.advance();
            let name = self.expect_ident()?;
            return Ok(ClassMember::Method(
                self.parse_method_rest(ReturnType::Void(token.span), name)?,
            ));
        }

        if !(token.kind.is_primitive_type() || token.kind == TokenKind::Identifier) {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedDeclaration,
                token.span,
                format!("expected declaration, found {}", token.describe()),
            ));
        }

        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        if self.check(TokenKind::LeftParen) {
            return Ok(ClassMember::Method(self.parse_method_rest(ReturnType::Type(ty), name)?));
        }
        Ok(ClassMember::Field(self.parse_var_decl_rest(ty, name)?))
    }

    /// The `, b, c;` tail of a global or field declaration.
    fn parse_var_decl_rest(
        &mut self,
        ty: TypeExpr<'ast>,
        first: Ident<'ast>,
    ) -> Result<VarDecl<'ast>, ParseError> {
        let mut names = BVec::new_in(self.arena);
        names.push(first);
        loop {
            if let Some(eq) = self.eat(TokenKind::Equal) {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidInitializer,
                    eq.span,
                    "globals and fields cannot have initializers",
                ));
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
            names.push(self.expect_ident()?);
        }
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(VarDecl {
            ty,
            names: names.into_bump_slice(),
            span: ty.span.merge(end),
        })
    }

    /// `( [Param {, Param}] ) Block` after the return type and name.
    fn parse_method_rest(
        &mut self,
        return_type: ReturnType<'ast>,
        name: Ident<'ast>,
    ) -> Result<MethodDecl<'ast>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                let ty = self.parse_type()?;
                let param_name = self.expect_ident()?;
                params.push(Param {
                    ty,
                    name: param_name,
                    span: ty.span.merge(param_name.span),
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_block()?;
        let start: Span = return_type.span();
        Ok(MethodDecl {
            return_type,
            name,
            params: params.into_bump_slice(),
            body,
            span: start.merge(body.span),
        })
    }
}
