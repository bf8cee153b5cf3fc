//! Statement parsing: blocks, control flow, local declarations and the
//! designator statements (assignment and call).

use bumpalo::collections::Vec as BVec;

use super::parser::Parser;
use crate::ast::expr::ExprKind;
use crate::ast::stmt::*;
use crate::ast::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// `{ { LocalDecl | Statement } }`
    pub fn parse_block(&mut self) -> Result<Block<'ast>, ParseError> {
        let open = self.expect(TokenKind::LeftBrace)?.span;
        let mut stmts = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) {
            if self.check(TokenKind::Eof) {
                return Err(ParseError::unexpected_eof(self.peek().span));
            }
            stmts.push(self.parse_statement()?);
        }
        let close = self.expect(TokenKind::RightBrace)?.span;
        Ok(Block {
            stmts: stmts.into_bump_slice(),
            span: open.merge(close),
        })
    }

    pub fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let token = *self.peek();
        match token.kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Break => {
                self.advance();
                let end = self.expect(TokenKind::Semicolon)?.span;
                Ok(Stmt::Break(token.span.merge(end)))
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Read => self.parse_read(),
            TokenKind::Write => self.parse_write(),
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty(token.span))
            }
            _ if self.at_local_decl() => {
                let decl = self.parse_local_decl()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::VarDecl(decl))
            }
            TokenKind::Identifier => {
                let stmt = self.parse_simple_statement()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(stmt)
            }
            TokenKind::Eof => Err(ParseError::unexpected_eof(token.span)),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedStatement,
                token.span,
                format!("expected statement, found {}", token.describe()),
            )),
        }
    }

    /// Whether the upcoming tokens start `Type ident`.
    fn at_local_decl(&self) -> bool {
        let first = self.peek().kind;
        if first.is_primitive_type() {
            return true;
        }
        if first != TokenKind::Identifier {
            return false;
        }
        match self.peek_nth(1).kind {
            TokenKind::Identifier => true,
            TokenKind::LeftBracket => {
                self.peek_nth(2).kind == TokenKind::RightBracket
                    && self.peek_nth(3).kind == TokenKind::Identifier
            }
            _ => false,
        }
    }

    /// `Type name [= expr] {, name [= expr]}` without the trailing `;`.
    fn parse_local_decl(&mut self) -> Result<LocalDecl<'ast>, ParseError> {
        let ty = self.parse_type()?;
        let mut vars = BVec::new_in(self.arena);
        let mut span = ty.span;
        loop {
            let name = self.expect_ident()?;
            span = span.merge(name.span);
            let init = if self.eat(TokenKind::Equal).is_some() {
                let value = self.parse_expr(0)?;
                span = span.merge(value.span);
                Some(value)
            } else {
                None
            };
            vars.push(VarDeclarator { name, init });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(LocalDecl {
            ty,
            vars: vars.into_bump_slice(),
            span,
        })
    }

    /// An assignment or a call, without the trailing `;`.
    fn parse_simple_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let target = self.parse_expr(0)?;

        if self.eat(TokenKind::Equal).is_some() {
            if !target.is_designator() {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    target.span,
                    "left side of '=' must be a variable, field or array element",
                ));
            }
            let value = self.parse_expr(0)?;
            return Ok(Stmt::Assign(AssignStmt {
                target,
                value,
                span: target.span.merge(value.span),
            }));
        }

        if matches!(target.kind, ExprKind::Call(_)) {
            return Ok(Stmt::Call(CallStmt {
                call: target,
                span: target.span,
            }));
        }

        let found = *self.peek();
        Err(ParseError::expected_token(found.span, "'=' or a call", &found.describe()))
    }

    fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            Some(self.parse_statement()?)
        } else {
            None
        };
        let end = else_branch.as_ref().unwrap_or(&then_branch).span();
        Ok(Stmt::If(self.arena.alloc(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: start.merge(end),
        })))
    }

    fn parse_while(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::While)?.span;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_statement()?;
        Ok(Stmt::While(self.arena.alloc(WhileStmt {
            condition,
            body,
            span: start.merge(body.span()),
        })))
    }

    /// `for ([init]; [condition]; [update]) body`
    fn parse_for(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::For)?.span;
        self.expect(TokenKind::LeftParen)?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else if self.at_local_decl() {
            Some(ForInit::VarDecl(self.parse_local_decl()?))
        } else {
            match self.parse_simple_statement()? {
                Stmt::Assign(assign) => Some(ForInit::Assign(assign)),
                other => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        other.span(),
                        "for-loop initializer must be a declaration or an assignment",
                    ));
                }
            }
        };
        self.expect(TokenKind::Semicolon)?;

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        self.expect(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_simple_statement()?)
        };
        self.expect(TokenKind::RightParen)?;

        let body = self.parse_statement()?;
        Ok(Stmt::For(self.arena.alloc(ForStmt {
            init,
            condition,
            update,
            body,
            span: start.merge(body.span()),
        })))
    }

    /// `switch (expr) { case L: ... default: ... }`
    fn parse_switch(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Switch)?.span;
        self.expect(TokenKind::LeftParen)?;
        let selector = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::LeftBrace)?;

        let mut cases = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) {
            let token = *self.peek();
            let label = match token.kind {
                TokenKind::Case => {
                    self.advance();
                    let label_start = self.peek().span;
                    let negated = self.eat(TokenKind::Minus).is_some();
                    let value = self.parse_literal(negated)?;
                    let label_end = self.previous_span();
                    Some(CaseLabel {
                        value,
                        span: label_start.merge(label_end),
                    })
                }
                TokenKind::Default => {
                    self.advance();
                    None
                }
                TokenKind::Eof => return Err(ParseError::unexpected_eof(token.span)),
                _ => {
                    return Err(ParseError::expected_token(
                        token.span,
                        "'case' or 'default'",
                        &token.describe(),
                    ));
                }
            };
            let colon = self.expect(TokenKind::Colon)?.span;

            let mut body = BVec::new_in(self.arena);
            while !matches!(
                self.peek().kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            let end = body.last().map_or(colon, |s: &Stmt<'ast>| s.span());
            cases.push(SwitchCase {
                label,
                body: body.into_bump_slice(),
                span: token.span.merge(end),
            });
        }
        let close = self.expect(TokenKind::RightBrace)?.span;

        Ok(Stmt::Switch(self.arena.alloc(SwitchStmt {
            selector,
            cases: cases.into_bump_slice(),
            span: start.merge(close),
        })))
    }

    fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Return)?.span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: start.merge(end),
        }))
    }

    /// `read(designator);`
    fn parse_read(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Read)?.span;
        self.expect(TokenKind::LeftParen)?;
        let target = self.parse_expr(0)?;
        if !target.is_designator() {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                target.span,
                "read target must be a variable, field or array element",
            ));
        }
        self.expect(TokenKind::RightParen)?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Read(ReadStmt {
            target,
            span: start.merge(end),
        }))
    }

    /// `write(expr);`
    fn parse_write(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Write)?.span;
        self.expect(TokenKind::LeftParen)?;
        let value = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt::Write(WriteStmt {
            value,
            span: start.merge(end),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Item, Literal, Program};
    use bumpalo::Bump;

    /// Parse `void main() { <body> }` and return its statements.
    fn body<'a>(arena: &'a Bump, source: &str) -> &'a [Stmt<'a>] {
        let program: Program<'a> =
            Parser::parse(&format!("void main() {{ {source} }}"), arena).unwrap();
        match program.items()[0] {
            Item::Method(m) => m.body.stmts,
            other => panic!("expected method, got {other:?}"),
        }
    }

    fn body_err(source: &str) -> ParseError {
        let arena = Bump::new();
        Parser::parse(&format!("void main() {{ {source} }}"), &arena).unwrap_err()
    }

    #[test]
    fn local_declarations() {
        let arena = Bump::new();
        let stmts = body(&arena, "int a, b = 2; Point p; Point[] ps; char[] cs;");
        assert_eq!(stmts.len(), 4);
        let Stmt::VarDecl(decl) = stmts[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.vars.len(), 2);
        assert!(decl.vars[0].init.is_none());
        assert!(decl.vars[1].init.is_some());
        assert!(matches!(stmts[2], Stmt::VarDecl(d) if d.ty.is_array));
    }

    #[test]
    fn assignment_and_call_statements() {
        let arena = Bump::new();
        let stmts = body(&arena, "x = 1; a[i] = 2; p.x = 3; f(1); p.move(1, 2);");
        assert!(matches!(stmts[0], Stmt::Assign(_)));
        assert!(matches!(stmts[1], Stmt::Assign(a) if matches!(a.target.kind, ExprKind::Index(_))));
        assert!(matches!(stmts[2], Stmt::Assign(a) if matches!(a.target.kind, ExprKind::Field(_))));
        assert!(matches!(stmts[3], Stmt::Call(_)));
        assert!(matches!(stmts[4], Stmt::Call(_)));
    }

    #[test]
    fn control_flow() {
        let arena = Bump::new();
        let stmts = body(
            &arena,
            "if (a) x = 1; else { x = 2; } while (x < 3) x = x + 1; for (;;) break; ;",
        );
        assert!(matches!(stmts[0], Stmt::If(s) if s.else_branch.is_some()));
        assert!(matches!(stmts[1], Stmt::While(_)));
        assert!(matches!(
            stmts[2],
            Stmt::For(f) if f.init.is_none() && f.condition.is_none() && f.update.is_none()
        ));
        assert!(matches!(stmts[3], Stmt::Empty(_)));
    }

    #[test]
    fn for_with_full_header() {
        let arena = Bump::new();
        let stmts = body(&arena, "for (int i = 0; i < 3; i = i + 1) { write(i); }");
        let Stmt::For(f) = stmts[0] else {
            panic!("expected for");
        };
        assert!(matches!(f.init, Some(ForInit::VarDecl(_))));
        assert!(f.condition.is_some());
        assert!(matches!(f.update, Some(Stmt::Assign(_))));

        let stmts = body(&arena, "for (i = 0; i < 3; tick()) ;");
        assert!(matches!(stmts[0], Stmt::For(f) if matches!(f.init, Some(ForInit::Assign(_)))));
    }

    #[test]
    fn switch_sections() {
        let arena = Bump::new();
        let stmts = body(
            &arena,
            "switch (c) { case 1: case -2: write(1); break; default: write(0); }",
        );
        let Stmt::Switch(sw) = stmts[0] else {
            panic!("expected switch");
        };
        assert_eq!(sw.cases.len(), 3);
        assert!(sw.cases[0].body.is_empty());
        assert!(matches!(
            sw.cases[1].label,
            Some(CaseLabel { value: Literal::Int(-2), .. })
        ));
        assert_eq!(sw.cases[1].body.len(), 2);
        assert!(sw.cases[2].label.is_none());
    }

    #[test]
    fn io_and_return() {
        let arena = Bump::new();
        let stmts = body(&arena, "read(x); write(x * 2); return; return 1;");
        assert!(matches!(stmts[0], Stmt::Read(_)));
        assert!(matches!(stmts[1], Stmt::Write(_)));
        assert!(matches!(stmts[2], Stmt::Return(r) if r.value.is_none()));
        assert!(matches!(stmts[3], Stmt::Return(r) if r.value.is_some()));
    }

    #[test]
    fn statement_errors() {
        assert_eq!(body_err("x + 1;").kind, ParseErrorKind::ExpectedToken);
        assert_eq!(body_err("1 = x;").kind, ParseErrorKind::ExpectedStatement);
        assert_eq!(body_err("f() = 1;").kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(body_err("read(1);").kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(
            body_err("switch (x) { write(1); }").kind,
            ParseErrorKind::ExpectedToken
        );
        assert_eq!(body_err("x = 1").kind, ParseErrorKind::ExpectedToken);
    }

    #[test]
    fn missing_brace_is_eof() {
        let arena = Bump::new();
        let err = Parser::parse("void main() { x = 1;", &arena).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }
}
