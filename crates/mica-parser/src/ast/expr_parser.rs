//! Expression parsing using Pratt parsing (precedence climbing).

use bumpalo::collections::Vec as BVec;

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::types::{Ident, TypeBase, TypeExpr};
use crate::ast::{BinaryOp, ParseError, ParseErrorKind, UnaryOp};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse an expression whose operators bind at least as tightly as `min_bp`.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = BinaryOp::from_token(self.peek().kind) {
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let span = lhs.span.merge(rhs.span);
            let node = self.arena.alloc(BinaryExpr { op, lhs, rhs });
            lhs = self.alloc_expr(ExprKind::Binary(node), span);
        }

        Ok(lhs)
    }

    /// Unary operators, casts, then a postfix chain.
    fn parse_unary(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        // The sign belongs to the literal, so `-2147483648` is in range.
        if self.check(TokenKind::Minus) && self.peek_nth(1).kind == TokenKind::IntLiteral {
            let minus = self.advance().span;
            let value = self.parse_literal(true)?;
            let span = minus.merge(self.previous_span());
            let literal = self.alloc_expr(ExprKind::Literal(value), span);
            return self.parse_postfix(literal);
        }

        if let Some(op) = UnaryOp::from_token(self.peek().kind) {
            let op_span = self.advance().span;
            let operand = self.parse_unary()?;
            let node = self.arena.alloc(UnaryExpr { op, operand });
            return Ok(self.alloc_expr(ExprKind::Unary(node), op_span.merge(operand.span)));
        }

        if self.at_cast() {
            let open = self.expect(TokenKind::LeftParen)?.span;
            let target = self.parse_type()?;
            self.expect(TokenKind::RightParen)?;
            let operand = self.parse_unary()?;
            let node = self.arena.alloc(CastExpr { target, operand });
            return Ok(self.alloc_expr(ExprKind::Cast(node), open.merge(operand.span)));
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    /// A `(` that opens a cast rather than a parenthesized expression.
    ///
    /// `(int) x` and `(T[]) x` are always casts. `(T) x` with a bare name is a
    /// cast only when a factor follows the `)`, so `(a) - b` stays a subtraction.
    fn at_cast(&self) -> bool {
        if !self.check(TokenKind::LeftParen) {
            return false;
        }
        let first = self.peek_nth(1).kind;
        if first.is_primitive_type() {
            return true;
        }
        if first != TokenKind::Identifier {
            return false;
        }
        match self.peek_nth(2).kind {
            TokenKind::RightParen => self.peek_nth(3).kind.starts_factor(),
            TokenKind::LeftBracket => {
                self.peek_nth(3).kind == TokenKind::RightBracket
                    && self.peek_nth(4).kind == TokenKind::RightParen
            }
            _ => false,
        }
    }

    fn parse_primary(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = *self.peek();
        match token.kind {
            TokenKind::IntLiteral
            | TokenKind::DoubleLiteral
            | TokenKind::CharLiteral
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => {
                let value = self.parse_literal(false)?;
                Ok(self.alloc_expr(ExprKind::Literal(value), token.span))
            }
            TokenKind::Identifier => {
                self.advance();
                let name = Ident::new(token.lexeme, token.span);
                if self.check(TokenKind::LeftParen) {
                    return self.parse_call(None, name);
                }
                Ok(self.alloc_expr(ExprKind::Name(name), token.span))
            }
            TokenKind::New => self.parse_new(),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::Eof => Err(ParseError::unexpected_eof(token.span)),
            _ => Err(ParseError::expected_expression(token.span, &token.describe())),
        }
    }

    /// Consume a literal token. With `negated`, a preceding `-` has already
    /// been consumed and only numeric literals are accepted.
    pub(crate) fn parse_literal(&mut self, negated: bool) -> Result<Literal<'ast>, ParseError> {
        let token = self.advance();
        let sign = if negated { "-" } else { "" };
        let literal = match token.kind {
            TokenKind::IntLiteral => {
                let text = format!("{sign}{}", token.lexeme);
                let value = text.parse::<i32>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("integer literal {text} does not fit in int"),
                    )
                })?;
                Literal::Int(value)
            }
            TokenKind::DoubleLiteral => {
                let text = format!("{sign}{}", token.lexeme);
                let value = text.parse::<f64>().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        format!("invalid double literal {text}"),
                    )
                })?;
                Literal::Double(value)
            }
            _ if negated => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidLiteral,
                    token.span,
                    format!("expected number after '-', found {}", token.describe()),
                ));
            }
            TokenKind::CharLiteral => match token.lexeme.chars().next() {
                Some(c) => Literal::Char(c),
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidLiteral,
                        token.span,
                        "empty character literal",
                    ));
                }
            },
            TokenKind::StringLiteral => Literal::String(token.lexeme),
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            TokenKind::Null => Literal::Null,
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidLiteral,
                    token.span,
                    format!("expected literal, found {}", token.describe()),
                ));
            }
        };
        Ok(literal)
    }

    /// `.field`, `.method(args)` and `[index]` suffixes.
    fn parse_postfix(&mut self, mut lhs: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        loop {
            if self.eat(TokenKind::Dot).is_some() {
                let name = self.expect_ident()?;
                if self.check(TokenKind::LeftParen) {
                    lhs = self.parse_call(Some(lhs), name)?;
                } else {
                    let node = self.arena.alloc(FieldExpr {
                        object: lhs,
                        field: name,
                    });
                    lhs = self.alloc_expr(ExprKind::Field(node), lhs.span.merge(name.span));
                }
            } else if self.eat(TokenKind::LeftBracket).is_some() {
                let index = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RightBracket)?.span;
                let node = self.arena.alloc(IndexExpr { array: lhs, index });
                lhs = self.alloc_expr(ExprKind::Index(node), lhs.span.merge(close));
            } else {
                return Ok(lhs);
            }
        }
    }

    /// Arguments of a call whose name has been consumed.
    fn parse_call(
        &mut self,
        receiver: Option<&'ast Expr<'ast>>,
        name: Ident<'ast>,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            args.push(self.parse_expr(0)?);
            while self.eat(TokenKind::Comma).is_some() {
                args.push(self.parse_expr(0)?);
            }
        }
        let close = self.expect(TokenKind::RightParen)?.span;
        let start = receiver.map_or(name.span, |r| r.span);
        let node = self.arena.alloc(CallExpr {
            receiver,
            name,
            args: args.into_bump_slice(),
        });
        Ok(self.alloc_expr(ExprKind::Call(node), start.merge(close)))
    }

    /// `new C()` or `new T[n]`.
    fn parse_new(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.expect(TokenKind::New)?.span;
        let element = self.parse_base_type()?;

        if self.eat(TokenKind::LeftBracket).is_some() {
            let length = self.parse_expr(0)?;
            let close = self.expect(TokenKind::RightBracket)?.span;
            let node = self.arena.alloc(NewArrayExpr { element, length });
            return Ok(self.alloc_expr(ExprKind::NewArray(node), start.merge(close)));
        }

        let TypeBase::Named(class) = element.base else {
            let found = *self.peek();
            return Err(ParseError::expected_token(
                found.span,
                "'[' after primitive type in 'new'",
                &found.describe(),
            ));
        };
        self.expect(TokenKind::LeftParen)?;
        let close = self.expect(TokenKind::RightParen)?.span;
        Ok(self.alloc_expr(ExprKind::NewObject(class), start.merge(close)))
    }

    // =========================================
    // Types
    // =========================================

    /// `int`, `Point`, `char[]`.
    pub(crate) fn parse_type(&mut self) -> Result<TypeExpr<'ast>, ParseError> {
        let mut ty = self.parse_base_type()?;
        if self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
            self.advance();
            let close = self.advance().span;
            ty.is_array = true;
            ty.span = ty.span.merge(close);
        }
        Ok(ty)
    }

    /// A type without the array suffix.
    pub(crate) fn parse_base_type(&mut self) -> Result<TypeExpr<'ast>, ParseError> {
        let token = *self.peek();
        let base = match token.kind {
            TokenKind::Int => TypeBase::Int,
            TokenKind::Double => TypeBase::Double,
            TokenKind::Char => TypeBase::Char,
            TokenKind::Bool => TypeBase::Bool,
            TokenKind::String => TypeBase::String,
            TokenKind::Identifier => TypeBase::Named(Ident::new(token.lexeme, token.span)),
            _ => return Err(ParseError::expected_type(token.span, &token.describe())),
        };
        self.advance();
        Ok(TypeExpr {
            base,
            is_array: false,
            span: token.span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn parse<'a>(arena: &'a Bump, source: &str) -> &'a Expr<'a> {
        Parser::parse_expression(source, arena).unwrap()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let arena = Bump::new();
        let expr = parse(&arena, "1 + 2 * 3");
        let ExprKind::Binary(add) = expr.kind else {
            panic!("expected binary, got {:?}", expr.kind);
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.rhs.kind, ExprKind::Binary(b) if b.op == BinaryOp::Mul));
    }

    #[test]
    fn comparisons_are_left_associative() {
        let arena = Bump::new();
        let expr = parse(&arena, "a < b == c");
        let ExprKind::Binary(eq) = expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(eq.op, BinaryOp::Equal);
        assert!(matches!(eq.lhs.kind, ExprKind::Binary(b) if b.op == BinaryOp::Less));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let arena = Bump::new();
        let expr = parse(&arena, "a || b && c");
        let ExprKind::Binary(or) = expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(or.op, BinaryOp::Or);
        assert!(matches!(or.rhs.kind, ExprKind::Binary(b) if b.op == BinaryOp::And));
    }

    #[test]
    fn unary_and_parentheses() {
        let arena = Bump::new();
        let expr = parse(&arena, "-(x + 1)");
        let ExprKind::Unary(neg) = expr.kind else {
            panic!("expected unary");
        };
        assert_eq!(neg.op, UnaryOp::Neg);
        assert!(matches!(neg.operand.kind, ExprKind::Binary(_)));
    }

    #[test]
    fn minus_folds_into_int_literals() {
        let arena = Bump::new();
        let expr = parse(&arena, "-2147483648");
        assert!(matches!(expr.kind, ExprKind::Literal(Literal::Int(i32::MIN))));
        assert_eq!(expr.span.len, 11);

        let expr = parse(&arena, "-5 * 2");
        let ExprKind::Binary(mul) = expr.kind else {
            panic!("expected binary");
        };
        assert!(matches!(mul.lhs.kind, ExprKind::Literal(Literal::Int(-5))));

        assert!(matches!(parse(&arena, "-2.5").kind, ExprKind::Unary(_)));
        assert!(Parser::parse_expression("2147483648", &arena).is_err());
        assert!(Parser::parse_expression("-2147483649", &arena).is_err());
    }

    #[test]
    fn casts() {
        let arena = Bump::new();
        let expr = parse(&arena, "(int) 2.5");
        assert!(matches!(expr.kind, ExprKind::Cast(c) if c.target.base == TypeBase::Int));

        let expr = parse(&arena, "(Point) p");
        assert!(matches!(expr.kind, ExprKind::Cast(_)));

        // Parenthesized name followed by an operator is not a cast.
        let expr = parse(&arena, "(a) - b");
        assert!(matches!(expr.kind, ExprKind::Binary(b) if b.op == BinaryOp::Sub));
    }

    #[test]
    fn designator_chains() {
        let arena = Bump::new();
        let expr = parse(&arena, "line.points[i].x");
        let ExprKind::Field(x) = expr.kind else {
            panic!("expected field");
        };
        assert_eq!(x.field.name, "x");
        assert!(matches!(x.object.kind, ExprKind::Index(_)));
        assert!(expr.is_designator());
    }

    #[test]
    fn calls() {
        let arena = Bump::new();
        let expr = parse(&arena, "acc.deposit(10, rate * 2)");
        let ExprKind::Call(call) = expr.kind else {
            panic!("expected call");
        };
        assert_eq!(call.name.name, "deposit");
        assert!(call.receiver.is_some());
        assert_eq!(call.args.len(), 2);

        let expr = parse(&arena, "f()");
        assert!(matches!(
            expr.kind,
            ExprKind::Call(c) if c.receiver.is_none() && c.args.is_empty()
        ));
    }

    #[test]
    fn new_expressions() {
        let arena = Bump::new();
        assert!(matches!(
            parse(&arena, "new Point()").kind,
            ExprKind::NewObject(i) if i.name == "Point"
        ));
        let expr = parse(&arena, "new int[n + 1]");
        assert!(matches!(expr.kind, ExprKind::NewArray(a) if a.element.base == TypeBase::Int));
    }

    #[test]
    fn literals() {
        let arena = Bump::new();
        assert!(matches!(
            parse(&arena, "'x'").kind,
            ExprKind::Literal(Literal::Char('x'))
        ));
        assert!(matches!(parse(&arena, "null").kind, ExprKind::Literal(Literal::Null)));
        assert!(matches!(
            parse(&arena, "2.5").kind,
            ExprKind::Literal(Literal::Double(v)) if v == 2.5
        ));
        assert!(matches!(
            parse(&arena, "\"hi\"").kind,
            ExprKind::Literal(Literal::String("hi"))
        ));
    }

    #[test]
    fn expression_ids_are_unique() {
        let arena = Bump::new();
        let expr = parse(&arena, "a + b");
        let ExprKind::Binary(bin) = expr.kind else {
            panic!("expected binary");
        };
        assert_ne!(bin.lhs.id, bin.rhs.id);
        assert_ne!(bin.lhs.id, expr.id);
        assert_ne!(bin.rhs.id, expr.id);
    }

    #[test]
    fn errors() {
        let arena = Bump::new();
        assert!(Parser::parse_expression("1 +", &arena).is_err());
        assert!(Parser::parse_expression("new int()", &arena).is_err());
        assert!(Parser::parse_expression("99999999999", &arena).is_err());
        let err = Parser::parse_expression("(1", &arena).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }
}
