//! Parser state and token-level helpers shared by the grammar modules.

use bumpalo::Bump;

use crate::ast::expr::{Expr, ExprId, ExprKind};
use crate::ast::types::Ident;
use crate::ast::{ParseError, Program};
use crate::lexer::{Lexer, Token, TokenKind};
use mica_core::Span;

/// Recursive-descent parser for Mica.
///
/// Nodes are allocated in the arena passed to [`Parser::parse`]. The parser
/// fails fast: the first syntax error is returned and nothing is recovered.
pub struct Parser<'ast> {
    pub(crate) arena: &'ast Bump,
    tokens: Vec<Token<'ast>>,
    pos: usize,
    next_expr_id: u32,
}

impl<'ast> Parser<'ast> {
    /// Parse a complete program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Program<'ast>, ParseError> {
        let mut parser = Self::new(source, arena)?;
        parser.parse_program()
    }

    /// Parse a single expression, requiring the input to end after it.
    pub fn parse_expression(
        source: &str,
        arena: &'ast Bump,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut parser = Self::new(source, arena)?;
        let expr = parser.parse_expr(0)?;
        parser.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    fn new(source: &str, arena: &'ast Bump) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source, arena).tokenize()?;
        Ok(Self {
            arena,
            tokens,
            pos: 0,
            next_expr_id: 0,
        })
    }

    // =========================================
    // Token access
    // =========================================

    /// The current token. Past the end this keeps returning `Eof`.
    pub(crate) fn peek(&self) -> &Token<'ast> {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token<'ast> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub(crate) fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// Span of the most recently consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let found = *self.peek();
        if found.kind == TokenKind::Eof {
            return Err(ParseError::unexpected_eof(found.span));
        }
        Err(ParseError::expected_token(
            found.span,
            &format!("'{}'", kind.description()),
            &found.describe(),
        ))
    }

    pub(crate) fn expect_ident(&mut self) -> Result<Ident<'ast>, ParseError> {
        let token = *self.peek();
        if token.kind == TokenKind::Identifier {
            self.advance();
            Ok(Ident::new(token.lexeme, token.span))
        } else {
            Err(ParseError::expected_identifier(token.span, &token.describe()))
        }
    }

    // =========================================
    // Node construction
    // =========================================

    /// Allocate an expression with the next free id.
    pub(crate) fn alloc_expr(&mut self, kind: ExprKind<'ast>, span: Span) -> &'ast Expr<'ast> {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        self.arena.alloc(Expr { id, kind, span })
    }

    pub(crate) fn expr_count(&self) -> u32 {
        self.next_expr_id
    }
}
