//! Operators and their precedence.

use std::fmt;

use crate::lexer::TokenKind;

/// Which family of typing rules a binary operator follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    Arithmetic,
    Relational,
    Equality,
    Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Left and right binding power for the Pratt loop.
    ///
    /// Lowest to highest: `||`, `&&`, comparisons, additive, multiplicative.
    /// All levels are left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            Or => (3, 4),
            And => (5, 6),
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => (7, 8),
            Add | Sub => (9, 10),
            Mul | Div | Rem => (11, 12),
        }
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use BinaryOp::*;
        Some(match token {
            TokenKind::PipePipe => Or,
            TokenKind::AmpAmp => And,
            TokenKind::EqualEqual => Equal,
            TokenKind::BangEqual => NotEqual,
            TokenKind::Less => Less,
            TokenKind::LessEqual => LessEqual,
            TokenKind::Greater => Greater,
            TokenKind::GreaterEqual => GreaterEqual,
            TokenKind::Plus => Add,
            TokenKind::Minus => Sub,
            TokenKind::Star => Mul,
            TokenKind::Slash => Div,
            TokenKind::Percent => Rem,
            _ => return None,
        })
    }

    pub fn class(&self) -> OperatorClass {
        use BinaryOp::*;
        match self {
            Or | And => OperatorClass::Logical,
            Equal | NotEqual => OperatorClass::Equality,
            Less | LessEqual | Greater | GreaterEqual => OperatorClass::Relational,
            Add | Sub | Mul | Div | Rem => OperatorClass::Arithmetic,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            Or => "||",
            And => "&&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

impl UnaryOp {
    pub fn from_token(token: TokenKind) -> Option<Self> {
        Some(match token {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return None,
        })
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}
