//! Token types for the Mica lexer.

use mica_core::Span;
use std::fmt;

/// A token from the source code.
///
/// `lexeme` lives in the AST arena. For string and character literals it
/// holds the decoded contents (escapes resolved, quotes stripped).
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Identifier => format!("identifier '{}'", self.lexeme),
            TokenKind::StringLiteral => format!("\"{}\"", self.lexeme),
            TokenKind::CharLiteral => format!("'{}'", self.lexeme),
            TokenKind::IntLiteral | TokenKind::DoubleLiteral => self.lexeme.to_string(),
            kind => format!("'{}'", kind.description()),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    IntLiteral,
    DoubleLiteral,
    /// `'a'`, `'\n'`
    CharLiteral,
    /// `"text"`
    StringLiteral,

    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Class,
    Void,
    Int,
    Double,
    Char,
    Bool,
    String,
    If,
    Else,
    While,
    For,
    Switch,
    Case,
    Default,
    Break,
    Return,
    Read,
    Write,
    New,
    True,
    False,
    Null,

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,

    // =========================================
    // Delimiters
    // =========================================
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    Eof,
}

impl TokenKind {
    /// Keywords that name a built-in type.
    pub fn is_primitive_type(self) -> bool {
        use TokenKind::*;
        matches!(self, Int | Double | Char | Bool | String)
    }

    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntLiteral | DoubleLiteral | CharLiteral | StringLiteral | True | False | Null
        )
    }

    /// Tokens that can begin a factor. Used to tell `(T) x` casts apart from
    /// parenthesized names.
    pub fn starts_factor(self) -> bool {
        use TokenKind::*;
        self.is_literal() || matches!(self, Identifier | LeftParen | New | Bang)
    }

    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            DoubleLiteral => "double literal",
            CharLiteral => "character literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Class => "class",
            Void => "void",
            Int => "int",
            Double => "double",
            Char => "char",
            Bool => "bool",
            String => "string",
            If => "if",
            Else => "else",
            While => "while",
            For => "for",
            Switch => "switch",
            Case => "case",
            Default => "default",
            Break => "break",
            Return => "return",
            Read => "read",
            Write => "write",
            New => "new",
            True => "true",
            False => "false",
            Null => "null",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Equal => "=",
            EqualEqual => "==",
            BangEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            AmpAmp => "&&",
            PipePipe => "||",
            Bang => "!",
            LeftParen => "(",
            RightParen => ")",
            LeftBrace => "{",
            RightBrace => "}",
            LeftBracket => "[",
            RightBracket => "]",
            Comma => ",",
            Semicolon => ";",
            Colon => ":",
            Dot => ".",
            Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Map an identifier to its keyword token, if it is one.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "class" => Class,
        "void" => Void,
        "int" => Int,
        "double" => Double,
        "char" => Char,
        "bool" => Bool,
        "string" => String,
        "if" => If,
        "else" => Else,
        "while" => While,
        "for" => For,
        "switch" => Switch,
        "case" => Case,
        "default" => Default,
        "break" => Break,
        "return" => Return,
        "read" => Read,
        "write" => Write,
        "new" => New,
        "true" => True,
        "false" => False,
        "null" => Null,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_resolve() {
        assert_eq!(lookup_keyword("while"), Some(TokenKind::While));
        assert_eq!(lookup_keyword("string"), Some(TokenKind::String));
        assert_eq!(lookup_keyword("len"), None);
        assert_eq!(lookup_keyword("While"), None);
    }

    #[test]
    fn classification() {
        assert!(TokenKind::Double.is_primitive_type());
        assert!(!TokenKind::Void.is_primitive_type());
        assert!(TokenKind::Null.is_literal());
        assert!(TokenKind::Identifier.starts_factor());
        assert!(!TokenKind::Minus.starts_factor());
    }

    #[test]
    fn describe_tokens() {
        let tok = Token::new(TokenKind::Identifier, "count", Span::new(1, 1, 5));
        assert_eq!(tok.describe(), "identifier 'count'");
        let semi = Token::new(TokenKind::Semicolon, ";", Span::new(1, 6, 1));
        assert_eq!(semi.describe(), "';'");
    }
}
