//! The Mica lexer.
//!
//! [`Lexer`] turns source text into [`Token`]s, dispatching on the first
//! character of each token. Lexemes are copied into the arena so the source
//! can be dropped once parsing is done. The first lexical error stops the scan.

use bumpalo::Bump;

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};
use mica_core::{LexError, Span};

pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
}

/// Where the token being scanned started.
#[derive(Clone, Copy)]
struct Start {
    line: u32,
    col: u32,
    offset: u32,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
        }
    }

    /// Scan the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token<'ast>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token<'ast>, LexError> {
        self.skip_trivia()?;

        let start = Start {
            line: self.cursor.line(),
            col: self.cursor.column(),
            offset: self.cursor.offset(),
        };

        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", Span::point(start.line, start.col)));
        };

        match c {
            '"' => self.scan_string(start),
            '\'' => self.scan_char(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            c if is_ident_start(c) => Ok(self.scan_identifier(start)),
            _ => self.scan_operator(start),
        }
    }

    // =========================================
    // Whitespace and comments
    // =========================================

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            self.cursor.eat_while(|c| c.is_ascii_whitespace());

            if self.cursor.check_str("//") {
                self.cursor.eat_while(|c| c != '\n');
            } else if self.cursor.check_str("/*") {
                let span = Span::new(self.cursor.line(), self.cursor.column(), 2);
                self.cursor.advance();
                self.cursor.advance();
                loop {
                    if self.cursor.is_eof() {
                        return Err(LexError::UnterminatedComment { span });
                    }
                    if self.cursor.check_str("*/") {
                        self.cursor.advance();
                        self.cursor.advance();
                        break;
                    }
                    self.cursor.advance();
                }
            } else {
                return Ok(());
            }
        }
    }

    fn make_token(&self, kind: TokenKind, start: Start) -> Token<'ast> {
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start.offset));
        Token::new(kind, lexeme, self.span_from(start))
    }

    fn span_from(&self, start: Start) -> Span {
        Span::new(start.line, start.col, self.cursor.offset() - start.offset)
    }

    // =========================================
    // Literals
    // =========================================

    fn scan_string(&mut self, start: Start) -> Result<Token<'ast>, LexError> {
        self.cursor.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => value.push(self.scan_escape()?),
                Some(c) => {
                    self.cursor.advance();
                    value.push(c);
                }
            }
        }
        let lexeme = self.arena.alloc_str(&value);
        Ok(Token::new(TokenKind::StringLiteral, lexeme, self.span_from(start)))
    }

    fn scan_char(&mut self, start: Start) -> Result<Token<'ast>, LexError> {
        self.cursor.advance(); // opening quote
        let value = match self.cursor.peek() {
            None | Some('\n') => {
                return Err(LexError::UnterminatedChar {
                    span: self.span_from(start),
                });
            }
            Some('\'') => {
                self.cursor.advance();
                return Err(LexError::InvalidChar {
                    span: self.span_from(start),
                });
            }
            Some('\\') => self.scan_escape()?,
            Some(c) => {
                self.cursor.advance();
                c
            }
        };
        if !self.cursor.eat('\'') {
            return Err(if self.cursor.check(|c| c != '\n') {
                LexError::InvalidChar {
                    span: self.span_from(start),
                }
            } else {
                LexError::UnterminatedChar {
                    span: self.span_from(start),
                }
            });
        }
        let mut buf = [0u8; 4];
        let lexeme = self.arena.alloc_str(value.encode_utf8(&mut buf));
        Ok(Token::new(TokenKind::CharLiteral, lexeme, self.span_from(start)))
    }

    /// Decode one escape sequence; the cursor sits on the backslash.
    fn scan_escape(&mut self) -> Result<char, LexError> {
        let span = Span::new(self.cursor.line(), self.cursor.column(), 2);
        self.cursor.advance(); // backslash
        let Some(c) = self.cursor.advance() else {
            return Err(LexError::UnterminatedString { span });
        };
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            other => return Err(LexError::InvalidEscape { ch: other, span }),
        })
    }

    /// Scan `123`, `1.5`, `2e10` or `3.0e-2`.
    fn scan_number(&mut self, start: Start) -> Result<Token<'ast>, LexError> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut kind = TokenKind::IntLiteral;

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::DoubleLiteral;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let signed = matches!(self.cursor.peek_nth(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self
                .cursor
                .peek_nth(digit_at)
                .is_some_and(|c| c.is_ascii_digit())
            {
                self.cursor.advance();
                if signed {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
                kind = TokenKind::DoubleLiteral;
            } else {
                self.cursor.advance();
                return Err(LexError::InvalidNumber {
                    span: self.span_from(start),
                    detail: "missing exponent digits".to_string(),
                });
            }
        }

        if self.cursor.check(is_ident_start) {
            self.cursor.eat_while(is_ident_continue);
            return Err(LexError::InvalidNumber {
                span: self.span_from(start),
                detail: format!(
                    "unexpected suffix in '{}'",
                    self.cursor.slice_from(start.offset)
                ),
            });
        }

        Ok(self.make_token(kind, start))
    }

    fn scan_identifier(&mut self, start: Start) -> Token<'ast> {
        let text = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    // =========================================
    // Operators and punctuation
    // =========================================

    fn scan_operator(&mut self, start: Start) -> Result<Token<'ast>, LexError> {
        let Some(c) = self.cursor.advance() else {
            return Ok(self.make_token(TokenKind::Eof, start));
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            (',', _) => TokenKind::Comma,
            (';', _) => TokenKind::Semicolon,
            (':', _) => TokenKind::Colon,
            ('.', _) => TokenKind::Dot,
            ('+', _) => TokenKind::Plus,
            ('-', _) => TokenKind::Minus,
            ('*', _) => TokenKind::Star,
            ('/', _) => TokenKind::Slash,
            ('%', _) => TokenKind::Percent,

            ('=', Some('=')) => {
                self.cursor.advance();
                TokenKind::EqualEqual
            }
            ('=', _) => TokenKind::Equal,
            ('!', Some('=')) => {
                self.cursor.advance();
                TokenKind::BangEqual
            }
            ('!', _) => TokenKind::Bang,
            ('<', Some('=')) => {
                self.cursor.advance();
                TokenKind::LessEqual
            }
            ('<', _) => TokenKind::Less,
            ('>', Some('=')) => {
                self.cursor.advance();
                TokenKind::GreaterEqual
            }
            ('>', _) => TokenKind::Greater,
            ('&', Some('&')) => {
                self.cursor.advance();
                TokenKind::AmpAmp
            }
            ('|', Some('|')) => {
                self.cursor.advance();
                TokenKind::PipePipe
            }

            (ch, _) => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    span: self.span_from(start),
                });
            }
        };

        Ok(self.make_token(kind, start))
    }
}
