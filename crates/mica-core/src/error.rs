//! Error types for every phase of Mica compilation and execution.
//!
//! ```text
//! MicaError (top-level wrapper)
//! ├── LexError      - tokenization errors
//! ├── ParseError    - syntax errors, fatal before analysis
//! ├── Diagnostics   - accumulated semantic errors
//! ├── CodeGenError  - internal invariant violations during generation
//! └── RuntimeError  - failures while executing an artifact
//! ```
//!
//! Every user-facing message renders as `<Kind>: <message> (line L, column C)`.

use std::fmt;

use thiserror::Error;

use crate::{Span, SymbolHash};

// ============================================================================
// Lexer Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated character literal")]
    UnterminatedChar { span: Span },

    #[error("character literal must hold exactly one character")]
    InvalidChar { span: Span },

    #[error("unterminated comment")]
    UnterminatedComment { span: Span },

    #[error("invalid escape sequence '\\{ch}'")]
    InvalidEscape { ch: char, span: Span },

    #[error("invalid number: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedChar { span } => *span,
            LexError::InvalidChar { span } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidEscape { span, .. } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    ExpectedToken,
    UnexpectedToken,
    UnexpectedEof,
    ExpectedExpression,
    ExpectedType,
    ExpectedStatement,
    ExpectedDeclaration,
    ExpectedIdentifier,
    /// Initializers are only allowed on local declarations.
    InvalidInitializer,
    InvalidLiteral,
    /// Surfaced from the lexer.
    Lexical,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::InvalidInitializer => "invalid initializer",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::Lexical => "lexical error",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A syntax error. The parser stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("SyntaxError: {message} {}", span.location())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            span,
            "unexpected end of file",
        )
    }

    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }

    /// Render the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        render_with_source(&self.to_string(), self.span, source)
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lexical, err.span(), err.to_string())
    }
}

// ============================================================================
// Semantic Diagnostics
// ============================================================================

/// Kinds of semantic error reported by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UndeclaredIdentifier,
    DuplicateDeclaration,
    TypeMismatch,
    ArityMismatch,
    IllegalBreak,
    MissingReturn,
    InvalidCast,
    DuplicateCaseLabel,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UndeclaredIdentifier => "UndeclaredIdentifier",
            DiagnosticKind::DuplicateDeclaration => "DuplicateDeclaration",
            DiagnosticKind::TypeMismatch => "TypeMismatch",
            DiagnosticKind::ArityMismatch => "ArityMismatch",
            DiagnosticKind::IllegalBreak => "IllegalBreak",
            DiagnosticKind::MissingReturn => "MissingReturn",
            DiagnosticKind::InvalidCast => "InvalidCast",
            DiagnosticKind::DuplicateCaseLabel => "DuplicateCaseLabel",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One semantic error. Analysis keeps going after recording it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message} {}", span.location())]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn display_with_source(&self, source: &str) -> String {
        render_with_source(&self.to_string(), self.span, source)
    }
}

/// Diagnostics in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

// ============================================================================
// Code Generation Errors
// ============================================================================

/// An internal defect found while generating code.
///
/// Generation only runs on diagnostics-free programs, so any of these means
/// the analyzer and the generator disagree. The first one aborts generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodeGenError {
    #[error("CodeGenError: unresolved symbol '{name}' {}", span.location())]
    UnresolvedSymbol { name: String, span: Span },

    #[error("CodeGenError: expression has no resolved type {}", span.location())]
    MissingType { span: Span },

    #[error("CodeGenError: '{name}' is not a storage location {}", span.location())]
    InvalidTarget { name: String, span: Span },

    #[error("CodeGenError: break outside loop or switch {}", span.location())]
    BreakOutsideBreakable { span: Span },

    #[error("CodeGenError: label {label} in '{method}' was never placed")]
    UnboundLabel { method: String, label: u32 },

    #[error("CodeGenError: method '{method}' has too many {what}")]
    LimitExceeded { method: String, what: &'static str },

    #[error("CodeGenError: failed to write artifact '{path}': {message}")]
    Artifact { path: String, message: String },

    #[error("CodeGenError: program still has {count} diagnostic(s)")]
    HasDiagnostics { count: usize },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while executing an artifact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("division by zero (line {line})")]
    DivisionByZero { line: u32 },

    #[error("null reference (line {line})")]
    NullReference { line: u32 },

    #[error("index {index} out of bounds for length {len} (line {line})")]
    IndexOutOfBounds { index: i32, len: usize, line: u32 },

    #[error("negative array size {size} (line {line})")]
    NegativeArraySize { size: i32, line: u32 },

    #[error("cannot allocate an array of {size} elements (line {line})")]
    ArrayTooLarge { size: i32, line: u32 },

    #[error("cannot read '{input}' as {expected}")]
    InvalidInput { input: String, expected: String },

    #[error("unexpected end of input while reading {expected}")]
    EndOfInput { expected: String },

    #[error("no entry point: declare 'void main()'")]
    NoEntryPoint,

    #[error("call to unknown method {0}")]
    UnknownFunction(SymbolHash),

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("call stack overflow at depth {depth} (line {line})")]
    StackOverflow { depth: usize, line: u32 },

    #[error("invalid opcode {0:#04x}")]
    InvalidOpcode(u8),

    #[error("corrupt module: {0}")]
    CorruptModule(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Io(err.to_string())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Any error the Mica pipeline can produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MicaError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Semantic(#[from] Diagnostics),

    #[error(transparent)]
    CodeGen(#[from] CodeGenError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl MicaError {
    pub fn is_parse(&self) -> bool {
        matches!(self, MicaError::Lex(_) | MicaError::Parse(_))
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, MicaError::Semantic(_))
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, MicaError::Runtime(_))
    }
}

fn render_with_source(header: &str, span: Span, source: &str) -> String {
    let mut output = format!("{header}\n");
    if let Some(line_text) = source.lines().nth((span.line as usize).saturating_sub(1)) {
        output.push_str("  |\n");
        output.push_str(&format!("{:>3} | {}\n", span.line, line_text));
        let indent = " ".repeat((span.col as usize).saturating_sub(1));
        let pointer = if span.len <= 1 {
            "^".to_string()
        } else {
            "^".to_string() + &"~".repeat((span.len - 1) as usize)
        };
        output.push_str(&format!("  | {indent}{pointer}\n"));
    }
    output
}
