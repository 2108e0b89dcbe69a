use std::fmt;

use crate::ast::OperatorKind;

/// Source position of a lexeme. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Operator(OperatorKind),
    /// Slot index in the symbol table the identifier was interned into.
    Identifier(usize),
    End,
}

impl TokenKind {
    pub fn is_operator(&self, op: OperatorKind) -> bool {
        matches!(self, TokenKind::Operator(kind) if *kind == op)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(value) => write!(f, "number {value}"),
            TokenKind::Operator(op) => write!(f, "'{}'", op.keyword()),
            TokenKind::Identifier(slot) => write!(f, "identifier #{slot}"),
            TokenKind::End => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
