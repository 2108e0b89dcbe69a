use thiserror::Error;

use crate::symbols::SymbolError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}' at line {line}, column {column}")]
    UnexpectedCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("Invalid number literal '{literal}' at line {line}, column {column}")]
    InvalidNumber {
        literal: String,
        line: usize,
        column: usize,
    },
    #[error("{source} at line {line}, column {column}")]
    SymbolTable {
        source: SymbolError,
        line: usize,
        column: usize,
    },
}

impl LexError {
    pub fn location(&self) -> (usize, usize) {
        match self {
            LexError::UnexpectedCharacter { line, column, .. }
            | LexError::InvalidNumber { line, column, .. }
            | LexError::SymbolTable { line, column, .. } => (*line, *column),
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
