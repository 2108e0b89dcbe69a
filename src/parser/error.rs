use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected {expected}, found {found} at line {line}, column {column}")]
    Syntax {
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },
    #[error("Variable '{name}' used before declaration at line {line}, column {column}")]
    UndeclaredVariable {
        name: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn location(&self) -> (usize, usize) {
        match self {
            ParseError::Syntax { line, column, .. }
            | ParseError::UndeclaredVariable { line, column, .. } => (*line, *column),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
