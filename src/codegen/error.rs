use thiserror::Error;

use crate::ast::OperatorKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("Operator '{op}' cannot be lowered to assembly")]
    UnsupportedOperator { op: OperatorKind },
    #[error("Malformed '{op}' node: {detail}")]
    MalformedNode {
        op: OperatorKind,
        detail: &'static str,
    },
    #[error("Variable '{name}' (slot {slot}) has no register, only {} are available", super::REGISTER_COUNT)]
    RegisterLimit { name: String, slot: usize },
}

pub type CodegenResult<T> = Result<T, CodegenError>;
