//! Tree-walking evaluator used by the simplifier as a constant-folding oracle.
//!
//! Generated programs never run through here: they execute on the stack
//! machine. Values compare with an absolute tolerance of [`EPSILON`].

use thiserror::Error;

use crate::ast::{Node, OperatorKind};
use crate::symbols::SymbolTable;

pub const EPSILON: f64 = 1e-6;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Negative argument {argument} for '{op}'")]
    NegativeArgument { op: OperatorKind, argument: f64 },
    #[error("Invalid logarithm base {base}")]
    BadBase { base: f64 },
    #[error("Operator '{op}' cannot be evaluated")]
    UnknownOperator { op: OperatorKind },
}

pub type EvalResult<T> = Result<T, EvalError>;

/// True when `node` contains no variable. Absent children and `Empty` count as
/// constant.
pub fn is_constant(node: &Node) -> bool {
    match node {
        Node::Number(_) | Node::Empty => true,
        Node::Variable(_) => false,
        Node::Operator { left, right, .. } => {
            left.as_deref().is_none_or(is_constant) && right.as_deref().is_none_or(is_constant)
        }
    }
}

/// Value of `node`. Variables read their current value from `symbols`;
/// absent children and `Empty` evaluate to 0.
pub fn evaluate(node: &Node, symbols: &SymbolTable) -> EvalResult<f64> {
    match node {
        Node::Number(value) => Ok(*value),
        Node::Variable(slot) => Ok(symbols.value(*slot).unwrap_or_default()),
        Node::Empty => Ok(0.0),
        Node::Operator { op, left, right } => {
            let left = match left.as_deref() {
                Some(node) => evaluate(node, symbols)?,
                None => 0.0,
            };
            let right = match right.as_deref() {
                Some(node) => evaluate(node, symbols)?,
                None => 0.0,
            };
            apply(*op, left, right)
        }
    }
}

/// Applies one operator. Unary functions take their operand from `right`;
/// `Log` reads the base from `left`.
pub fn apply(op: OperatorKind, left: f64, right: f64) -> EvalResult<f64> {
    match op {
        OperatorKind::Add => Ok(left + right),
        OperatorKind::Sub => Ok(left - right),
        OperatorKind::Mul => Ok(left * right),
        OperatorKind::Div => {
            if approx_eq(right, 0.0) {
                return Err(EvalError::DivisionByZero);
            }
            Ok(left / right)
        }
        OperatorKind::Pow => Ok(left.powf(right)),
        OperatorKind::Ln => {
            if right < 0.0 {
                return Err(EvalError::NegativeArgument {
                    op,
                    argument: right,
                });
            }
            Ok(right.ln())
        }
        OperatorKind::Log => {
            if right < 0.0 {
                return Err(EvalError::NegativeArgument {
                    op,
                    argument: right,
                });
            }
            if left < 0.0 || approx_eq(left, 1.0) {
                return Err(EvalError::BadBase { base: left });
            }
            Ok(right.ln() / left.ln())
        }
        OperatorKind::Sqrt => {
            if right < 0.0 {
                return Err(EvalError::NegativeArgument {
                    op,
                    argument: right,
                });
            }
            Ok(right.sqrt())
        }
        OperatorKind::Sin => Ok(right.sin()),
        OperatorKind::Cos => Ok(right.cos()),
        _ => Err(EvalError::UnknownOperator { op }),
    }
}
