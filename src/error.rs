use crate::ast::NodeKind;
use thiserror::Error;

/// Every way an expression can be rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("invalid syntax at column {column}: {message}")]
    Syntax { column: usize, message: String },

    #[error("{kind} is not allowed: `{text}`")]
    UnsupportedExpression { kind: NodeKind, text: String },

    #[error("operator `{0}` is not allowed")]
    UnsupportedOperator(String),

    #[error("non-numeric constant {0} is not allowed")]
    UnsupportedConstant(String),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("expression is too long ({length} characters, at most {max} allowed)")]
    TooLong { length: usize, max: usize },

    #[error("expression nests too deeply (at most {max} levels allowed)")]
    TooDeep { max: usize },
}

/// Arithmetic failures of an otherwise valid expression.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer division by zero")]
    FloorDivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("zero cannot be raised to a negative power")]
    ZeroToNegativePower,

    #[error("negative number cannot be raised to a fractional power")]
    ComplexResult,

    #[error("numerical result out of range")]
    Overflow,
}
