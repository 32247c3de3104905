//! A calculator that evaluates arithmetic and nothing else.
//!
//! Expressions may contain numbers, parentheses, unary `+`/`-` and the binary
//! operators `+ - * / ** % //`. Names, calls, comparisons, collections and any
//! other operator are rejected before anything is computed.
//!
//! ```rust
//! use safecalc::{evaluate, EvalError, Number};
//! assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), Number::Integer(512));
//! assert!(matches!(evaluate("__import__('os')"), Err(EvalError::UnsupportedExpression { .. })));
//! ```

pub mod ast;
pub mod error;

pub use ast::{ASTNode, Evaluator, EvaluatorOptions, Number, Parser};
pub use error::{EvalError, MathError};

/// Evaluates `expression` with the default limits.
pub fn evaluate(expression: &str) -> Result<Number, EvalError> {
    Evaluator::default().evaluate_expression(expression)
}
