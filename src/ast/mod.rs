use crate::error::EvalError;
use std::fmt;

mod evaluator;
mod number;
mod parser;

pub use evaluator::*;
pub use number::*;
pub use parser::ExpressionParser as Parser;

/// A syntax tree for a single arithmetic expression.
///
/// Only three node kinds exist. Names, calls, comparisons and collection
/// displays have no representation here; the parser rejects them while it
/// builds the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNode {
    Constant(Constant),
    BinaryOperation {
        left: Box<ASTNode>,
        operator: Operator,
        right: Box<ASTNode>,
    },
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<ASTNode>,
    },
}

impl ASTNode {
    pub fn integer(value: i64) -> Self {
        ASTNode::Constant(Constant::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        ASTNode::Constant(Constant::Float(value))
    }

    pub fn binary(left: ASTNode, operator: Operator, right: ASTNode) -> Self {
        ASTNode::BinaryOperation {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn unary(operator: UnaryOperator, operand: ASTNode) -> Self {
        ASTNode::UnaryOperation {
            operator,
            operand: Box::new(operand),
        }
    }
}

/// A literal as written in the source.
///
/// Only `Integer` and `Float` evaluate; the rest are rejected by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    None,
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(value) => write!(f, "{}", Number::Integer(*value)),
            Constant::Float(value) => write!(f, "{}", Number::Float(*value)),
            Constant::Boolean(true) => f.write_str("True"),
            Constant::Boolean(false) => f.write_str("False"),
            Constant::Text(text) => write!(f, "'{}'", text),
            Constant::None => f.write_str("None"),
        }
    }
}

impl TryFrom<&Constant> for Number {
    type Error = EvalError;

    fn try_from(value: &Constant) -> Result<Self, Self::Error> {
        match value {
            Constant::Integer(value) => Ok(Number::Integer(*value)),
            Constant::Float(value) => Ok(Number::Float(*value)),
            Constant::Boolean(_) | Constant::Text(_) | Constant::None => {
                Err(EvalError::UnsupportedConstant(value.to_string()))
            }
        }
    }
}

/// Constructs the parser recognizes only in order to reject them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Name,
    Call,
    Attribute,
    Subscript,
    Comparison,
    BoolOp,
    List,
    Tuple,
    Dict,
    Set,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Name => "name reference",
            NodeKind::Call => "function call",
            NodeKind::Attribute => "attribute access",
            NodeKind::Subscript => "subscript",
            NodeKind::Comparison => "comparison",
            NodeKind::BoolOp => "boolean operation",
            NodeKind::List => "list",
            NodeKind::Tuple => "tuple",
            NodeKind::Dict => "dict",
            NodeKind::Set => "set",
        };
        f.write_str(name)
    }
}

/// Binary operators the tokenizer knows about.
///
/// The first seven are arithmetic; `apply` is the whitelist and refuses the rest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,
    FloorDivide,
    MatrixMultiply,
    LeftShift,
    RightShift,
    BitAnd,
    BitOr,
    BitXor,
}

impl Operator {
    pub fn apply(&self, left: Number, right: Number) -> Result<Number, EvalError> {
        match self {
            Operator::Add => Ok((left + right)?),
            Operator::Subtract => Ok((left - right)?),
            Operator::Multiply => Ok((left * right)?),
            Operator::Divide => Ok((left / right)?),
            Operator::Power => Ok(left.pow(right)?),
            Operator::Modulo => Ok((left % right)?),
            Operator::FloorDivide => Ok(left.floor_div(right)?),
            Operator::MatrixMultiply
            | Operator::LeftShift
            | Operator::RightShift
            | Operator::BitAnd
            | Operator::BitOr
            | Operator::BitXor => Err(EvalError::UnsupportedOperator(self.symbol().to_string())),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "**",
            Operator::Modulo => "%",
            Operator::FloorDivide => "//",
            Operator::MatrixMultiply => "@",
            Operator::LeftShift => "<<",
            Operator::RightShift => ">>",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = EvalError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Subtract),
            "*" => Ok(Operator::Multiply),
            "/" => Ok(Operator::Divide),
            "**" => Ok(Operator::Power),
            "%" => Ok(Operator::Modulo),
            "//" => Ok(Operator::FloorDivide),
            "@" => Ok(Operator::MatrixMultiply),
            "<<" => Ok(Operator::LeftShift),
            ">>" => Ok(Operator::RightShift),
            "&" => Ok(Operator::BitAnd),
            "|" => Ok(Operator::BitOr),
            "^" => Ok(Operator::BitXor),
            _ => Err(EvalError::UnsupportedOperator(value.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Invert,
    Not,
}

impl UnaryOperator {
    pub fn apply(&self, operand: Number) -> Result<Number, EvalError> {
        match self {
            UnaryOperator::Plus => Ok(operand),
            UnaryOperator::Minus => Ok((-operand)?),
            UnaryOperator::Invert | UnaryOperator::Not => {
                Err(EvalError::UnsupportedOperator(self.symbol().to_string()))
            }
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Invert => "~",
            UnaryOperator::Not => "not",
        }
    }
}

impl TryFrom<&str> for UnaryOperator {
    type Error = EvalError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(UnaryOperator::Plus),
            "-" => Ok(UnaryOperator::Minus),
            "~" => Ok(UnaryOperator::Invert),
            "not" => Ok(UnaryOperator::Not),
            _ => Err(EvalError::UnsupportedOperator(value.to_string())),
        }
    }
}
