use crate::ast::{ASTNode, Number, Operator, Parser, UnaryOperator};
use crate::error::EvalError;
use log::{debug, trace};

/// Resource limits applied to every expression.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EvaluatorOptions {
    /// Longest accepted input, in characters.
    pub max_length: usize,
    /// Deepest accepted nesting of brackets, prefix operators and `**`.
    pub max_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            max_length: 1000,
            max_depth: 200,
        }
    }
}

/// Walks a syntax tree and computes its value.
///
/// Holds nothing but its options, so one evaluator can serve any number of
/// expressions and threads.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    options: EvaluatorOptions,
}

impl Evaluator {
    pub fn new(options: EvaluatorOptions) -> Self {
        Self { options }
    }

    /// Parse an expression string into an AST.
    pub fn parse_expression(&self, expression: &str) -> Result<ASTNode, EvalError> {
        Parser::parse_expression_with(expression, &self.options)
    }

    /// Parses and evaluates `expression`.
    ///
    /// # Returns
    ///
    /// * `Ok(Number)` if the expression is well formed, whitelisted and its
    ///   arithmetic succeeds.
    /// * `Err(EvalError)` describing the first rejection otherwise.
    pub fn evaluate_expression(&self, expression: &str) -> Result<Number, EvalError> {
        let ast = self.parse_expression(expression)?;
        let result = self.evaluate(&ast);
        debug!("Evaluated {:?} to {:?}", expression, result);
        result
    }

    /// Evaluates a tree, whether it came from the parser or was built by hand.
    ///
    /// The walk keeps its own stack of pending operators, so the shape of the
    /// tree never exhausts the thread's stack. Operands are evaluated left to
    /// right before their operator is looked up.
    pub fn evaluate(&self, ast: &ASTNode) -> Result<Number, EvalError> {
        let mut pending: Vec<Pending> = Vec::new();
        let mut node = ast;

        loop {
            let mut value = loop {
                match node {
                    ASTNode::Constant(constant) => break Number::try_from(constant)?,
                    ASTNode::BinaryOperation {
                        left,
                        operator,
                        right,
                    } => {
                        pending.push(Pending::Left { operator, right });
                        node = left.as_ref();
                    }
                    ASTNode::UnaryOperation { operator, operand } => {
                        pending.push(Pending::Unary(operator));
                        node = operand.as_ref();
                    }
                }
            };

            loop {
                match pending.pop() {
                    None => return Ok(value),
                    Some(Pending::Left { operator, right }) => {
                        pending.push(Pending::Right {
                            operator,
                            left: value,
                        });
                        node = right;
                        break;
                    }
                    Some(Pending::Right { operator, left }) => {
                        value = operator.apply(left, value)?;
                        trace!("{:?} {} .. => {:?}", left, operator.symbol(), value);
                    }
                    Some(Pending::Unary(operator)) => {
                        value = operator.apply(value)?;
                        trace!("{} .. => {:?}", operator.symbol(), value);
                    }
                }
            }
        }
    }
}

/// An operator still waiting for operands during `Evaluator::evaluate`.
enum Pending<'a> {
    /// The left operand is being computed.
    Left {
        operator: &'a Operator,
        right: &'a ASTNode,
    },
    /// The left operand is known and the right one is being computed.
    Right { operator: &'a Operator, left: Number },
    Unary(&'a UnaryOperator),
}
