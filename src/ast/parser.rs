use crate::ast::{ASTNode, Constant, EvaluatorOptions, NodeKind, Operator, UnaryOperator};
use crate::error::{EvalError, MathError};
use log::{debug, trace};
use pest::error::{Error as PestError, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "ast/expression.pest"]
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parses `input` with the default limits.
    pub fn parse_expression(input: &str) -> Result<ASTNode, EvalError> {
        Self::parse_expression_with(input, &EvaluatorOptions::default())
    }

    /// Parses `input` into a tree made only of constants and unary/binary
    /// operations, enforcing the length and nesting limits of `options`.
    ///
    /// Operator chains such as `1 + 2 + 3` fold to the left without nesting;
    /// only brackets, prefix operators and `**` count toward `max_depth`.
    pub fn parse_expression_with(
        input: &str,
        options: &EvaluatorOptions,
    ) -> Result<ASTNode, EvalError> {
        debug!("Parsing expression: {}", input);
        let length = input.chars().count();
        if length > options.max_length {
            return Err(EvalError::TooLong {
                length,
                max: options.max_length,
            });
        }
        if nesting_depth(input) > options.max_depth {
            return Err(EvalError::TooDeep {
                max: options.max_depth,
            });
        }

        let mut pairs = ExpressionParser::parse(Rule::expression, input).map_err(syntax_error)?;
        let expression = next_pair(&mut pairs, input)?;
        let mut inner = expression.into_inner();
        let ast = Self::build_disjunction(next_pair(&mut inner, input)?)?;
        debug!("Parsed tree: {:?}", ast);
        Ok(ast)
    }

    fn build_disjunction(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let node = Self::build_conjunction(next_pair(&mut pairs, text)?)?;
        if pairs.next().is_some() {
            return Err(unsupported(NodeKind::BoolOp, text));
        }
        Ok(node)
    }

    fn build_conjunction(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let node = Self::build_inversion(next_pair(&mut pairs, text)?)?;
        if pairs.next().is_some() {
            return Err(unsupported(NodeKind::BoolOp, text));
        }
        Ok(node)
    }

    fn build_inversion(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let first = next_pair(&mut pairs, text)?;
        if first.as_rule() == Rule::NOT {
            let operand = Self::build_inversion(next_pair(&mut pairs, text)?)?;
            return Ok(ASTNode::unary(UnaryOperator::Not, operand));
        }
        Self::build_comparison(first)
    }

    fn build_comparison(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let node = Self::build_binary_chain(next_pair(&mut pairs, text)?)?;
        if pairs.next().is_some() {
            return Err(unsupported(NodeKind::Comparison, text));
        }
        Ok(node)
    }

    /// Folds `operand (operator operand)*` to the left. Shared by the bitwise,
    /// arithmetic and term levels, whose operators all map through
    /// `Operator::try_from`.
    fn build_binary_chain(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        trace!("Building {:?}: {}", pair.as_rule(), pair.as_str());
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let mut node = Self::build_operand(next_pair(&mut pairs, text)?)?;

        while let Some(operator_pair) = pairs.next() {
            let operator = Operator::try_from(operator_pair.as_str())?;
            let right = Self::build_operand(next_pair(&mut pairs, text)?)?;
            node = ASTNode::binary(node, operator, right);
        }

        Ok(node)
    }

    fn build_operand(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        match pair.as_rule() {
            Rule::arithmetic | Rule::term => Self::build_binary_chain(pair),
            Rule::factor => Self::build_factor(pair),
            rule => Err(unexpected(rule, &pair)),
        }
    }

    fn build_factor(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let first = next_pair(&mut pairs, text)?;
        match first.as_rule() {
            Rule::PLUS | Rule::MINUS | Rule::TILDE => {
                let operator = UnaryOperator::try_from(first.as_str())?;
                let operand = Self::build_factor(next_pair(&mut pairs, text)?)?;
                Ok(ASTNode::unary(operator, operand))
            }
            Rule::power => Self::build_power(first),
            rule => Err(unexpected(rule, &first)),
        }
    }

    /// `primary ** factor`; the exponent is a factor, which makes `**` right
    /// associative and lets it bind tighter than a sign on its left.
    fn build_power(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let base = Self::build_primary(next_pair(&mut pairs, text)?)?;
        match pairs.next() {
            Some(_pow) => {
                let exponent = Self::build_factor(next_pair(&mut pairs, text)?)?;
                Ok(ASTNode::binary(base, Operator::Power, exponent))
            }
            None => Ok(base),
        }
    }

    fn build_primary(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        let atom = next_pair(&mut pairs, text)?;
        if let Some(trailer) = pairs.next() {
            let kind = match trailer.as_rule() {
                Rule::call => NodeKind::Call,
                Rule::attribute => NodeKind::Attribute,
                Rule::subscript => NodeKind::Subscript,
                rule => return Err(unexpected(rule, &trailer)),
            };
            return Err(unsupported(kind, text));
        }
        Self::build_atom(atom)
    }

    fn build_atom(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        trace!("Building atom {:?}: {}", pair.as_rule(), pair.as_str());
        match pair.as_rule() {
            Rule::number => build_number(pair),
            Rule::string => {
                let quoted = pair.as_str();
                let text = &quoted[1..quoted.len() - 1];
                Ok(ASTNode::Constant(Constant::Text(text.to_string())))
            }
            Rule::boolean => Ok(ASTNode::Constant(Constant::Boolean(
                pair.as_str() == "True",
            ))),
            Rule::none => Ok(ASTNode::Constant(Constant::None)),
            Rule::parenthesized => Self::build_parenthesized(pair),
            Rule::identifier => Err(unsupported(NodeKind::Name, pair.as_str())),
            Rule::list => Err(unsupported(NodeKind::List, pair.as_str())),
            Rule::braced => Err(braced_error(pair)),
            rule => Err(unexpected(rule, &pair)),
        }
    }

    /// `(expression)` is a group; `()`, `(a,)` and `(a, b)` are tuples.
    fn build_parenthesized(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
        let text = pair.as_str();
        let mut pairs = pair.into_inner();
        match (pairs.next(), pairs.next()) {
            (Some(inner), None) if inner.as_rule() == Rule::disjunction => {
                Self::build_disjunction(inner)
            }
            _ => Err(unsupported(NodeKind::Tuple, text)),
        }
    }
}

/// `{}` and `{k: v}` are dicts, `{a, b}` is a set. Mixing both entry forms is
/// not valid in either.
fn braced_error(pair: Pair<Rule>) -> EvalError {
    let column = column_of(&pair);
    let text = pair.as_str();
    let mut keyed = 0usize;
    let mut plain = 0usize;
    for entry in pair.into_inner().filter(|p| p.as_rule() == Rule::braced_entry) {
        if entry.into_inner().any(|p| p.as_rule() == Rule::COLON) {
            keyed += 1;
        } else {
            plain += 1;
        }
    }
    match (keyed, plain) {
        (_, 0) => unsupported(NodeKind::Dict, text),
        (0, _) => unsupported(NodeKind::Set, text),
        _ => EvalError::Syntax {
            column,
            message: "dict and set entries cannot be mixed".to_string(),
        },
    }
}

fn build_number(pair: Pair<Rule>) -> Result<ASTNode, EvalError> {
    let column = column_of(&pair);
    let text = pair.as_str();
    let literal = next_pair(&mut pair.into_inner(), text)?;
    match literal.as_rule() {
        // The grammar only admits digits, so the one way to fail is range.
        Rule::integer => literal.as_str().parse::<i64>().map(ASTNode::integer).map_err(|_| {
            debug!("Integer literal out of range: {}", literal.as_str());
            EvalError::Math(MathError::Overflow)
        }),
        Rule::float => literal
            .as_str()
            .parse::<f64>()
            .map(ASTNode::float)
            .map_err(|e| EvalError::Syntax {
                column,
                message: format!("invalid float literal {}: {}", literal.as_str(), e),
            }),
        rule => Err(unexpected(rule, &literal)),
    }
}

/// Estimates how deep the grammar recurses for `input`, without running it.
///
/// Every open bracket is one level, and so is every prefix operator (`+`,
/// `-`, `~`, `not`) and every `**` in a chain that has not been closed by a
/// left-folding operator such as `+` or `*`. Quoted text is skipped.
fn nesting_depth(input: &str) -> usize {
    // Chain length per open bracket; the first entry is the top level.
    let mut chains = vec![0usize];
    let mut chained = 0usize;
    let mut deepest = 0usize;
    let mut after_operand = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let mut link = false;
        match c {
            '(' | '[' | '{' => {
                chains.push(0);
                after_operand = false;
            }
            ')' | ']' | '}' => {
                if chains.len() > 1 {
                    chained -= chains.pop().unwrap_or(0);
                }
                after_operand = true;
            }
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                link = true;
                after_operand = false;
            }
            '+' | '-' | '~' if !after_operand => link = true,
            '\'' | '"' => {
                let mut escaped = false;
                for next in chars.by_ref() {
                    match next {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        _ if next == c => break,
                        _ => {}
                    }
                }
                after_operand = true;
            }
            c if c.is_ascii_digit()
                || (c == '.' && chars.peek().is_some_and(|n| n.is_ascii_digit())) =>
            {
                let mut previous = c;
                while let Some(&next) = chars.peek() {
                    let in_literal = next.is_ascii_alphanumeric() || next == '.' || next == '_';
                    let exponent_sign = matches!(next, '+' | '-') && matches!(previous, 'e' | 'E');
                    if !(in_literal || exponent_sign) {
                        break;
                    }
                    previous = next;
                    chars.next();
                }
                after_operand = true;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !(next.is_alphanumeric() || next == '_') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                match word.as_str() {
                    "not" => {
                        link = true;
                        after_operand = false;
                    }
                    "and" | "or" => {
                        reset_chain(&mut chains, &mut chained);
                        after_operand = false;
                    }
                    _ => after_operand = true,
                }
            }
            c if c.is_whitespace() => {}
            '.' => after_operand = false,
            _ => {
                reset_chain(&mut chains, &mut chained);
                after_operand = false;
            }
        }
        if link {
            if let Some(chain) = chains.last_mut() {
                *chain += 1;
                chained += 1;
            }
        }
        deepest = deepest.max(chains.len() - 1 + chained);
    }
    deepest
}

fn reset_chain(chains: &mut [usize], chained: &mut usize) {
    if let Some(chain) = chains.last_mut() {
        *chained -= *chain;
        *chain = 0;
    }
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, text: &str) -> Result<Pair<'i, Rule>, EvalError> {
    pairs.next().ok_or_else(|| EvalError::Syntax {
        column: text.chars().count() + 1,
        message: "unexpected end of expression".to_string(),
    })
}

fn unsupported(kind: NodeKind, text: &str) -> EvalError {
    EvalError::UnsupportedExpression {
        kind,
        text: text.trim().to_string(),
    }
}

fn unexpected(rule: Rule, pair: &Pair<Rule>) -> EvalError {
    debug!("Unexpected rule {:?}: {}", rule, pair.as_str());
    EvalError::Syntax {
        column: column_of(pair),
        message: format!("unexpected {}", describe_rule(&rule)),
    }
}

fn column_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().1
}

fn syntax_error(error: PestError<Rule>) -> EvalError {
    let error = error.renamed_rules(describe_rule);
    let column = match error.line_col {
        LineColLocation::Pos((_, column)) => column,
        LineColLocation::Span((_, column), _) => column,
    };
    EvalError::Syntax {
        column,
        message: error.variant.message().into_owned(),
    }
}

fn describe_rule(rule: &Rule) -> String {
    let name = match rule {
        Rule::EOI => "end of input",
        Rule::number | Rule::float | Rule::integer => "number",
        Rule::string => "string",
        Rule::identifier => "name",
        Rule::disjunction
        | Rule::conjunction
        | Rule::inversion
        | Rule::comparison
        | Rule::bitwise
        | Rule::arithmetic
        | Rule::term
        | Rule::factor
        | Rule::power
        | Rule::primary => "expression",
        Rule::comparison_operator => "comparison operator",
        Rule::PLUS => "`+`",
        Rule::MINUS => "`-`",
        Rule::STAR => "`*`",
        Rule::SLASH => "`/`",
        Rule::FLOOR_DIV => "`//`",
        Rule::MOD => "`%`",
        Rule::POW => "`**`",
        Rule::AT => "`@`",
        Rule::TILDE => "`~`",
        Rule::LEFT_SHIFT => "`<<`",
        Rule::RIGHT_SHIFT => "`>>`",
        Rule::AMPERSAND => "`&`",
        Rule::PIPE => "`|`",
        Rule::CARET => "`^`",
        Rule::AND => "`and`",
        Rule::OR => "`or`",
        Rule::NOT => "`not`",
        Rule::parenthesized | Rule::call => "`(`",
        Rule::list | Rule::subscript => "`[`",
        Rule::braced => "`{`",
        Rule::braced_entry => "expression",
        Rule::COMMA => "`,`",
        Rule::COLON => "`:`",
        Rule::attribute => "`.`",
        _ => return format!("{:?}", rule),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn parse(input: &str) -> ASTNode {
        ExpressionParser::parse_expression(input).unwrap()
    }

    fn parse_err(input: &str) -> EvalError {
        ExpressionParser::parse_expression(input).unwrap_err()
    }

    fn int(value: i64) -> ASTNode {
        ASTNode::integer(value)
    }

    #[test]
    fn test_single_number() {
        assert_eq!(parse("42"), int(42));
        assert_eq!(parse("  7  "), int(7));
        assert_eq!(parse("0"), int(0));
        assert_eq!(parse("3.25"), ASTNode::float(3.25));
        assert_eq!(parse(".5"), ASTNode::float(0.5));
        assert_eq!(parse("5."), ASTNode::float(5.0));
        assert_eq!(parse("1e3"), ASTNode::float(1000.0));
        assert_eq!(parse("2.5E-1"), ASTNode::float(0.25));
    }

    #[test]
    fn test_precedence() {
        let expected = ASTNode::binary(
            int(2),
            Operator::Add,
            ASTNode::binary(int(3), Operator::Multiply, int(4)),
        );
        assert_eq!(parse("2 + 3 * 4"), expected);
    }

    #[test]
    fn test_grouped_expression() {
        let expected = ASTNode::binary(
            ASTNode::binary(int(2), Operator::Add, int(3)),
            Operator::Multiply,
            int(4),
        );
        assert_eq!(parse("(2 + 3) * 4"), expected);
        assert_eq!(parse("((7))"), int(7));
    }

    #[test]
    fn test_left_associativity() {
        let expected = ASTNode::binary(
            ASTNode::binary(int(8), Operator::Subtract, int(3)),
            Operator::Subtract,
            int(2),
        );
        assert_eq!(parse("8 - 3 - 2"), expected);

        let expected = ASTNode::binary(
            ASTNode::binary(int(8), Operator::FloorDivide, int(3)),
            Operator::Modulo,
            int(2),
        );
        assert_eq!(parse("8 // 3 % 2"), expected);
    }

    #[test]
    fn test_power_is_right_associative() {
        let expected = ASTNode::binary(
            int(2),
            Operator::Power,
            ASTNode::binary(int(3), Operator::Power, int(2)),
        );
        assert_eq!(parse("2 ** 3 ** 2"), expected);
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        let expected = ASTNode::unary(
            UnaryOperator::Minus,
            ASTNode::binary(int(2), Operator::Power, int(2)),
        );
        assert_eq!(parse("-2 ** 2"), expected);

        let expected = ASTNode::binary(
            int(2),
            Operator::Power,
            ASTNode::unary(UnaryOperator::Minus, int(1)),
        );
        assert_eq!(parse("2 ** -1"), expected);
    }

    #[test]
    fn test_unary_chain() {
        let expected = ASTNode::binary(
            int(1),
            Operator::Subtract,
            ASTNode::unary(
                UnaryOperator::Minus,
                ASTNode::unary(UnaryOperator::Plus, int(2)),
            ),
        );
        assert_eq!(parse("1 - -+2"), expected);
    }

    #[test]
    fn test_operators_without_spaces() {
        let expected = ASTNode::binary(
            ASTNode::binary(int(7), Operator::FloorDivide, int(2)),
            Operator::Multiply,
            ASTNode::binary(int(3), Operator::Power, int(2)),
        );
        assert_eq!(parse("7//2*3**2"), expected);
    }

    #[test]
    fn test_non_arithmetic_operators_reach_the_tree() {
        assert_eq!(
            parse("1 << 2"),
            ASTNode::binary(int(1), Operator::LeftShift, int(2))
        );
        assert_eq!(
            parse("1 @ 2"),
            ASTNode::binary(int(1), Operator::MatrixMultiply, int(2))
        );
        assert_eq!(parse("~1"), ASTNode::unary(UnaryOperator::Invert, int(1)));
        assert_eq!(parse("not 1"), ASTNode::unary(UnaryOperator::Not, int(1)));
    }

    #[test]
    fn test_non_numeric_literals_reach_the_tree() {
        assert_eq!(
            parse("'os'"),
            ASTNode::Constant(Constant::Text("os".to_string()))
        );
        assert_eq!(parse("True"), ASTNode::Constant(Constant::Boolean(true)));
        assert_eq!(parse("None"), ASTNode::Constant(Constant::None));
    }

    #[test]
    fn test_names_and_calls_are_rejected() {
        assert_eq!(
            parse_err("x + 1"),
            EvalError::UnsupportedExpression {
                kind: NodeKind::Name,
                text: "x".to_string()
            }
        );
        assert_eq!(
            parse_err("f()"),
            EvalError::UnsupportedExpression {
                kind: NodeKind::Call,
                text: "f()".to_string()
            }
        );
        assert_eq!(
            parse_err("__import__('os')"),
            EvalError::UnsupportedExpression {
                kind: NodeKind::Call,
                text: "__import__('os')".to_string()
            }
        );
        assert!(matches!(
            parse_err("(1).real"),
            EvalError::UnsupportedExpression {
                kind: NodeKind::Attribute,
                ..
            }
        ));
        assert!(matches!(
            parse_err("[1, 2][0]"),
            EvalError::UnsupportedExpression {
                kind: NodeKind::Subscript,
                ..
            }
        ));
    }

    #[test]
    fn test_disallowed_constructs_are_named() {
        let cases = [
            ("1 < 2", NodeKind::Comparison),
            ("1 == 1", NodeKind::Comparison),
            ("1 and 2", NodeKind::BoolOp),
            ("1 or 2", NodeKind::BoolOp),
            ("[1, 2]", NodeKind::List),
            ("(1, 2)", NodeKind::Tuple),
            ("()", NodeKind::Tuple),
            ("{}", NodeKind::Dict),
            ("{1: 2}", NodeKind::Dict),
            ("{1, 2}", NodeKind::Set),
            ("{1,}", NodeKind::Set),
            ("(1,)", NodeKind::Tuple),
            ("((1, 2))", NodeKind::Tuple),
            ("-(1, 2) + 3", NodeKind::Tuple),
            ("1 + lambda", NodeKind::Name),
        ];
        for (input, kind) in cases {
            match parse_err(input) {
                EvalError::UnsupportedExpression { kind: found, .. } => {
                    assert_eq!(found, kind, "{}", input)
                }
                other => panic!("{}: expected {:?}, got {:?}", input, kind, other),
            }
        }
    }

    #[test]
    fn test_invalid_syntax() {
        for input in [
            "",
            "   ",
            "1 +",
            "* 2",
            "(1 + 2",
            "1 + 2)",
            "2 3",
            "2x",
            "x = 1",
            "1 *** 2",
            "007",
            "1 $ 2",
            "lambda: 1",
        ] {
            assert!(
                matches!(parse_err(input), EvalError::Syntax { .. }),
                "{:?} should be a syntax error",
                input
            );
        }
    }

    #[test]
    fn test_mixed_braced_entries() {
        assert!(matches!(
            parse_err("{1: 2, 3}"),
            EvalError::Syntax { column: 1, .. }
        ));
    }

    #[test]
    fn test_nested_brackets_parse_in_linear_time() {
        let started = Instant::now();
        let cases = [
            (
                format!("{}1{}", "{".repeat(40), "}".repeat(40)),
                NodeKind::Set,
            ),
            (
                format!("{}1{}", "(".repeat(40), ",)".repeat(40)),
                NodeKind::Tuple,
            ),
            (
                format!("{}1{}", "{".repeat(40), ": 2}".repeat(40)),
                NodeKind::Dict,
            ),
        ];
        for (input, kind) in cases {
            match parse_err(&input) {
                EvalError::UnsupportedExpression { kind: found, .. } => assert_eq!(found, kind),
                other => panic!("{}: expected {:?}, got {:?}", input, kind, other),
            }
        }
        assert_eq!(parse(&format!("{}1{}", "(".repeat(40), ")".repeat(40))), int(1));
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_syntax_error_reports_column() {
        match parse_err("1 + ") {
            EvalError::Syntax { column, message } => {
                assert_eq!(column, 5);
                assert!(message.contains("expected"), "{}", message);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_literal_too_large() {
        assert_eq!(
            parse_err("99999999999999999999"),
            EvalError::Math(MathError::Overflow)
        );
        assert_eq!(
            parse_err("1 + 99999999999999999999"),
            EvalError::Math(MathError::Overflow)
        );
        assert_eq!(parse("9223372036854775807"), int(i64::MAX));
    }

    #[test]
    fn test_huge_float_literal_is_infinite() {
        assert_eq!(parse("1e999"), ASTNode::float(f64::INFINITY));
    }

    #[test]
    fn test_length_limit() {
        let options = EvaluatorOptions {
            max_length: 5,
            ..EvaluatorOptions::default()
        };
        assert_eq!(
            ExpressionParser::parse_expression_with("1 + 2 + 3", &options),
            Err(EvalError::TooLong {
                length: 9,
                max: 5
            })
        );
        assert!(ExpressionParser::parse_expression_with("1 + 2", &options).is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let options = EvaluatorOptions {
            max_depth: 10,
            ..EvaluatorOptions::default()
        };
        let nested = format!("{}1{}", "(".repeat(11), ")".repeat(11));
        assert_eq!(
            ExpressionParser::parse_expression_with(&nested, &options),
            Err(EvalError::TooDeep { max: 10 })
        );
        let signs = format!("{}1", "-".repeat(11));
        assert_eq!(
            ExpressionParser::parse_expression_with(&signs, &options),
            Err(EvalError::TooDeep { max: 10 })
        );
        let powers = vec!["2"; 12].join(" ** ");
        assert_eq!(
            ExpressionParser::parse_expression_with(&powers, &options),
            Err(EvalError::TooDeep { max: 10 })
        );
        let negations = format!("{}1", "not ".repeat(11));
        assert_eq!(
            ExpressionParser::parse_expression_with(&negations, &options),
            Err(EvalError::TooDeep { max: 10 })
        );
        let chain = vec!["1"; 50].join(" + ");
        assert!(ExpressionParser::parse_expression_with(&chain, &options).is_ok());
        let shallow = format!("{}1{}", "(".repeat(9), ")".repeat(9));
        assert_eq!(
            ExpressionParser::parse_expression_with(&shallow, &options),
            Ok(int(1))
        );
    }

    #[test]
    fn test_deep_brackets_are_refused_before_parsing() {
        let nested = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        let options = EvaluatorOptions {
            max_length: usize::MAX,
            ..EvaluatorOptions::default()
        };
        assert!(matches!(
            ExpressionParser::parse_expression_with(&nested, &options),
            Err(EvalError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_long_chains_are_refused_before_parsing() {
        let options = EvaluatorOptions {
            max_length: 200_000,
            ..EvaluatorOptions::default()
        };
        let powers = format!("{}1", "1**".repeat(30_000));
        assert_eq!(
            ExpressionParser::parse_expression_with(&powers, &options),
            Err(EvalError::TooDeep { max: 200 })
        );
        let negations = format!("{}1", "not ".repeat(30_000));
        assert_eq!(
            ExpressionParser::parse_expression_with(&negations, &options),
            Err(EvalError::TooDeep { max: 200 })
        );
    }

    #[test]
    fn test_nesting_depth_estimate() {
        assert_eq!(nesting_depth("1 + 2"), 0);
        assert_eq!(nesting_depth("1 + 2 - 3 * 4 // 5"), 0);
        assert_eq!(nesting_depth("((1))"), 2);
        assert_eq!(nesting_depth("--1"), 2);
        assert_eq!(nesting_depth("-1 - -1"), 1);
        assert_eq!(nesting_depth("(- -(1))"), 4);
        assert_eq!(nesting_depth("2 ** 3 ** 2"), 2);
        assert_eq!(nesting_depth("2 ** 3 * 2 ** 3"), 1);
        assert_eq!(nesting_depth("not not 1"), 2);
        assert_eq!(nesting_depth("1e-5 ** 2"), 1);
        assert_eq!(nesting_depth("'((((' + 1"), 0);
    }
}
