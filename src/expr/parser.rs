//! Formula Parser
//!
//! Pratt parser turning formula text into an [`Expr`] tree. Function names
//! and argument counts are validated here, so a successfully parsed formula
//! only fails at evaluation time because of its bindings.

use super::ast::{BinaryOp, Expr, Function, UnaryOp};
use super::error::ParseError;
use super::tokenizer::{Spanned, Token, Tokenizer};
use super::value::Value;

/// Maximum nesting of sub-expressions before the parser gives up
pub const MAX_NESTING_DEPTH: usize = 128;

/// Binding power of infix operators (higher binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Comparison,
    Concat,
    Additive,
    Multiplicative,
    Power,
    Unary,
}

fn infix(token: &Token) -> Option<(Precedence, BinaryOp)> {
    let pair = match token {
        Token::Equal => (Precedence::Comparison, BinaryOp::Equal),
        Token::NotEqual => (Precedence::Comparison, BinaryOp::NotEqual),
        Token::Less => (Precedence::Comparison, BinaryOp::Less),
        Token::LessEqual => (Precedence::Comparison, BinaryOp::LessEqual),
        Token::Greater => (Precedence::Comparison, BinaryOp::Greater),
        Token::GreaterEqual => (Precedence::Comparison, BinaryOp::GreaterEqual),
        Token::Ampersand => (Precedence::Concat, BinaryOp::Concat),
        Token::Plus => (Precedence::Additive, BinaryOp::Add),
        Token::Minus => (Precedence::Additive, BinaryOp::Subtract),
        Token::Star => (Precedence::Multiplicative, BinaryOp::Multiply),
        Token::Slash => (Precedence::Multiplicative, BinaryOp::Divide),
        Token::Caret => (Precedence::Power, BinaryOp::Power),
        _ => return None,
    };
    Some(pair)
}

// == Parse ==
/// Parses a complete formula. A single leading `=` is accepted and ignored.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input)?;
    if matches!(parser.peek(), Some(Token::Equal)) {
        parser.advance()?;
    }
    if parser.current.is_none() {
        return Err(ParseError::new("empty expression", parser.position()));
    }

    let node = parser.parse_expression(Precedence::Lowest)?;
    match parser.current.take() {
        None => Ok(node.expr),
        Some(spanned) => Err(ParseError::new(
            format!("unexpected {} after expression", spanned.token.describe()),
            spanned.position,
        )),
    }
}

/// A parsed sub-tree and its height (a leaf has height 1).
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }

    /// Wraps `expr` over children of height at most `child_height`.
    ///
    /// Fails once the tree is taller than [`MAX_NESTING_DEPTH`]. Operator
    /// chains grow the tree without recursing in the parser, so recursion
    /// depth alone does not bound it.
    fn branch(expr: Expr, child_height: usize, position: usize) -> Result<Self, ParseError> {
        let height = child_height + 1;
        if height > MAX_NESTING_DEPTH {
            return Err(ParseError::new("expression nested too deeply", position));
        }
        Ok(Self { expr, height })
    }
}

struct Parser<'input> {
    tokenizer: Tokenizer<'input>,
    current: Option<Spanned>,
    depth: usize,
}

impl<'input> Parser<'input> {
    fn new(input: &'input str) -> Result<Self, ParseError> {
        let mut tokenizer = Tokenizer::new(input);
        let current = tokenizer.next_token()?;
        Ok(Self {
            tokenizer,
            current,
            depth: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.current.as_ref().map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.current
            .as_ref()
            .map_or(self.tokenizer.end_position(), |s| s.position)
    }

    fn advance(&mut self) -> Result<Option<Spanned>, ParseError> {
        let next = self.tokenizer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.peek() {
            Some(token) if *token == expected => {
                self.advance()?;
                Ok(())
            }
            Some(token) => Err(ParseError::new(
                format!("expected {}, found {}", expected.describe(), token.describe()),
                self.position(),
            )),
            None => Err(ParseError::new(
                format!("expected {}, found end of input", expected.describe()),
                self.position(),
            )),
        }
    }

    fn parse_expression(&mut self, min: Precedence) -> Result<Node, ParseError> {
        // Parentheses recurse without adding tree height
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::new("expression nested too deeply", self.position()));
        }

        let mut left = self.parse_prefix()?;
        while let Some((precedence, op)) = self.peek().and_then(infix) {
            if precedence <= min {
                break;
            }
            let position = self.position();
            self.advance()?;
            // ^ is right associative: let the right side absorb an equal operator
            let right_min = if op == BinaryOp::Power {
                Precedence::Multiplicative
            } else {
                precedence
            };
            let right = self.parse_expression(right_min)?;
            let child_height = left.height.max(right.height);
            left = Node::branch(
                Expr::Binary(op, Box::new(left.expr), Box::new(right.expr)),
                child_height,
                position,
            )?;
        }

        self.depth -= 1;
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Node, ParseError> {
        let position = self.position();
        let spanned = match self.advance()? {
            Some(spanned) => spanned,
            None => return Err(ParseError::new("unexpected end of input", position)),
        };

        match spanned.token {
            Token::Number(n) => Ok(Node::leaf(Expr::Literal(Value::Number(n)))),
            Token::Text(s) => Ok(Node::leaf(Expr::Literal(Value::Text(s)))),
            Token::Minus => self.parse_unary(UnaryOp::Negate, position),
            Token::Plus => self.parse_unary(UnaryOp::Plus, position),
            Token::LeftParen => {
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            Token::Identifier(name) => {
                if matches!(self.peek(), Some(Token::LeftParen)) {
                    self.parse_call(&name, position)
                } else if name.eq_ignore_ascii_case("TRUE") {
                    Ok(Node::leaf(Expr::Literal(Value::Bool(true))))
                } else if name.eq_ignore_ascii_case("FALSE") {
                    Ok(Node::leaf(Expr::Literal(Value::Bool(false))))
                } else {
                    Ok(Node::leaf(Expr::Param(name)))
                }
            }
            other => Err(ParseError::new(
                format!("unexpected {}", other.describe()),
                position,
            )),
        }
    }

    fn parse_unary(&mut self, op: UnaryOp, position: usize) -> Result<Node, ParseError> {
        let operand = self.parse_expression(Precedence::Unary)?;
        Node::branch(
            Expr::Unary(op, Box::new(operand.expr)),
            operand.height,
            position,
        )
    }

    fn parse_call(&mut self, name: &str, position: usize) -> Result<Node, ParseError> {
        let function = Function::from_name(name)
            .ok_or_else(|| ParseError::new(format!("unknown function '{}'", name), position))?;
        self.expect(Token::LeftParen)?;

        let mut args = Vec::new();
        let mut child_height = 0;
        if !matches!(self.peek(), Some(Token::RightParen)) {
            loop {
                let arg = self.parse_expression(Precedence::Lowest)?;
                child_height = child_height.max(arg.height);
                args.push(arg.expr);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RightParen)?;

        if !function.accepts(args.len()) {
            return Err(ParseError::new(
                format!(
                    "{} does not accept {} argument(s)",
                    function.name(),
                    args.len()
                ),
                position,
            ));
        }
        Node::branch(Expr::Call(function, args), child_height, position)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse(r#"CONCAT("Hello ", "World")"#).unwrap();
        assert_eq!(
            expr,
            Expr::Call(
                Function::Concat,
                vec![
                    Expr::Literal(Value::Text("Hello ".to_string())),
                    Expr::Literal(Value::Text("World".to_string())),
                ]
            )
        );
    }

    #[test]
    fn test_parse_accepts_leading_equals() {
        assert_eq!(parse("=1+2").unwrap(), parse("1+2").unwrap());
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                num(1.0),
                Box::new(Expr::Binary(BinaryOp::Multiply, num(2.0), num(3.0)))
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse("2 ^ 3 ^ 2").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Power,
                num(2.0),
                Box::new(Expr::Binary(BinaryOp::Power, num(3.0), num(2.0)))
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let expr = parse("10 - 4 - 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Subtract,
                Box::new(Expr::Binary(BinaryOp::Subtract, num(10.0), num(4.0))),
                num(3.0)
            )
        );
    }

    #[test]
    fn test_parameters_and_booleans() {
        assert_eq!(parse("price").unwrap(), Expr::Param("price".to_string()));
        assert_eq!(parse("true").unwrap(), Expr::Literal(Value::Bool(true)));
    }

    #[test]
    fn test_spreadsheet_formula_cases_parse() {
        let cases = [
            r#"CONCAT("Hello ", "World")"#,
            r#"CONCAT("Hello ", 3.1416)"#,
            r#"CONCAT("Hello ", 42)"#,
            r#"EXACT("Hello", "Hello")"#,
            r#"FIND("l", "Hello", 2)"#,
            r#"FIND("l", "Hello")"#,
            r#"LEFT("Hello World")"#,
            r#"LEFT("Hello World", 5)"#,
        ];
        for case in cases {
            assert!(parse(case).is_ok(), "failed to parse {}", case);
        }
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let err = parse("((invalid").unwrap_err();
        assert!(err.message.contains("')'"), "{}", err);
    }

    #[test]
    fn test_unknown_function() {
        let err = parse("VLOOKUP(1, 2)").unwrap_err();
        assert!(err.message.contains("unknown function"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn test_wrong_arity() {
        let err = parse(r#"EXACT("a")"#).unwrap_err();
        assert!(err.message.contains("EXACT"));
    }

    #[test]
    fn test_trailing_tokens() {
        let err = parse("1 2").unwrap_err();
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_empty_expression() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("=").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_NESTING_DEPTH + 1), ")".repeat(MAX_NESTING_DEPTH + 1));
        let err = parse(&deep).unwrap_err();
        assert!(err.message.contains("nested"));
    }

    #[test]
    fn test_long_operator_chain_is_rejected() {
        // Fits the request size limit but builds a tree 2048 levels deep
        let chain = format!("1{}", "+1".repeat(2047));
        let err = parse(&chain).unwrap_err();
        assert!(err.message.contains("nested"), "{}", err);

        let chain = format!("1{}", "+1".repeat(200_000));
        assert!(parse(&chain).is_err());
    }

    #[test]
    fn test_operator_chain_within_limit() {
        let chain = format!("1{}", "+1".repeat(MAX_NESTING_DEPTH - 1));
        assert!(parse(&chain).is_ok());

        let chain = format!("1{}", "+1".repeat(MAX_NESTING_DEPTH));
        assert!(parse(&chain).is_err());
    }

    #[test]
    fn test_power_tower_is_rejected() {
        let tower = format!("2{}", "^2".repeat(MAX_NESTING_DEPTH * 4));
        let err = parse(&tower).unwrap_err();
        assert!(err.message.contains("nested"), "{}", err);
    }

    #[test]
    fn test_unary_prefix_run_is_rejected() {
        let negations = format!("{}1", "-".repeat(MAX_NESTING_DEPTH * 4));
        let err = parse(&negations).unwrap_err();
        assert!(err.message.contains("nested"), "{}", err);

        assert!(parse("--1").is_ok());
    }

    #[test]
    fn test_nested_calls_count_toward_limit() {
        let calls = format!("{}\"x\"{}", "LEN(".repeat(MAX_NESTING_DEPTH), ")".repeat(MAX_NESTING_DEPTH));
        assert!(parse(&calls).is_err());
    }
}
