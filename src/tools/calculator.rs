//! Safe arithmetic evaluation tool.
//!
//! The input is tokenized and parsed into a restricted expression tree
//! before anything is evaluated: only numeric literals, unary sign, the
//! binary operators `+ - * / **`, and parentheses exist in the grammar.
//! Identifiers, calls, and every other construct fail tokenization with
//! [`ToolError::InvalidExpression`] and never reach the evaluator.
//!
//! Precedence follows the usual rules: `**` binds tightest and is
//! right-associative (and binds tighter than unary sign on its left, so
//! `-2**2 == -4` while `2**-3` still parses), then unary sign, then
//! `*`/`/`, then `+`/`-`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::tool::{Tool, ToolResult};

/// Tool that evaluates arithmetic expressions without executing code.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

/// Arguments for the calculator tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorArgs {
    /// The arithmetic expression to evaluate.
    pub expression: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    StarStar,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy)]
enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// A parsed arithmetic expression. Constructing one is the only way input
/// reaches [`eval`], so the allow-list is enforced before evaluation.
#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

fn tokenize(input: &str) -> ToolResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let start = offset;
                let mut end = offset;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let value = literal.parse::<f64>().map_err(|_| {
                    ToolError::invalid_expression(format!("malformed number literal {literal:?}"))
                })?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, d)| d == '*') {
                    chars.next();
                    tokens.push(Token::StarStar);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            _ => {
                return Err(ToolError::invalid_expression(format!(
                    "unexpected character {c:?} at offset {offset}"
                )));
            }
        }
    }

    Ok(tokens)
}

/// Recursive descent parser over the token stream.
///
/// Grammar:
///
/// ```text
/// expr  := term (('+' | '-') term)*
/// term  := unary (('*' | '/') unary)*
/// unary := ('+' | '-') unary | power
/// power := atom ('**' unary)?
/// atom  := NUMBER | '(' expr ')'
/// ```
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn parse(mut self) -> ToolResult<Expr> {
        let expr = self.expr()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(ToolError::invalid_expression(format!(
                "unexpected trailing token {token:?}"
            ))),
        }
    }

    fn expr(&mut self) -> ToolResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> ToolResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ToolResult<Expr> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                Ok(Expr::unary(UnaryOp::Plus, self.unary()?))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::unary(UnaryOp::Minus, self.unary()?))
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> ToolResult<Expr> {
        let base = self.atom()?;
        if self.peek() == Some(Token::StarStar) {
            self.pos += 1;
            // Right-associative; the exponent may carry its own sign.
            let exponent = self.unary()?;
            Ok(Expr::binary(BinaryOp::Pow, base, exponent))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> ToolResult<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ToolError::invalid_expression("missing closing parenthesis")),
                }
            }
            Some(token) => Err(ToolError::invalid_expression(format!(
                "unexpected token {token:?}"
            ))),
            None => Err(ToolError::invalid_expression("unexpected end of expression")),
        }
    }
}

fn eval(expr: &Expr) -> ToolResult<f64> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Unary { op, operand } => {
            let value = eval(operand)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = eval(lhs)?;
            let r = eval(rhs)?;
            match op {
                BinaryOp::Add => Ok(l + r),
                BinaryOp::Sub => Ok(l - r),
                BinaryOp::Mul => Ok(l * r),
                BinaryOp::Div => {
                    if r == 0.0 {
                        Err(ToolError::arithmetic("division by zero"))
                    } else {
                        Ok(l / r)
                    }
                }
                BinaryOp::Pow => {
                    if l == 0.0 && r < 0.0 {
                        Err(ToolError::arithmetic(
                            "zero cannot be raised to a negative power",
                        ))
                    } else {
                        Ok(l.powf(r))
                    }
                }
            }
        }
    }
}

/// Evaluate an arithmetic expression string.
///
/// # Errors
///
/// Returns [`ToolError::InvalidExpression`] for anything outside the
/// grammar and [`ToolError::Arithmetic`] for evaluation faults (division
/// by zero, non-finite results).
pub fn evaluate(input: &str) -> ToolResult<f64> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ToolError::invalid_expression("empty expression"));
    }
    let expr = Parser::new(tokens).parse()?;
    let value = eval(&expr)?;
    if !value.is_finite() {
        return Err(ToolError::arithmetic("result is not a finite number"));
    }
    Ok(value)
}

/// Format a result for display: integral values print without a trailing
/// fraction (`14`, not `14.0`).
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    const NAME: &'static str = "calculator";
    type Args = CalculatorArgs;
    type Output = f64;
    type Error = ToolError;

    fn description(&self) -> String {
        "Evaluates an arithmetic expression. Supports numbers, + - * / ** operators, \
         unary sign, and parentheses; anything else is rejected."
            .to_owned()
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The arithmetic expression to evaluate, e.g. \"2 + 3 * 4\""
                }
            },
            "required": ["expression"]
        })
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        evaluate(&args.expression)
    }
}
