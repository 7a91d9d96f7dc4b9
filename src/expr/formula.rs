//! Worksheet Formula Engine
//!
//! [`FormulaCompiler`] parses Excel-style formulas into a [`CompiledFormula`],
//! a tree-walking interpreter over the parsed AST.

use std::sync::Arc;

use super::ast::{BinaryOp, Expr, Function, UnaryOp};
use super::error::{EvaluationError, ParseError};
use super::parser;
use super::value::Value;
use super::{Bindings, CompiledExpression, Compiler};

// == Formula Compiler ==
/// Compiler for the built-in formula language.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaCompiler;

impl FormulaCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for FormulaCompiler {
    fn compile(&self, text: &str) -> Result<Arc<dyn CompiledExpression>, ParseError> {
        let root = parser::parse(text)?;
        Ok(Arc::new(CompiledFormula { root }))
    }
}

// == Compiled Formula ==
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    root: Expr,
}

impl CompiledFormula {
    fn evaluate(&self, bindings: &Bindings) -> Result<Value, EvaluationError> {
        eval(&self.root, bindings)
    }
}

impl CompiledExpression for CompiledFormula {
    fn eval_string(&self, bindings: &Bindings) -> Result<String, EvaluationError> {
        Ok(self.evaluate(bindings)?.to_text())
    }

    fn eval_int(&self, bindings: &Bindings) -> Result<i64, EvaluationError> {
        self.evaluate(bindings)?.to_int()
    }

    fn eval_bool(&self, bindings: &Bindings) -> Result<bool, EvaluationError> {
        self.evaluate(bindings)?.to_bool()
    }
}

// == Interpreter ==
fn eval(expr: &Expr, bindings: &Bindings) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Param(name) => {
            let json = bindings
                .get(name)
                .ok_or_else(|| EvaluationError::MissingBinding(name.clone()))?;
            Value::from_json(name, json)
        }
        Expr::Unary(op, operand) => {
            let n = eval(operand, bindings)?.to_number()?;
            Ok(Value::Number(match op {
                UnaryOp::Negate => -n,
                UnaryOp::Plus => n,
            }))
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, bindings)?;
            let right = eval(right, bindings)?;
            eval_binary(*op, &left, &right)
        }
        Expr::Call(function, args) => call(*function, args, bindings),
    }
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvaluationError> {
    use std::cmp::Ordering;

    let value = match op {
        BinaryOp::Concat => Value::Text(left.to_text() + &right.to_text()),
        BinaryOp::Equal => Value::Bool(left.compare(right) == Ordering::Equal),
        BinaryOp::NotEqual => Value::Bool(left.compare(right) != Ordering::Equal),
        BinaryOp::Less => Value::Bool(left.compare(right) == Ordering::Less),
        BinaryOp::LessEqual => Value::Bool(left.compare(right) != Ordering::Greater),
        BinaryOp::Greater => Value::Bool(left.compare(right) == Ordering::Greater),
        BinaryOp::GreaterEqual => Value::Bool(left.compare(right) != Ordering::Less),
        arithmetic => {
            let (a, b) = (left.to_number()?, right.to_number()?);
            let n = match arithmetic {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide if b == 0.0 => return Err(EvaluationError::DivisionByZero),
                BinaryOp::Divide => a / b,
                BinaryOp::Power => a.powf(b),
                _ => unreachable!("comparison operators handled above"),
            };
            Value::Number(n)
        }
    };
    Ok(value)
}

fn call(function: Function, args: &[Expr], bindings: &Bindings) -> Result<Value, EvaluationError> {
    // IF only evaluates the branch it takes
    if function == Function::If {
        let condition = eval(&args[0], bindings)?.to_bool()?;
        return match (condition, args.get(2)) {
            (true, _) => eval(&args[1], bindings),
            (false, Some(otherwise)) => eval(otherwise, bindings),
            (false, None) => Ok(Value::Bool(false)),
        };
    }

    let values = args
        .iter()
        .map(|arg| eval(arg, bindings))
        .collect::<Result<Vec<_>, _>>()?;

    match function {
        Function::Concat => Ok(Value::Text(values.iter().map(Value::to_text).collect())),
        Function::Exact => Ok(Value::Bool(values[0].to_text() == values[1].to_text())),
        Function::Find => find(&values),
        Function::Left => {
            let count = optional_count(function, values.get(1))?;
            Ok(Value::Text(values[0].to_text().chars().take(count).collect()))
        }
        Function::Right => {
            let text: Vec<char> = values[0].to_text().chars().collect();
            let count = optional_count(function, values.get(1))?.min(text.len());
            Ok(Value::Text(text[text.len() - count..].iter().collect()))
        }
        Function::Mid => {
            let start = values[1].to_int()?;
            if start < 1 {
                return Err(EvaluationError::invalid_argument(
                    "MID",
                    format!("start position {} is less than 1", start),
                ));
            }
            let count = optional_count(function, values.get(2))?;
            Ok(Value::Text(
                values[0]
                    .to_text()
                    .chars()
                    .skip(start as usize - 1)
                    .take(count)
                    .collect(),
            ))
        }
        Function::Len => Ok(Value::Number(values[0].to_text().chars().count() as f64)),
        Function::Upper => Ok(Value::Text(values[0].to_text().to_uppercase())),
        Function::Lower => Ok(Value::Text(values[0].to_text().to_lowercase())),
        Function::Trim => Ok(Value::Text(
            values[0]
                .to_text()
                .split(' ')
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        )),
        Function::And => {
            let mut all = true;
            for value in &values {
                all &= value.to_bool()?;
            }
            Ok(Value::Bool(all))
        }
        Function::Or => {
            let mut any = false;
            for value in &values {
                any |= value.to_bool()?;
            }
            Ok(Value::Bool(any))
        }
        Function::Not => Ok(Value::Bool(!values[0].to_bool()?)),
        Function::If => unreachable!("IF is evaluated lazily above"),
    }
}

/// Character count argument of LEFT/RIGHT/MID; absent means 1.
fn optional_count(function: Function, value: Option<&Value>) -> Result<usize, EvaluationError> {
    let count = match value {
        Some(value) => value.to_int()?,
        None => 1,
    };
    usize::try_from(count).map_err(|_| {
        EvaluationError::invalid_argument(
            function.name(),
            format!("character count {} is negative", count),
        )
    })
}

/// FIND(find_text, within_text, [start_num]): 1-based, case-sensitive.
fn find(values: &[Value]) -> Result<Value, EvaluationError> {
    let needle: Vec<char> = values[0].to_text().chars().collect();
    let haystack: Vec<char> = values[1].to_text().chars().collect();
    let start = match values.get(2) {
        Some(value) => value.to_int()?,
        None => 1,
    };

    if start < 1 || start as usize > haystack.len() + 1 {
        return Err(EvaluationError::invalid_argument(
            "FIND",
            format!("start position {} is outside the text", start),
        ));
    }
    let from = start as usize - 1;
    if needle.is_empty() {
        return Ok(Value::Number(start as f64));
    }

    (from..=haystack.len().saturating_sub(needle.len()))
        .find(|&i| haystack[i..].starts_with(&needle))
        .map(|i| Value::Number((i + 1) as f64))
        .ok_or_else(|| EvaluationError::invalid_argument("FIND", "text not found"))
}
