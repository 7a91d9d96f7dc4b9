//! Formula Values
//!
//! Dynamically typed values and the worksheet-style coercions between them.

use std::cmp::Ordering;

use super::error::EvaluationError;

// == Value ==
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Converts a JSON binding into a formula value.
    ///
    /// `null` behaves like an empty cell (empty text). Arrays and objects
    /// have no formula meaning and are rejected.
    pub fn from_json(name: &str, json: &serde_json::Value) -> Result<Self, EvaluationError> {
        match json {
            serde_json::Value::Null => Ok(Value::Text(String::new())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| {
                EvaluationError::UnsupportedBinding {
                    name: name.to_string(),
                    kind: "number",
                }
            }),
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Array(_) => Err(EvaluationError::UnsupportedBinding {
                name: name.to_string(),
                kind: "array",
            }),
            serde_json::Value::Object(_) => Err(EvaluationError::UnsupportedBinding {
                name: name.to_string(),
                kind: "object",
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Bool(_) => "boolean",
        }
    }

    fn mismatch(&self, expected: &'static str) -> EvaluationError {
        EvaluationError::TypeMismatch {
            expected,
            found: match self {
                Value::Text(s) => format!("{} \"{}\"", self.type_name(), s),
                other => format!("{} {}", other.type_name(), other.to_text()),
            },
        }
    }

    // == Coercions ==
    /// Text form of the value. Whole numbers print without a fraction.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Number(n) => format_number(*n),
        }
    }

    pub fn to_number(&self) -> Result<f64, EvaluationError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().map_err(|_| self.mismatch("number")),
        }
    }

    /// Integer form, truncating toward zero.
    pub fn to_int(&self) -> Result<i64, EvaluationError> {
        let n = self.to_number()?;
        if !n.is_finite() || n >= i64::MAX as f64 || n < i64::MIN as f64 {
            return Err(EvaluationError::OutOfRange(n));
        }
        Ok(n.trunc() as i64)
    }

    pub fn to_bool(&self) -> Result<bool, EvaluationError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            Value::Text(_) => Err(self.mismatch("boolean")),
        }
    }

    // == Comparison ==
    /// Worksheet ordering: numbers sort before text, text before booleans,
    /// and text compares case-insensitively.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Text(a), Value::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Text(_) => 1,
            Value::Bool(_) => 2,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
