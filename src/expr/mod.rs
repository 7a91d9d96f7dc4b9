//! Expression Module
//!
//! The narrow interfaces the cache consumes ([`Compiler`] and
//! [`CompiledExpression`]) plus a built-in worksheet formula engine that
//! implements them.

mod ast;
mod error;
mod formula;
mod parser;
mod tokenizer;
mod value;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

pub use error::{EvaluationError, ParseError};
pub use formula::{CompiledFormula, FormulaCompiler};
pub use parser::MAX_NESTING_DEPTH;

/// Parameter name to dynamically typed value, supplied per evaluation.
pub type Bindings = HashMap<String, serde_json::Value>;

// == Compiled Expression ==
/// A parsed, ready-to-evaluate expression.
///
/// Implementations are immutable once built and shared between concurrent
/// evaluations.
pub trait CompiledExpression: Send + Sync + fmt::Debug {
    fn eval_string(&self, bindings: &Bindings) -> Result<String, EvaluationError>;
    fn eval_int(&self, bindings: &Bindings) -> Result<i64, EvaluationError>;
    fn eval_bool(&self, bindings: &Bindings) -> Result<bool, EvaluationError>;
}

// == Compiler ==
/// Turns expression text into a [`CompiledExpression`].
///
/// Must be a deterministic function of the text with no side effects.
pub trait Compiler: Send + Sync {
    fn compile(&self, text: &str) -> Result<Arc<dyn CompiledExpression>, ParseError>;
}

// == Output Type ==
/// Result type a caller asks an expression to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    String,
    Int,
    Boolean,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputType::String => "string",
            OutputType::Int => "int",
            OutputType::Boolean => "boolean",
        }
    }
}

/// The requested name was not one of `string`, `int`, `boolean`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOutputType(pub String);

impl FromStr for OutputType {
    type Err = UnknownOutputType;

    /// Names are matched exactly; `"String"` or `"bool"` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(OutputType::String),
            "int" => Ok(OutputType::Int),
            "boolean" => Ok(OutputType::Boolean),
            other => Err(UnknownOutputType(other.to_string())),
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Typed Value ==
/// Result of evaluating an expression as a particular [`OutputType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl TypedValue {
    pub fn output_type(&self) -> OutputType {
        match self {
            TypedValue::String(_) => OutputType::String,
            TypedValue::Int(_) => OutputType::Int,
            TypedValue::Bool(_) => OutputType::Boolean,
        }
    }
}
