//! Expression Errors
//!
//! Failures raised while compiling formula text or evaluating a compiled form.

use thiserror::Error;

// == Parse Error ==
/// Compilation of expression text failed.
///
/// `position` is the byte offset into the expression text where the problem
/// was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

// == Evaluation Error ==
/// A compiled expression could not be evaluated against the given bindings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Expression references a parameter that was not bound
    #[error("missing binding for parameter '{0}'")]
    MissingBinding(String),

    /// Bound value has a shape formulas cannot use (arrays, objects)
    #[error("unsupported value for parameter '{name}': {kind}")]
    UnsupportedBinding { name: String, kind: &'static str },

    /// A value could not be coerced to the type an operation needs
    #[error("cannot convert {found} to {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A function received an argument outside its domain
    #[error("invalid argument to {function}: {reason}")]
    InvalidArgument {
        function: &'static str,
        reason: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    /// Numeric result does not fit the requested integer type
    #[error("number {0} is out of integer range")]
    OutOfRange(f64),
}

impl EvaluationError {
    pub(crate) fn invalid_argument(function: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function,
            reason: reason.into(),
        }
    }
}
