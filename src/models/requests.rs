//! Request DTOs for the evaluation API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::MAX_EXPRESSION_LENGTH;
use crate::expr::Bindings;

/// Request body for the EVALUATE operation (POST /evaluate)
///
/// # Fields
/// - `expression`: Formula text, used verbatim as the cache key
/// - `output_type`: One of `string`, `int`, `boolean`
/// - `params`: Parameter bindings (defaults to none)
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    /// The formula to evaluate
    pub expression: String,
    /// Requested result type
    pub output_type: String,
    /// Values for parameters referenced by the formula
    #[serde(default)]
    pub params: Bindings,
}

impl EvaluateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.expression.trim().is_empty() {
            return Some("Expression cannot be empty".to_string());
        }
        if self.expression.len() > MAX_EXPRESSION_LENGTH {
            return Some(format!(
                "Expression exceeds maximum length of {} bytes",
                MAX_EXPRESSION_LENGTH
            ));
        }
        None
    }
}
