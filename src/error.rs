//! Error types for the evaluation service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::expr::{EvaluationError, ParseError, UnknownOutputType};

// == Service Error Enum ==
/// Unified error type for expression evaluation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Expression text failed to compile; nothing was cached
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Requested output type is not one of string, int, boolean
    #[error("unsupported output type '{0}': expected one of string, int, boolean")]
    UnsupportedType(String),

    /// The compiled expression could not be evaluated against the bindings
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<UnknownOutputType> for ServiceError {
    fn from(err: UnknownOutputType) -> Self {
        ServiceError::UnsupportedType(err.0)
    }
}

impl ServiceError {
    /// HTTP status the hosting layer reports for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Parse(_) => StatusCode::BAD_REQUEST,
            ServiceError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            ServiceError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (self.status_code(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the evaluation service.
pub type Result<T> = std::result::Result<T, ServiceError>;
