//! API Handlers
//!
//! HTTP request handlers for each evaluation service endpoint.

use axum::{extract::State, Json};
use tracing::warn;

use crate::error::{Result, ServiceError};
use crate::models::{EvaluateRequest, EvaluateResponse, HealthResponse, StatsResponse};
use crate::service::EvaluationService;

/// Application state shared across all handlers.
///
/// The service is cheap to clone; all clones share one store.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: EvaluationService,
}

impl AppState {
    pub fn new(service: EvaluationService) -> Self {
        Self { service }
    }
}

/// Handler for POST /evaluate
///
/// Compiles (or reuses) the expression and evaluates it against the
/// request's params.
pub async fn evaluate_handler(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    let result = state
        .service
        .evaluate(&req.expression, &req.output_type, &req.params)
        .await;

    match result {
        Ok(value) => Ok(Json(EvaluateResponse::new(value))),
        Err(err @ ServiceError::Parse(_)) => {
            warn!(expression = %req.expression, "Rejected expression: {}", err);
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.service.stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
