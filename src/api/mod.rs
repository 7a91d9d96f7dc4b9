//! API Module
//!
//! HTTP handlers and routing for the evaluation service REST API.
//!
//! # Endpoints
//! - `POST /evaluate` - Evaluate an expression against params
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
