//! Formula Cache - compiled expression cache with idle-time eviction
//!
//! Compiles spreadsheet-style formulas once, keeps the compiled forms keyed
//! by their source text, and evicts forms that sit unused past their TTL.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod expr;
pub mod lifecycle;
pub mod models;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::ServiceError;
pub use lifecycle::CacheRuntime;
pub use service::EvaluationService;
pub use tasks::spawn_reaper;
