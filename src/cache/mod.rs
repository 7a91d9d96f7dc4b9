//! Cache Module
//!
//! Provides in-memory caching of compiled expressions with idle-time (TTL)
//! tracking and a capacity bound.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::{CacheStats, StatsCounters};
pub use store::CacheStore;

// == Public Constants ==
/// Maximum accepted expression length in bytes
pub const MAX_EXPRESSION_LENGTH: usize = 4096;
