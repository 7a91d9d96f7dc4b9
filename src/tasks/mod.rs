//! Background Tasks Module
//!
//! Contains background tasks that run alongside request handling.
//!
//! # Tasks
//! - Reaper: evicts compiled expressions idle longer than their TTL

mod reaper;

pub use reaper::{spawn_reaper, sweep_expired, ReaperHandle};
