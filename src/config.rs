//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default idle time before a compiled expression may be evicted
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
/// Default maximum number of cached expressions
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
/// Default HTTP server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Idle time after which a cached expression is eligible for eviction
    pub default_ttl: Duration,
    /// How often the reaper sweeps for idle expressions
    pub reaper_interval: Duration,
    /// Maximum number of compiled expressions held at once
    pub max_entries: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Idle TTL in seconds (default: 30)
    /// - `REAPER_INTERVAL_SECS` - Reaper cadence in seconds (default: the TTL)
    /// - `MAX_ENTRIES` - Maximum cached expressions (default: 10000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Missing, unparsable, or zero values fall back to the defaults.
    pub fn from_env() -> Self {
        let default_ttl = positive_var::<u64>("CACHE_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TTL);
        let reaper_interval = positive_var::<u64>("REAPER_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(default_ttl);

        Self {
            default_ttl,
            reaper_interval,
            max_entries: positive_var("MAX_ENTRIES").unwrap_or(DEFAULT_MAX_ENTRIES),
            server_port: positive_var("SERVER_PORT").unwrap_or(DEFAULT_SERVER_PORT),
        }
    }

    /// Sets the TTL and, as by default, a reaper interval equal to it.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self.reaper_interval = ttl;
        self
    }

    pub fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = interval;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

fn positive_var<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            reaper_interval: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}
