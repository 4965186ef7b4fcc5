//! Configuration Module
//!
//! Handles loading cache manager configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default staleness threshold: five minutes.
pub const DEFAULT_STALE_AFTER_MS: i64 = 300_000;

/// Cache manager configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Root directory for durable per-identity stores, None = in-memory stores
    pub store_dir: Option<PathBuf>,
    /// Staleness threshold in milliseconds used when a caller supplies none
    pub default_stale_after_ms: i64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_STORE_DIR` - Directory for durable stores (default: unset, in-memory)
    /// - `CACHE_STALE_AFTER_MS` - Staleness threshold in ms (default: 300000)
    pub fn from_env() -> Self {
        Self {
            store_dir: env::var("CACHE_STORE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            default_stale_after_ms: env::var("CACHE_STALE_AFTER_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_STALE_AFTER_MS),
        }
    }

    /// Returns a copy of this config that keeps stores under `dir`.
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }

    /// Returns a copy of this config with a different staleness threshold.
    pub fn with_stale_after_ms(mut self, stale_after_ms: i64) -> Self {
        self.default_stale_after_ms = stale_after_ms;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            default_stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }
}
