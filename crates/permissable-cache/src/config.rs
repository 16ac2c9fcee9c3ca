//! Cache configuration.
//!
//! Configuration is loaded from environment variables with defaults that
//! work without any cache backend (every lookup misses).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default global invalidation token.
pub const DEFAULT_CACHE_TOKEN: &str = "permissable_redis_cache_token";

/// Default entry lifetime: 30 minutes.
pub const DEFAULT_TTL_SECS: u64 = 1800;

/// Permission cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Global invalidation token appended to every key.
    pub token: String,

    /// Entry lifetime in seconds when a write does not specify one.
    pub default_ttl_secs: u64,

    /// Redis connection URL. `None` means no backend is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            token: DEFAULT_CACHE_TOKEN.to_string(),
            default_ttl_secs: DEFAULT_TTL_SECS,
            redis_url: None,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PERMISSABLE_CACHE_TOKEN`: invalidation token (default: permissable_redis_cache_token)
    /// - `PERMISSABLE_CACHE_TTL_SECS`: default TTL in seconds (default: 1800)
    /// - `PERMISSABLE_REDIS_URL`: Redis URL (default: unset, caching disabled)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            token: std::env::var("PERMISSABLE_CACHE_TOKEN").unwrap_or(default.token),
            default_ttl_secs: std::env::var("PERMISSABLE_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.default_ttl_secs),
            redis_url: std::env::var("PERMISSABLE_REDIS_URL")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    /// Builder-style token override.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Builder-style default TTL override.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.default_ttl_secs = ttl_secs;
        self
    }

    /// Default TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Reject values that would make every key collide or every entry
    /// expire on write.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "PERMISSABLE_CACHE_TOKEN".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.default_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PERMISSABLE_CACHE_TTL_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
