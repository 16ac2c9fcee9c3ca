//! Cache context: a store, the invalidation token and the default TTL.
//!
//! The context is the explicit replacement for process-wide cache state.
//! Build one at startup and share it (usually behind an `Arc`) with every
//! authorizer that should cache through the same store.

use crate::config::{CacheConfig, DEFAULT_CACHE_TOKEN, DEFAULT_TTL_SECS};
use crate::error::CacheResult;
use crate::key::{cache_key, Cacheable};
use crate::store::{CacheStore, UnconfiguredStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared cache state for permission lookups and cached blobs.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use permissable_cache::{CacheContext, MemoryStore};
///
/// let cache = CacheContext::new(Arc::new(MemoryStore::new()));
/// assert_eq!(cache.token(), "permissable_redis_cache_token");
///
/// // Invalidate everything written so far
/// cache.rotate_token("deploy-42");
/// assert_eq!(cache.token(), "deploy-42");
/// ```
#[derive(Debug)]
pub struct CacheContext {
    /// Backing store
    store: Arc<dyn CacheStore>,

    /// Global invalidation token
    token: RwLock<String>,

    /// Lifetime for writes that don't specify one
    default_ttl_secs: u64,
}

impl Default for CacheContext {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl CacheContext {
    /// Create a context over `store` with the default token and TTL.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            token: RwLock::new(DEFAULT_CACHE_TOKEN.to_string()),
            default_ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Context with no backend; every read misses and every write fails.
    pub fn unconfigured() -> Self {
        Self::new(Arc::new(UnconfiguredStore::new()))
    }

    /// Build a context from configuration.
    ///
    /// Opens a Redis store when `redis_url` is set, otherwise falls back to
    /// the unconfigured store.
    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        config.validate()?;

        let store: Arc<dyn CacheStore> = match config.redis_url.as_deref() {
            Some(url) => open_redis(url)?,
            None => Arc::new(UnconfiguredStore::new()),
        };

        Ok(Self::new(store)
            .with_token(config.token.clone())
            .with_default_ttl(config.default_ttl_secs))
    }

    /// Builder-style token override.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(token.into()),
            ..self
        }
    }

    /// Builder-style default TTL override.
    pub fn with_default_ttl(self, ttl_secs: u64) -> Self {
        Self {
            default_ttl_secs: ttl_secs,
            ..self
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Current global invalidation token.
    pub fn token(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the invalidation token, orphaning every existing key.
    pub fn rotate_token(&self, token: impl Into<String>) {
        let token = token.into();
        tracing::info!(token = %token, "Rotated permission cache token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Default TTL in seconds.
    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Derive the key for `subject` under the current token.
    pub fn cache_key<C: Cacheable + ?Sized>(&self, subject: &C, prefix: Option<&str>) -> String {
        cache_key(subject, prefix, &self.token())
    }

    /// JSON-encode `data` and store it under `subject`'s key.
    ///
    /// # Arguments
    ///
    /// * `subject` - Entity the value belongs to
    /// * `prefix` - Namespace within the entity's keys
    /// * `data` - Value to encode
    /// * `ttl_secs` - Lifetime, or `None` for the configured default
    ///
    /// # Returns
    ///
    /// `true` if the store accepted the write
    pub fn set_cached<C, T>(&self, subject: &C, prefix: &str, data: &T, ttl_secs: Option<u64>) -> bool
    where
        C: Cacheable + ?Sized,
        T: Serialize + ?Sized,
    {
        let key = self.cache_key(subject, Some(prefix));
        let payload = match serde_json::to_string(data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, cache_key = %key, "Failed to encode cache payload");
                return false;
            }
        };

        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let stored = self.store.set_with_expiry(&key, ttl, &payload);
        tracing::debug!(cache_key = %key, ttl, stored, "Cache write");
        stored
    }

    /// Read and decode the value stored under `subject`'s key.
    ///
    /// Missing entries and payloads that don't decode as `T` both return
    /// `None`.
    pub fn get_cached<C, T>(&self, subject: &C, prefix: &str) -> Option<T>
    where
        C: Cacheable + ?Sized,
        T: DeserializeOwned,
    {
        let key = self.cache_key(subject, Some(prefix));
        let Some(payload) = self.store.get(&key) else {
            tracing::debug!(cache_key = %key, "Cache miss");
            return None;
        };

        match serde_json::from_str(&payload) {
            Ok(value) => {
                tracing::debug!(cache_key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, cache_key = %key, "Discarding malformed cache payload");
                None
            }
        }
    }

    /// Delete the value stored under `subject`'s key.
    pub fn clear_cached<C: Cacheable + ?Sized>(&self, subject: &C, prefix: &str) -> bool {
        let key = self.cache_key(subject, Some(prefix));
        self.store.delete(&key)
    }
}

#[cfg(feature = "redis")]
fn open_redis(url: &str) -> CacheResult<Arc<dyn CacheStore>> {
    Ok(Arc::new(crate::redis::RedisStore::open(url)?))
}

#[cfg(not(feature = "redis"))]
fn open_redis(_url: &str) -> CacheResult<Arc<dyn CacheStore>> {
    Err(crate::error::CacheError::Unsupported(
        "redis (rebuild with the `redis` feature)".to_string(),
    ))
}
