//! # Permissable Cache
//!
//! Versioned cache keys and best-effort key/value stores used by the
//! `permissable` authorization engine.
//!
//! ## Overview
//!
//! The permissable-cache crate handles:
//! - **Stores**: The [`CacheStore`] adapter trait plus in-memory, no-op and Redis backends
//! - **Keys**: Key derivation from an entity's type, id and last-modified time
//! - **Invalidation**: A global token whose rotation orphans every existing key
//! - **Cached blobs**: JSON get/set/clear helpers keyed by entity and prefix
//!
//! ## Features
//!
//! - `redis`: Redis-backed store for multi-process deployments
//!
//! ## Key Format
//!
//! ```text
//! [prefix/]{type}{id|nil}-{updated_at epoch seconds}:{token}
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{DateTime, Utc};
//! use permissable_cache::{CacheContext, Cacheable, MemoryStore};
//!
//! struct Invoice { id: u64, updated_at: DateTime<Utc> }
//!
//! impl Cacheable for Invoice {
//!     fn type_name(&self) -> &str { "Invoice" }
//!     fn identifier(&self) -> Option<String> { Some(self.id.to_string()) }
//!     fn last_modified(&self) -> Option<DateTime<Utc>> { Some(self.updated_at) }
//! }
//!
//! let cache = CacheContext::new(Arc::new(MemoryStore::new()));
//! let invoice = Invoice { id: 1, updated_at: Utc::now() };
//!
//! cache.set_cached(&invoice, "totals", &vec![10, 20], None);
//! let totals: Option<Vec<u32>> = cache.get_cached(&invoice, "totals");
//! assert_eq!(totals, Some(vec![10, 20]));
//! ```
//!
//! ## Failure Model
//!
//! Stores never return errors from reads or writes. An unreachable backend,
//! a missing backend, or a payload that fails to decode all look like a
//! cache miss to the caller and are logged through `tracing`.

pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod store;

#[cfg(feature = "redis")]
pub mod redis;

// Re-export main types
pub use config::{CacheConfig, DEFAULT_CACHE_TOKEN, DEFAULT_TTL_SECS};
pub use context::CacheContext;
pub use error::{CacheError, CacheResult, ConfigError};
pub use key::{cache_key, epoch_seconds, permissions_prefix, Cacheable, NIL_IDENTIFIER, NOBODY};
pub use store::{CacheStore, MemoryStore, UnconfiguredStore};

#[cfg(feature = "redis")]
pub use crate::redis::RedisStore;
