//! Key/value store adapters
//!
//! This module provides the store abstraction the permission cache writes
//! through, plus the two in-process implementations. Stores are best-effort:
//! every operation reports success with a boolean or an `Option` and never
//! returns an error to the caller.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Key/value store with per-key expiry.
///
/// Implementations must be safe to share across threads. A failed
/// operation is reported as `false` / `None` and logged by the store.
pub trait CacheStore: Send + Sync + Debug {
    /// Store `value` under `key`, expiring after `ttl_secs` seconds.
    fn set_with_expiry(&self, key: &str, ttl_secs: u64, value: &str) -> bool;

    /// Fetch the value stored under `key`, if present and not expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Remove `key`. Returns `true` if the store acknowledged the delete.
    fn delete(&self, key: &str) -> bool;
}

/// Store used when no cache backend has been configured.
///
/// Every operation is a no-op that logs a warning and returns the failure
/// sentinel, so caching degrades to "always miss".
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredStore;

impl UnconfiguredStore {
    /// Create the no-op store.
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for UnconfiguredStore {
    fn set_with_expiry(&self, key: &str, _ttl_secs: u64, _value: &str) -> bool {
        tracing::warn!(cache_key = %key, op = "set_with_expiry", "Cache store not configured, required by permissable");
        false
    }

    fn get(&self, key: &str) -> Option<String> {
        tracing::warn!(cache_key = %key, op = "get", "Cache store not configured, required by permissable");
        None
    }

    fn delete(&self, key: &str) -> bool {
        tracing::warn!(cache_key = %key, op = "delete", "Cache store not configured, required by permissable");
        false
    }
}

/// A stored value with its expiry.
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    ttl_secs: u64,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process store with per-entry expiry.
///
/// Suitable for single-process deployments and tests. Expired entries are
/// dropped when they are read and swept from the whole map on every write.
///
/// # Example
///
/// ```
/// use permissable_cache::{CacheStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// assert!(store.set_with_expiry("greeting", 60, "\"hello\""));
/// assert_eq!(store.get("greeting").as_deref(), Some("\"hello\""));
/// assert!(store.delete("greeting"));
/// assert!(store.get("greeting").is_none());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Check if the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The TTL the live entry under `key` was written with.
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_secs)
    }

    /// Keys of all live entries, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl CacheStore for MemoryStore {
    fn set_with_expiry(&self, key: &str, ttl_secs: u64, value: &str) -> bool {
        let now = Instant::now();
        let entry = MemoryEntry {
            value: value.to_string(),
            ttl_secs,
            expires_at: now + Duration::from_secs(ttl_secs),
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Keys embed entity versions and the token, so stale keys are never read again
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(key.to_string(), entry);
        true
    }

    fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        None
    }

    fn delete(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unconfigured_store_always_fails() {
        let store = UnconfiguredStore::new();
        assert!(store.get("asdf").is_none());
        assert!(!store.set_with_expiry("asdf", 1800, "{}"));
        assert!(!store.delete("asdf"));
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        assert!(store.set_with_expiry("a", 1800, "1"));
        assert_eq!(store.get("a"), Some("1".to_string()));
        assert_eq!(store.ttl_of("a"), Some(1800));
        assert_eq!(store.len(), 1);

        assert!(store.set_with_expiry("a", 60, "2"));
        assert_eq!(store.get("a"), Some("2".to_string()));
        assert_eq!(store.ttl_of("a"), Some(60));
    }

    #[test]
    fn test_memory_store_zero_ttl_expires_immediately() {
        let store = MemoryStore::new();
        store.set_with_expiry("gone", 0, "x");
        assert!(store.get("gone").is_none());
        assert!(store.ttl_of("gone").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_delete_missing_key() {
        let store = MemoryStore::new();
        assert!(store.delete("never-set"));
    }

    #[test]
    fn test_memory_store_keys_sorted() {
        let store = MemoryStore::new();
        store.set_with_expiry("b", 10, "");
        store.set_with_expiry("a", 10, "");
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);

        store.clear();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_memory_store_shared_across_threads() {
        let store = Arc::new(MemoryStore::new());
        std::thread::scope(|s| {
            for i in 0..8 {
                let store = store.clone();
                s.spawn(move || {
                    store.set_with_expiry(&format!("k{i}"), 60, "v");
                });
            }
        });
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_memory_store_write_sweeps_expired_entries() {
        let store = MemoryStore::new();
        for i in 0..100 {
            store.set_with_expiry(&format!("Doc1-{i}.0:token"), 0, "{}");
        }
        store.set_with_expiry("live", 60, "{}");

        assert_eq!(store.entries.read().unwrap().len(), 1);
        assert_eq!(store.keys(), vec!["live".to_string()]);
    }
}
