//! Redis-backed cache store for distributed deployments.
//!
//! Lets several application instances share one permission cache. Commands
//! share one synchronous connection that is re-established after a failure;
//! any transport failure is logged and reported as the store's failure
//! sentinel.

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;
use ::redis::{Client, Connection, RedisResult};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Redis cache store.
///
/// # Example
///
/// ```rust,no_run
/// use permissable_cache::{CacheStore, RedisStore};
///
/// fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let store = RedisStore::open("redis://localhost:6379")?;
///     store.set_with_expiry("key", 1800, "{}");
///     Ok(())
/// }
/// ```
pub struct RedisStore {
    /// Redis client
    client: Client,

    /// Upper bound on establishing a connection
    connect_timeout: Duration,

    /// Connection reused across commands; `None` after a failure
    connection: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl RedisStore {
    /// Open a Redis store and verify the server is reachable.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., `redis://localhost:6379`)
    pub fn open(redis_url: &str) -> CacheResult<Self> {
        Self::open_with_timeout(redis_url, Duration::from_secs(2))
    }

    /// Open a Redis store with a custom connect timeout.
    pub fn open_with_timeout(redis_url: &str, connect_timeout: Duration) -> CacheResult<Self> {
        let client =
            Client::open(redis_url).map_err(|e| CacheError::ConnectionError(e.to_string()))?;

        // Test connection
        let connection = client
            .get_connection_with_timeout(connect_timeout)
            .map_err(|e| CacheError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            connect_timeout,
            connection: Mutex::new(Some(connection)),
        })
    }

    fn run<T, F>(&self, op: &'static str, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut Connection) -> RedisResult<T>,
    {
        let mut slot = self.connection.lock().unwrap_or_else(PoisonError::into_inner);
        let conn = match slot.take() {
            Some(conn) => Ok(conn),
            None => self.client.get_connection_with_timeout(self.connect_timeout),
        };

        let result = conn.and_then(|mut conn| {
            let result = f(&mut conn);
            // Server-side errors leave the connection usable
            if !matches!(&result, Err(e) if e.is_io_error() || e.is_connection_dropped()) {
                *slot = Some(conn);
            }
            result
        });
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, cache_key = %key, op, "Redis cache command failed");
                None
            }
        }
    }
}

impl CacheStore for RedisStore {
    fn set_with_expiry(&self, key: &str, ttl_secs: u64, value: &str) -> bool {
        self.run("setex", key, |conn| {
            ::redis::cmd("SETEX")
                .arg(key)
                .arg(ttl_secs)
                .arg(value)
                .query::<()>(conn)
        })
        .is_some()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.run("get", key, |conn| {
            ::redis::cmd("GET").arg(key).query::<Option<String>>(conn)
        })
        .flatten()
    }

    fn delete(&self, key: &str) -> bool {
        self.run("del", key, |conn| ::redis::cmd("DEL").arg(key).query::<i64>(conn))
            .is_some()
    }
}
