//! Cache key derivation
//!
//! Keys are built from an entity's type name, identifier and last-modified
//! time plus the global invalidation token:
//!
//! ```text
//! [prefix/]{type}{id|nil}-{updated_at epoch seconds}:{token}
//!
//! Examples:
//!   PermitObject12345-1464760800.0:permissable_redis_cache_token
//!   bacon/PermitObject12345-1464760800.0:permissable_redis_cache_token
//! ```
//!
//! Touching the entity (a new `updated_at`) or rotating the token yields a
//! new key, so stale entries are never read back and simply expire.

use chrono::{DateTime, Utc};

/// Identifier used when an entity has none.
pub const NIL_IDENTIFIER: &str = "nil";

/// Subject used in permission keys when there is no actor.
pub const NOBODY: &str = "nobody";

/// Prefix for cached permission maps.
pub const PERMISSIONS_PREFIX: &str = "permissions-for";

/// Anything that can be the subject of a versioned cache key.
pub trait Cacheable {
    /// Type name used as the first key segment.
    fn type_name(&self) -> &str;

    /// Stable identifier, if the entity has one yet.
    fn identifier(&self) -> Option<String>;

    /// Last modification time. Treated as "now" when absent.
    fn last_modified(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Render a timestamp as floating-point epoch seconds (`1464760800.0`).
pub fn epoch_seconds(at: DateTime<Utc>) -> String {
    let secs = at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1_000_000_000.0;
    // Debug keeps the trailing `.0` on whole seconds
    format!("{secs:?}")
}

/// Derive the cache key for `subject` under the given invalidation token.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use permissable_cache::{cache_key, Cacheable};
///
/// struct Doc;
///
/// impl Cacheable for Doc {
///     fn type_name(&self) -> &str { "Doc" }
///     fn identifier(&self) -> Option<String> { Some("7".into()) }
///     fn last_modified(&self) -> Option<chrono::DateTime<Utc>> {
///         Utc.timestamp_opt(1464760800, 0).single()
///     }
/// }
///
/// assert_eq!(cache_key(&Doc, None, "tok"), "Doc7-1464760800.0:tok");
/// assert_eq!(cache_key(&Doc, Some("bacon"), "tok"), "bacon/Doc7-1464760800.0:tok");
/// ```
pub fn cache_key<C: Cacheable + ?Sized>(subject: &C, prefix: Option<&str>, token: &str) -> String {
    let id = subject
        .identifier()
        .unwrap_or_else(|| NIL_IDENTIFIER.to_string());
    let updated = epoch_seconds(subject.last_modified().unwrap_or_else(Utc::now));
    let key = format!("{}{}-{}:{}", subject.type_name(), id, updated, token);

    match prefix {
        Some(prefix) => format!("{}/{}", prefix, key),
        None => key,
    }
}

/// Prefix under which a permission map for one actor and scope set lives.
///
/// Scopes are sorted and de-duplicated so equivalent scope sets share a key.
pub fn permissions_prefix(actor_key: Option<&str>, scopes: &[String]) -> String {
    let mut scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
    scopes.sort_unstable();
    scopes.dedup();

    format!(
        "{}/{}/scopes_{}",
        PERMISSIONS_PREFIX,
        actor_key.unwrap_or(NOBODY),
        scopes.join(",")
    )
}
