//! Actor and entity capabilities
//!
//! The engine sees actors and entities only through these traits. Actors
//! are opaque apart from a cache key and two optional accessors; entities
//! provide the identity and version fields that cache keys are derived
//! from.

use permissable_cache::Cacheable;

/// The party requesting an action, typically a user.
///
/// Only the cache key is required. Anonymous requests are cached under
/// the reserved `nobody` subject, so every actor must name its own entry;
/// an actor sharing that entry would leak actor-only grants to anonymous
/// callers.
pub trait Actor {
    /// Scopes this actor is restricted to (e.g. from an API token).
    fn permission_scopes(&self) -> Option<Vec<String>> {
        None
    }

    /// Key identifying this actor in permission cache entries.
    ///
    /// Must be unique per actor and must not be `nobody`.
    fn cache_key(&self) -> String;

    /// Identifier reported as `user_id` in permission maps.
    fn global_id(&self) -> Option<String> {
        None
    }
}

/// An entity type whose instances carry a rule-based permission policy.
///
/// The identity and version fields come from [`Cacheable`]; the associated
/// `Actor` fixes which actor type the entity's predicates receive.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, Utc};
/// use permissable::{Actor, Cacheable, PermissionSource};
///
/// struct User { id: String }
///
/// impl Actor for User {
///     fn cache_key(&self) -> String { format!("User{}", self.id) }
///     fn global_id(&self) -> Option<String> { Some(self.id.clone()) }
/// }
///
/// struct Board { id: u64, updated_at: DateTime<Utc> }
///
/// impl Cacheable for Board {
///     fn type_name(&self) -> &str { "Board" }
///     fn identifier(&self) -> Option<String> { Some(self.id.to_string()) }
///     fn last_modified(&self) -> Option<DateTime<Utc>> { Some(self.updated_at) }
/// }
///
/// impl PermissionSource for Board {
///     type Actor = User;
/// }
/// ```
pub trait PermissionSource: Cacheable {
    /// Actor type handed to actor predicates.
    type Actor: Actor;
}
