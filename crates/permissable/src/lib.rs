//! # Permissable
//!
//! Rule-based authorization decisions for entity types, with optional
//! caching of computed permissions.
//!
//! ## Overview
//!
//! The permissable crate handles:
//! - **Rules**: Ordered action → predicate → allowed-scope entries per entity type
//! - **Scopes**: Request scopes that decide which grants are honored
//! - **Single-action checks**: Short-circuit evaluation with scope-rejection reporting
//! - **Bulk permissions**: Every action's value in one pass, for UIs and APIs
//! - **Caching**: Permission maps cached per entity version, actor and scopes
//!
//! ## Architecture
//!
//! ```text
//! Rule = Actions + Predicate + Allowed Scopes
//!
//! Decision for (entity, actor, action, scopes):
//!   first rule that lists the action, whose predicate passes,
//!   and whose allowed scopes intersect the request's scopes
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{DateTime, Utc};
//! use permissable::{
//!     Actor, Authorizer, CacheContext, Cacheable, MemoryStore, PermissionPolicy,
//!     PermissionSource, Predicate,
//! };
//!
//! struct User { id: u64, token_scopes: Option<Vec<String>> }
//!
//! impl Actor for User {
//!     fn permission_scopes(&self) -> Option<Vec<String>> { self.token_scopes.clone() }
//!     fn cache_key(&self) -> String { format!("User{}", self.id) }
//!     fn global_id(&self) -> Option<String> { Some(format!("1_{}", self.id)) }
//! }
//!
//! struct Board { id: u64, owner_id: u64, public: bool, updated_at: DateTime<Utc> }
//!
//! impl Cacheable for Board {
//!     fn type_name(&self) -> &str { "Board" }
//!     fn identifier(&self) -> Option<String> { Some(self.id.to_string()) }
//!     fn last_modified(&self) -> Option<DateTime<Utc>> { Some(self.updated_at) }
//! }
//!
//! impl PermissionSource for Board {
//!     type Actor = User;
//! }
//!
//! let mut policy = PermissionPolicy::<Board>::new();
//! policy
//!     .register(&["view"], Predicate::anonymous(|b: &Board| Ok(b.public)), &["*"])
//!     .register(
//!         &["view", "edit"],
//!         Predicate::actor(|b: &Board, u: &User| Ok(b.owner_id == u.id)),
//!         &["read_boards"],
//!     )
//!     .enable_caching();
//!
//! let cache = Arc::new(CacheContext::new(Arc::new(MemoryStore::new())));
//! let authorizer = Authorizer::with_cache(Arc::new(policy), cache);
//!
//! let board = Board { id: 1, owner_id: 7, public: false, updated_at: Utc::now() };
//! let owner = User { id: 7, token_scopes: None };
//!
//! assert!(authorizer.allows(&board, Some(&owner), "edit", None).unwrap().granted);
//! assert!(!authorizer.allows(&board, None, "view", None).unwrap().granted);
//!
//! // A token limited to an unrelated scope is scope-rejected, not refused
//! let decision = authorizer.allows(&board, Some(&owner), "edit", Some(&["billing"])).unwrap();
//! assert!(!decision.granted);
//! assert!(decision.scope_rejected);
//! ```
//!
//! ## Scope Semantics
//!
//! - Rules are always allowed under `full`, plus any scopes they list
//! - Requests without explicit scopes use the actor's scopes, then the policy defaults
//! - Every request also carries `*`, unless its scopes are exactly `["none"]`
//!
//! ## Caching
//!
//! With [`PermissionPolicy::enable_caching`], decisions are served from
//! the permission map cached under the entity's id and `updated_at`, the
//! actor's cache key and the request scopes. Updating the entity or rotating
//! the cache token invalidates old entries. Cache failures never fail a
//! decision.

pub mod authorizer;
pub mod decision;
pub mod error;
mod evaluator;
pub mod policy;
pub mod rule;
pub mod scopes;
pub mod subject;

// Re-export main types for convenience
pub use authorizer::Authorizer;
pub use decision::{Decision, PermissionMap, USER_ID_KEY};
pub use error::{PermissionError, PermissionResult, PredicateError};
pub use policy::PermissionPolicy;
pub use rule::{Predicate, PredicateResult, Rule};
pub use scopes::ScopeCatalog;
pub use subject::{Actor, PermissionSource};

pub use permissable_cache::{CacheConfig, CacheContext, CacheStore, Cacheable, MemoryStore, UnconfiguredStore};
