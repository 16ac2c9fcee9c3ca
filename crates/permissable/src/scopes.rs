//! # Scopes
//!
//! Scopes partition which granted permissions are honored for a request.
//! A rule lists the scopes it is allowed under; a request carries the
//! scopes it is acting with. A rule's grant counts only when the two sets
//! intersect.
//!
//! Reserved names:
//! - `full`: the default for both rules and unscoped requests
//! - `*`: added to every request, so rules that opt into it apply everywhere
//! - `none`: a request of exactly `["none"]` skips the implicit `*`

use std::collections::BTreeSet;

use crate::subject::Actor;

/// The universal default scope.
pub const FULL: &str = "full";

/// Scope implicitly carried by every request except `["none"]`.
pub const WILDCARD: &str = "*";

/// Sentinel that suppresses the implicit wildcard.
pub const NONE: &str = "none";

/// Resolve the scopes a request acts with.
///
/// Takes the first available of: the explicit scopes, the actor's own
/// scopes, the entity type's defaults. Unless the result is exactly
/// `["none"]`, `*` is appended.
///
/// # Example
///
/// ```
/// use permissable::scopes::resolve_scopes;
/// use permissable::Actor;
///
/// struct Anyone;
/// impl Actor for Anyone {
///     fn cache_key(&self) -> String { "Anyone".into() }
/// }
///
/// let defaults = vec!["full".to_string()];
/// assert_eq!(resolve_scopes::<Anyone>(Some(&["read"]), None, &defaults), vec!["read", "*"]);
/// assert_eq!(resolve_scopes::<Anyone>(None, None, &defaults), vec!["full", "*"]);
/// assert_eq!(resolve_scopes::<Anyone>(Some(&["none"]), None, &defaults), vec!["none"]);
/// assert_eq!(resolve_scopes::<Anyone>(Some(&[]), None, &defaults), vec!["*"]);
/// ```
pub fn resolve_scopes<A: Actor + ?Sized>(
    explicit: Option<&[&str]>,
    actor: Option<&A>,
    defaults: &[String],
) -> Vec<String> {
    let mut scopes: Vec<String> = match explicit {
        Some(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
        None => actor
            .and_then(|a| a.permission_scopes())
            .unwrap_or_else(|| defaults.to_vec()),
    };

    if !(scopes.len() == 1 && scopes[0] == NONE) {
        scopes.push(WILDCARD.to_string());
    }
    scopes
}

/// Build a rule's allowed scope set: `full` plus any extras, sorted and
/// de-duplicated.
pub fn allowed_scopes(extra: &[&str]) -> BTreeSet<String> {
    std::iter::once(FULL)
        .chain(extra.iter().copied())
        .map(str::to_string)
        .collect()
}

/// Check whether a rule's allowed scopes intersect a request's scopes.
pub fn intersects(allowed: &BTreeSet<String>, relevant: &[String]) -> bool {
    relevant.iter().any(|scope| allowed.contains(scope))
}

/// Catalog of scope names known to an entity type.
///
/// Seeded with `full`. Membership is informational only; it never affects
/// a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeCatalog {
    scopes: Vec<String>,
}

impl Default for ScopeCatalog {
    fn default() -> Self {
        Self {
            scopes: vec![FULL.to_string()],
        }
    }
}

impl ScopeCatalog {
    /// Create a catalog containing only `full`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scope name. Adding a known scope is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if the scope was new
    pub fn add_scope(&mut self, scope: impl Into<String>) -> bool {
        let scope = scope.into();
        if self.contains(&scope) {
            return false;
        }
        self.scopes.push(scope);
        true
    }

    /// Check if a scope is known. `*` is always known.
    pub fn contains(&self, scope: &str) -> bool {
        scope == WILDCARD || self.scopes.iter().any(|s| s == scope)
    }

    /// All known scopes in insertion order.
    pub fn all(&self) -> &[String] {
        &self.scopes
    }

    /// Number of known scopes.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Always false; the catalog is seeded with `full`.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
