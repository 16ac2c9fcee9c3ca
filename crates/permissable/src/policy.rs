//! # Permission Policies
//!
//! A policy is the per-entity-type registry of rules, built once at startup
//! and read-only afterwards. Rule order matters: the first rule that grants
//! an action under a matching scope decides it.

use std::fmt;

use crate::decision::USER_ID_KEY;
use crate::rule::{Predicate, Rule};
use crate::scopes::{ScopeCatalog, FULL, WILDCARD};
use crate::subject::PermissionSource;

/// Ordered rule table plus per-type settings.
///
/// # Example
///
/// ```
/// use permissable::{Actor, Cacheable, PermissionPolicy, PermissionSource, Predicate};
///
/// struct User { id: u64 }
/// impl Actor for User {
///     fn cache_key(&self) -> String { format!("User{}", self.id) }
/// }
///
/// struct Post { author_id: u64 }
///
/// impl Cacheable for Post {
///     fn type_name(&self) -> &str { "Post" }
///     fn identifier(&self) -> Option<String> { None }
/// }
///
/// impl PermissionSource for Post {
///     type Actor = User;
/// }
///
/// let mut policy = PermissionPolicy::<Post>::new();
/// policy
///     .register(&["view"], Predicate::constant(true), &["*"])
///     .register(&["edit", "delete"], Predicate::actor(|post: &Post, user: &User| Ok(post.author_id == user.id)), &[])
///     .enable_caching();
///
/// assert_eq!(policy.len(), 2);
/// assert!(policy.caching_enabled());
/// ```
pub struct PermissionPolicy<E: PermissionSource> {
    /// Rules in registration order
    rules: Vec<Rule<E>>,

    /// Whether evaluations go through the permission cache
    caching: bool,

    /// Scopes used when neither the caller nor the actor supply any
    default_scopes: Vec<String>,

    /// Known scope names
    catalog: ScopeCatalog,
}

impl<E: PermissionSource> Default for PermissionPolicy<E> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            caching: false,
            default_scopes: vec![FULL.to_string()],
            catalog: ScopeCatalog::new(),
        }
    }
}

impl<E: PermissionSource> PermissionPolicy<E> {
    /// Create an empty policy with caching off and default scopes `["full"]`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    ///
    /// # Arguments
    ///
    /// * `actions` - Actions the rule decides
    /// * `predicate` - Condition for granting
    /// * `extra_scopes` - Scopes honored in addition to `full`
    ///
    /// The action name `user_id` is reserved by [`PermissionMap`](crate::PermissionMap) and is
    /// dropped from the rule with a warning.
    pub fn register<S: AsRef<str>>(
        &mut self,
        actions: &[S],
        predicate: Predicate<E>,
        extra_scopes: &[&str],
    ) -> &mut Self {
        for scope in extra_scopes {
            if !self.catalog.contains(scope) {
                tracing::debug!(scope = %scope, "Rule registered with a scope missing from the catalog");
            }
        }

        let actions: Vec<&str> = actions
            .iter()
            .map(|action| action.as_ref())
            .filter(|action| {
                let reserved = *action == USER_ID_KEY;
                if reserved {
                    tracing::warn!(action = %action, "Ignoring reserved action name");
                }
                !reserved
            })
            .collect();

        let rule = Rule::new(&actions, predicate, extra_scopes);
        tracing::trace!(
            index = self.rules.len(),
            actions = ?rule.actions(),
            scopes = ?rule.allowed_scopes(),
            requires_actor = rule.requires_actor(),
            "Registered permission rule"
        );
        self.rules.push(rule);
        self
    }

    /// Route evaluations for this type through the permission cache.
    pub fn enable_caching(&mut self) -> &mut Self {
        self.caching = true;
        self
    }

    /// Replace the default scopes.
    pub fn set_default_scopes<S: AsRef<str>>(&mut self, scopes: &[S]) -> &mut Self {
        self.default_scopes = scopes.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Add a name to the scope catalog.
    pub fn add_scope(&mut self, scope: impl Into<String>) -> &mut Self {
        self.catalog.add_scope(scope);
        self
    }

    /// Rules in registration order.
    pub fn rules(&self) -> &[Rule<E>] {
        &self.rules
    }

    /// Check if caching is enabled.
    pub fn caching_enabled(&self) -> bool {
        self.caching
    }

    /// Default scopes.
    pub fn default_scopes(&self) -> &[String] {
        &self.default_scopes
    }

    /// Known scope names.
    pub fn scopes(&self) -> &ScopeCatalog {
        &self.catalog
    }

    /// Every action any rule decides, in first-registration order.
    pub fn actions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for action in self.rules.iter().flat_map(|r| r.actions()) {
            if !seen.contains(&action.as_str()) {
                seen.push(action);
            }
        }
        seen
    }

    /// Check if any rule opts into the wildcard scope.
    pub fn has_wildcard_rules(&self) -> bool {
        self.rules.iter().any(|r| r.allowed_scopes().contains(WILDCARD))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<E: PermissionSource> fmt::Debug for PermissionPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionPolicy")
            .field("rules", &self.rules)
            .field("caching", &self.caching)
            .field("default_scopes", &self.default_scopes)
            .field("catalog", &self.catalog)
            .finish()
    }
}
