//! Authorizer: evaluation with cache orchestration.
//!
//! The authorizer pairs an entity type's policy with a cache context. When
//! the policy has caching enabled, every decision goes through the bulk
//! permission map, which is read from and written back to the cache.
//! Otherwise single-action checks scan the rule table directly.

use std::sync::Arc;

use permissable_cache::{permissions_prefix, CacheContext};

use crate::decision::{Decision, PermissionMap};
use crate::error::PermissionResult;
use crate::policy::PermissionPolicy;
use crate::scopes::resolve_scopes;
use crate::subject::{Actor, PermissionSource};

/// Answers permission questions for instances of one entity type.
///
/// Cheap to clone; the policy and cache are shared.
///
/// # Example
///
/// ```
/// use permissable::{Actor, Authorizer, Cacheable, PermissionPolicy, PermissionSource, Predicate};
///
/// struct User;
/// impl Actor for User {
///     fn cache_key(&self) -> String { "User1".into() }
/// }
///
/// struct Page;
///
/// impl Cacheable for Page {
///     fn type_name(&self) -> &str { "Page" }
///     fn identifier(&self) -> Option<String> { Some("home".into()) }
/// }
///
/// impl PermissionSource for Page {
///     type Actor = User;
/// }
///
/// let mut policy = PermissionPolicy::<Page>::new();
/// policy.register(&["view"], Predicate::constant(true), &[]);
///
/// let authorizer = Authorizer::new(policy);
/// assert!(authorizer.allows(&Page, None, "view", None).unwrap().granted);
/// assert!(!authorizer.allows(&Page, None, "edit", None).unwrap().granted);
/// ```
pub struct Authorizer<E: PermissionSource> {
    /// Rule table and per-type settings
    policy: Arc<PermissionPolicy<E>>,

    /// Where permission maps are cached
    cache: Arc<CacheContext>,
}

impl<E: PermissionSource> Clone for Authorizer<E> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<E: PermissionSource> std::fmt::Debug for Authorizer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("policy", &self.policy)
            .field("cache", &self.cache)
            .finish()
    }
}

impl<E: PermissionSource> Authorizer<E> {
    /// Create an authorizer with no cache backend.
    pub fn new(policy: PermissionPolicy<E>) -> Self {
        Self::with_cache(Arc::new(policy), Arc::new(CacheContext::unconfigured()))
    }

    /// Create an authorizer over a shared policy and cache.
    pub fn with_cache(policy: Arc<PermissionPolicy<E>>, cache: Arc<CacheContext>) -> Self {
        Self { policy, cache }
    }

    /// The policy in use.
    pub fn policy(&self) -> &PermissionPolicy<E> {
        &self.policy
    }

    /// The cache context in use.
    pub fn cache(&self) -> &CacheContext {
        &self.cache
    }

    /// Decide whether `actor` may perform `action` on `entity`.
    ///
    /// # Arguments
    ///
    /// * `entity` - The resource instance
    /// * `actor` - The requesting actor, or `None` for anonymous access
    /// * `action` - Action name
    /// * `scopes` - Request scopes; `None` falls back to the actor's scopes,
    ///   then the policy defaults
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::Predicate`](crate::PermissionError::Predicate)
    /// if a rule's predicate fails before the action is decided.
    pub fn allows(
        &self,
        entity: &E,
        actor: Option<&E::Actor>,
        action: &str,
        scopes: Option<&[&str]>,
    ) -> PermissionResult<Decision> {
        let scopes = self.resolve(actor, scopes);

        if self.policy.caching_enabled() {
            let permissions = self.cached_permissions(entity, actor, &scopes)?;
            return Ok(Decision {
                granted: permissions.is_granted(action),
                scope_rejected: permissions.is_scope_rejected(action),
            });
        }

        self.policy.evaluate(entity, actor, action, &scopes)
    }

    /// Compute every action value for `actor` on `entity`.
    ///
    /// With caching enabled, a cached map for the same entity version,
    /// actor and scopes is returned without running any predicate; a freshly
    /// computed map is written back on a miss.
    pub fn permissions_for(
        &self,
        entity: &E,
        actor: Option<&E::Actor>,
        scopes: Option<&[&str]>,
    ) -> PermissionResult<PermissionMap> {
        let scopes = self.resolve(actor, scopes);

        if self.policy.caching_enabled() {
            return self.cached_permissions(entity, actor, &scopes);
        }

        self.policy.evaluate_all(entity, actor, &scopes)
    }

    /// Drop the cached map for one actor and scope set.
    pub fn clear_permissions(
        &self,
        entity: &E,
        actor: Option<&E::Actor>,
        scopes: Option<&[&str]>,
    ) -> bool {
        let scopes = self.resolve(actor, scopes);
        let prefix = Self::prefix_for(actor, &scopes);
        self.cache.clear_cached(entity, &prefix)
    }

    /// The full cache key a permission map for this request is stored under.
    pub fn permissions_cache_key(
        &self,
        entity: &E,
        actor: Option<&E::Actor>,
        scopes: Option<&[&str]>,
    ) -> String {
        let scopes = self.resolve(actor, scopes);
        let prefix = Self::prefix_for(actor, &scopes);
        self.cache.cache_key(entity, Some(&prefix))
    }

    fn resolve(&self, actor: Option<&E::Actor>, scopes: Option<&[&str]>) -> Vec<String> {
        resolve_scopes(scopes, actor, self.policy.default_scopes())
    }

    fn prefix_for(actor: Option<&E::Actor>, scopes: &[String]) -> String {
        let actor_key = actor.map(|a| a.cache_key());
        permissions_prefix(actor_key.as_deref(), scopes)
    }

    fn cached_permissions(
        &self,
        entity: &E,
        actor: Option<&E::Actor>,
        scopes: &[String],
    ) -> PermissionResult<PermissionMap> {
        let prefix = Self::prefix_for(actor, scopes);

        if let Some(permissions) = self.cache.get_cached::<_, PermissionMap>(entity, &prefix) {
            return Ok(permissions);
        }

        let permissions = self.policy.evaluate_all(entity, actor, scopes)?;
        // Best effort; a failed write still returns the computed map
        self.cache.set_cached(entity, &prefix, &permissions, None);
        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Predicate;
    use chrono::{DateTime, TimeZone, Utc};
    use permissable_cache::{CacheStore, Cacheable, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct User {
        key: String,
    }

    impl Actor for User {
        fn cache_key(&self) -> String {
            self.key.clone()
        }

        fn global_id(&self) -> Option<String> {
            Some(self.key.clone())
        }
    }

    struct PermitObject;

    impl Cacheable for PermitObject {
        fn type_name(&self) -> &str {
            "PermitObject"
        }

        fn identifier(&self) -> Option<String> {
            Some("12345".into())
        }

        fn last_modified(&self) -> Option<DateTime<Utc>> {
            Utc.timestamp_opt(1464760800, 0).single()
        }
    }

    impl PermissionSource for PermitObject {
        type Actor = User;
    }

    const SUFFIX: &str = "/PermitObject12345-1464760800.0:permissable_redis_cache_token";

    fn cached(policy: PermissionPolicy<PermitObject>) -> (Arc<MemoryStore>, Authorizer<PermitObject>) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(CacheContext::new(store.clone()));
        (store, Authorizer::with_cache(Arc::new(policy), cache))
    }

    #[test]
    fn test_cached_allows_reads_permission_map() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy
            .enable_caching()
            .register(&["hat", "cat"], Predicate::anonymous(|_| Err("not cached".into())), &[]);
        let (store, authorizer) = cached(policy);

        let user = User { key: "asdf".into() };
        let key = format!("permissions-for/asdf/scopes_*,a{SUFFIX}");
        store.set_with_expiry(&key, 1800, r#"{"user_id":"asdf","hat":true,"cat":false}"#);

        let decision = authorizer.allows(&PermitObject, Some(&user), "cat", Some(&["a"])).unwrap();
        assert_eq!(decision, Decision::denied(true));

        let decision = authorizer.allows(&PermitObject, Some(&user), "hat", Some(&["a"])).unwrap();
        assert_eq!(decision, Decision::granted());
    }

    #[test]
    fn test_cached_allows_absent_action_is_plain_denial() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy.enable_caching().register(&["jump"], Predicate::constant(false), &[]);
        let (_, authorizer) = cached(policy);

        assert_eq!(
            authorizer.allows(&PermitObject, None, "jump", None).unwrap(),
            Decision::denied(false)
        );
    }

    #[test]
    fn test_permissions_for_persists_cache() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy
            .enable_caching()
            .register(&["jump"], Predicate::constant(true), &["*"])
            .register(&["fly", "jump"], Predicate::constant(true), &[]);
        let (store, authorizer) = cached(policy);

        let map = authorizer.permissions_for(&PermitObject, None, Some(&[])).unwrap();
        assert!(map.is_granted("jump"));
        assert!(map.is_scope_rejected("fly"));

        let key = format!("permissions-for/nobody/scopes_*{SUFFIX}");
        assert_eq!(store.keys(), vec![key.clone()]);
        assert_eq!(store.ttl_of(&key), Some(1800));

        let stored: serde_json::Value = serde_json::from_str(&store.get(&key).unwrap()).unwrap();
        assert_eq!(stored, serde_json::json!({"user_id": null, "jump": true, "fly": false}));
    }

    #[test]
    fn test_permissions_for_reads_cache() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy
            .enable_caching()
            .register(&["jump"], Predicate::anonymous(|_| Err("not cached".into())), &[]);
        let (store, authorizer) = cached(policy);

        store.set_with_expiry(
            &format!("permissions-for/nobody/scopes_*,a{SUFFIX}"),
            1800,
            r#"{"user_id":null,"a":true}"#,
        );
        store.set_with_expiry(
            &format!("permissions-for/asdf/scopes_*,full{SUFFIX}"),
            1800,
            r#"{"user_id":"asdf","b":true}"#,
        );

        let anonymous = authorizer.permissions_for(&PermitObject, None, Some(&["a"])).unwrap();
        assert!(anonymous.is_granted("a"));

        let user = User { key: "asdf".into() };
        let mine = authorizer.permissions_for(&PermitObject, Some(&user), None).unwrap();
        assert_eq!(mine.user_id.as_deref(), Some("asdf"));
        assert!(mine.is_granted("b"));
    }

    #[test]
    fn test_second_call_hits_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy.enable_caching().register(
            &["jump"],
            Predicate::anonymous(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }),
            &[],
        );
        let (_, authorizer) = cached(policy);

        let first = authorizer.permissions_for(&PermitObject, None, None).unwrap();
        let second = authorizer.permissions_for(&PermitObject, None, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        authorizer.cache().rotate_token("v2");
        authorizer.permissions_for(&PermitObject, None, None).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_malformed_cache_entry_is_recomputed() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy.enable_caching().register(&["jump"], Predicate::constant(true), &[]);
        let (store, authorizer) = cached(policy);

        let key = authorizer.permissions_cache_key(&PermitObject, None, None);
        store.set_with_expiry(&key, 1800, "this is not valid json");

        let map = authorizer.permissions_for(&PermitObject, None, None).unwrap();
        assert!(map.is_granted("jump"));
        assert!(store.get(&key).unwrap().contains("\"jump\":true"));
    }

    #[test]
    fn test_clear_permissions() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy.enable_caching().register(&["jump"], Predicate::constant(true), &[]);
        let (store, authorizer) = cached(policy);

        authorizer.permissions_for(&PermitObject, None, None).unwrap();
        assert_eq!(store.len(), 1);
        assert!(authorizer.clear_permissions(&PermitObject, None, None));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unconfigured_cache_still_evaluates() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy.enable_caching().register(&["jump"], Predicate::constant(true), &[]);
        let authorizer = Authorizer::new(policy);

        assert!(authorizer.allows(&PermitObject, None, "jump", None).unwrap().granted);
        assert!(authorizer.permissions_for(&PermitObject, None, None).unwrap().is_granted("jump"));
    }

    #[test]
    fn test_uncached_policy_never_writes() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy.register(&["jump"], Predicate::constant(true), &[]);
        let (store, authorizer) = cached(policy);

        authorizer.permissions_for(&PermitObject, None, None).unwrap();
        authorizer.allows(&PermitObject, None, "jump", None).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_actor_map_is_not_served_to_anonymous() {
        let mut policy = PermissionPolicy::<PermitObject>::new();
        policy
            .enable_caching()
            .register(&["edit"], Predicate::actor(|_, _| Ok(true)), &[]);
        let (store, authorizer) = cached(policy);

        let user = User { key: "User1".into() };
        assert!(authorizer.allows(&PermitObject, Some(&user), "edit", None).unwrap().granted);
        assert!(!authorizer.allows(&PermitObject, None, "edit", None).unwrap().granted);

        assert_eq!(
            store.keys(),
            vec![
                format!("permissions-for/User1/scopes_*,full{SUFFIX}"),
                format!("permissions-for/nobody/scopes_*,full{SUFFIX}"),
            ]
        );
    }
}
