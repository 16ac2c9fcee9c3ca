//! # Rules
//!
//! A rule maps one or more actions to a predicate and the scopes under
//! which a positive predicate result is honored.
//!
//! ```text
//! Rule = actions + predicate + allowed scopes
//!
//! Examples:
//!   ["view"]          anonymous  {full}        - anyone may view
//!   ["edit", "view"]  actor      {*, full}     - owner may edit and view, any scope
//! ```

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{PermissionError, PermissionResult, PredicateError};
use crate::scopes;
use crate::subject::PermissionSource;

/// What a predicate returns: a verdict, or an error that aborts evaluation.
pub type PredicateResult = Result<bool, PredicateError>;

type AnonymousFn<E> = dyn Fn(&E) -> PredicateResult + Send + Sync;
type ActorFn<E> = dyn Fn(&E, &<E as PermissionSource>::Actor) -> PredicateResult + Send + Sync;

/// Rule condition, evaluated against the entity and (optionally) the actor.
///
/// - **Anonymous**: looks at the entity only, so it runs for every request.
/// - **Actor**: needs an actor; when the request has none the rule is
///   skipped without running it.
pub enum Predicate<E: PermissionSource> {
    /// Predicate over the entity alone.
    Anonymous(Box<AnonymousFn<E>>),
    /// Predicate over the entity and a present actor.
    Actor(Box<ActorFn<E>>),
}

impl<E: PermissionSource> Predicate<E> {
    /// Create a predicate that does not need an actor.
    pub fn anonymous<F>(f: F) -> Self
    where
        F: Fn(&E) -> PredicateResult + Send + Sync + 'static,
    {
        Predicate::Anonymous(Box::new(f))
    }

    /// Create a predicate that is only evaluated when an actor is present.
    pub fn actor<F>(f: F) -> Self
    where
        F: Fn(&E, &E::Actor) -> PredicateResult + Send + Sync + 'static,
    {
        Predicate::Actor(Box::new(f))
    }

    /// Anonymous predicate with a fixed verdict.
    pub fn constant(verdict: bool) -> Self {
        Self::anonymous(move |_| Ok(verdict))
    }

    /// Check if this predicate needs an actor.
    pub fn requires_actor(&self) -> bool {
        matches!(self, Predicate::Actor(_))
    }

    /// Run the predicate.
    ///
    /// # Returns
    ///
    /// `None` when the predicate needs an actor and none was given,
    /// otherwise the predicate's own result
    pub fn evaluate(&self, entity: &E, actor: Option<&E::Actor>) -> Option<PredicateResult> {
        match (self, actor) {
            (Predicate::Anonymous(f), _) => Some(f(entity)),
            (Predicate::Actor(f), Some(actor)) => Some(f(entity, actor)),
            (Predicate::Actor(_), None) => None,
        }
    }
}

impl<E: PermissionSource> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Anonymous(_) => f.write_str("Predicate::Anonymous"),
            Predicate::Actor(_) => f.write_str("Predicate::Actor"),
        }
    }
}

/// One entry of a rule table. Immutable once registered.
pub struct Rule<E: PermissionSource> {
    /// Actions this rule decides.
    actions: Vec<String>,
    /// Condition for granting.
    predicate: Predicate<E>,
    /// Scopes a grant is honored under; always sorted and unique.
    allowed_scopes: BTreeSet<String>,
}

impl<E: PermissionSource> Rule<E> {
    /// Create a rule. `extra_scopes` are added to the implicit `full`.
    pub fn new<S: AsRef<str>>(actions: &[S], predicate: Predicate<E>, extra_scopes: &[&str]) -> Self {
        Self {
            actions: actions.iter().map(|a| a.as_ref().to_string()).collect(),
            predicate,
            allowed_scopes: scopes::allowed_scopes(extra_scopes),
        }
    }

    /// The actions this rule decides, in registration order.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// The scopes this rule's grants are honored under.
    pub fn allowed_scopes(&self) -> &BTreeSet<String> {
        &self.allowed_scopes
    }

    /// The rule's predicate.
    pub fn predicate(&self) -> &Predicate<E> {
        &self.predicate
    }

    /// Check if this rule decides `action` (exact match).
    pub fn applies_to(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Check if this rule is skipped for anonymous requests.
    pub fn requires_actor(&self) -> bool {
        self.predicate.requires_actor()
    }

    /// Check if a grant from this rule is honored under `relevant` scopes.
    pub fn honored_under(&self, relevant: &[String]) -> bool {
        scopes::intersects(&self.allowed_scopes, relevant)
    }

    /// Run the predicate, tagging failures with this rule's position.
    ///
    /// `None` means the rule was skipped for lack of an actor.
    pub(crate) fn check(
        &self,
        index: usize,
        entity: &E,
        actor: Option<&E::Actor>,
    ) -> PermissionResult<Option<bool>> {
        match self.predicate.evaluate(entity, actor) {
            None => Ok(None),
            Some(Ok(verdict)) => Ok(Some(verdict)),
            Some(Err(source)) => Err(PermissionError::Predicate {
                rule: index,
                actions: self.actions.join(","),
                source,
            }),
        }
    }
}

impl<E: PermissionSource> fmt::Debug for Rule<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("actions", &self.actions)
            .field("predicate", &self.predicate)
            .field("allowed_scopes", &self.allowed_scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Actor;
    use permissable_cache::Cacheable;

    struct User {
        admin: bool,
    }

    impl Actor for User {
        fn cache_key(&self) -> String {
            format!("User{}", self.admin)
        }
    }

    struct Thing;

    impl Cacheable for Thing {
        fn type_name(&self) -> &str {
            "Thing"
        }

        fn identifier(&self) -> Option<String> {
            None
        }
    }

    impl PermissionSource for Thing {
        type Actor = User;
    }

    #[test]
    fn test_rule_defaults_to_full_scope() {
        let rule = Rule::<Thing>::new(&["hat"], Predicate::constant(true), &[]);
        assert_eq!(rule.actions(), &["hat".to_string()]);
        assert_eq!(rule.allowed_scopes().iter().collect::<Vec<_>>(), vec!["full"]);
        assert!(!rule.requires_actor());
    }

    #[test]
    fn test_rule_with_star_scope() {
        let rule = Rule::<Thing>::new(&["cat"], Predicate::constant(true), &["*"]);
        assert_eq!(rule.allowed_scopes().iter().collect::<Vec<_>>(), vec!["*", "full"]);
        assert!(rule.honored_under(&["*".to_string()]));
    }

    #[test]
    fn test_applies_to_exact_match_only() {
        let rule = Rule::<Thing>::new(&["frog", "horse"], Predicate::constant(true), &[]);
        assert!(rule.applies_to("frog"));
        assert!(rule.applies_to("horse"));
        assert!(!rule.applies_to("hors"));
        assert!(!rule.applies_to("frogs"));
    }

    #[test]
    fn test_actor_predicate_skipped_without_actor() {
        let rule = Rule::<Thing>::new(&["cat"], Predicate::actor(|_, u: &User| Ok(u.admin)), &[]);
        assert!(rule.requires_actor());
        assert_eq!(rule.check(0, &Thing, None).unwrap(), None);
        assert_eq!(rule.check(0, &Thing, Some(&User { admin: true })).unwrap(), Some(true));
        assert_eq!(rule.check(0, &Thing, Some(&User { admin: false })).unwrap(), Some(false));
    }

    #[test]
    fn test_failing_predicate_is_tagged() {
        let rule = Rule::<Thing>::new(&["bacon", "eggs"], Predicate::anonymous(|_| Err("jkl".into())), &[]);
        let err = rule.check(4, &Thing, None).unwrap_err();
        assert_eq!(err.rule_index(), 4);
        assert_eq!(err.to_string(), "Predicate for rule #4 (bacon,eggs) failed: jkl");
    }

    #[test]
    fn test_predicate_debug() {
        assert_eq!(format!("{:?}", Predicate::<Thing>::constant(false)), "Predicate::Anonymous");
    }
}
