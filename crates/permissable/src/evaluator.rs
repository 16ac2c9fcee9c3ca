//! Rule evaluation.
//!
//! Two strategies over the same rule table:
//!
//! - **Single action**: scan in order, stop at the first rule whose
//!   predicate passes under a matching scope. Later rules never run.
//! - **Bulk**: one pass over every rule, skipping rules whose actions are
//!   all granted already. Produces a [`PermissionMap`].
//!
//! Both take already-resolved request scopes (see
//! [`resolve_scopes`](crate::scopes::resolve_scopes)). Neither touches the
//! cache; that is the authorizer's job.

use crate::decision::{Decision, PermissionMap};
use crate::error::PermissionResult;
use crate::policy::PermissionPolicy;
use crate::subject::{Actor, PermissionSource};

impl<E: PermissionSource> PermissionPolicy<E> {
    /// Decide one action by scanning the rule table.
    ///
    /// A predicate that passes without a matching scope does not end the
    /// scan; a later rule may still grant the action under other scopes.
    /// If none does, the decision is flagged scope-rejected.
    pub fn evaluate(
        &self,
        entity: &E,
        actor: Option<&E::Actor>,
        action: &str,
        scopes: &[String],
    ) -> PermissionResult<Decision> {
        let mut scope_rejected = false;

        for (index, rule) in self.rules().iter().enumerate() {
            if !rule.applies_to(action) {
                continue;
            }

            let Some(verdict) = rule.check(index, entity, actor)? else {
                tracing::trace!(index, action, "Skipped rule requiring an actor");
                continue;
            };

            if !verdict {
                continue;
            }

            if rule.honored_under(scopes) {
                tracing::trace!(index, action, "Rule granted action");
                return Ok(Decision::granted());
            }

            tracing::trace!(index, action, "Rule passed but no scope matched");
            scope_rejected = true;
        }

        Ok(Decision::denied(scope_rejected))
    }

    /// Compute every action value in one pass over the rule table.
    ///
    /// A passing rule grants all its actions when its scopes match and
    /// otherwise records `false` for those that have no value yet. A
    /// failing predicate leaves its actions untouched, so they stay absent
    /// unless another rule sets them.
    pub fn evaluate_all(
        &self,
        entity: &E,
        actor: Option<&E::Actor>,
        scopes: &[String],
    ) -> PermissionResult<PermissionMap> {
        let mut granted = PermissionMap::new(actor.and_then(|a| a.global_id()));

        for (index, rule) in self.rules().iter().enumerate() {
            if rule.requires_actor() && actor.is_none() {
                continue;
            }

            // Nothing left for this rule to add
            if granted.all_granted(rule.actions()) {
                tracing::trace!(index, "Skipped rule whose actions are all granted");
                continue;
            }

            if rule.check(index, entity, actor)? != Some(true) {
                continue;
            }

            let honored = rule.honored_under(scopes);
            for action in rule.actions() {
                if honored {
                    granted.grant(action.as_str());
                } else {
                    granted.reject(action.as_str());
                }
            }
        }

        Ok(granted)
    }
}
