//! # Decisions
//!
//! Result types for single-action checks and bulk permission maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a single-action check.
///
/// `scope_rejected` is set when some rule's predicate would have granted
/// the action but none of its allowed scopes matched the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the action is permitted.
    pub granted: bool,
    /// Whether the denial was due to scopes alone.
    pub scope_rejected: bool,
}

impl Decision {
    /// A granted decision.
    pub fn granted() -> Self {
        Self {
            granted: true,
            scope_rejected: false,
        }
    }

    /// A denial, flagged as scope-rejected or not.
    pub fn denied(scope_rejected: bool) -> Self {
        Self {
            granted: false,
            scope_rejected,
        }
    }

    /// Check if the action is permitted.
    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

impl From<Decision> for bool {
    fn from(decision: Decision) -> bool {
        decision.granted
    }
}

/// Map entry holding the actor id; not usable as an action name.
pub const USER_ID_KEY: &str = "user_id";

/// Every action value computed for one actor, entity and scope set.
///
/// Serializes as a flat JSON object with a `user_id` entry next to the
/// action entries:
///
/// ```text
/// {"user_id": null, "jump": true, "fly": false}
/// ```
///
/// An action is `true` when granted, `false` when a predicate passed but no
/// scope matched, and absent otherwise. Since `user_id` shares the object
/// with the actions, [`PermissionPolicy::register`](crate::PermissionPolicy::register)
/// drops an action of that name.
///
/// # Example
///
/// ```
/// use permissable::PermissionMap;
///
/// let mut map = PermissionMap::new(None);
/// map.grant("jump");
/// map.reject("fly");
///
/// assert!(map.is_granted("jump"));
/// assert!(map.is_scope_rejected("fly"));
/// assert_eq!(map.get("swing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMap {
    /// Global id of the actor the map was computed for.
    pub user_id: Option<String>,

    #[serde(flatten)]
    actions: BTreeMap<String, bool>,
}

impl PermissionMap {
    /// Create an empty map for the given actor id.
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id,
            actions: BTreeMap::new(),
        }
    }

    /// The stored value for `action`, if any.
    pub fn get(&self, action: &str) -> Option<bool> {
        self.actions.get(action).copied()
    }

    /// Check if `action` is granted.
    pub fn is_granted(&self, action: &str) -> bool {
        self.get(action) == Some(true)
    }

    /// Check if `action` was explicitly rejected by scope.
    pub fn is_scope_rejected(&self, action: &str) -> bool {
        self.get(action) == Some(false)
    }

    /// Mark `action` as granted.
    pub fn grant(&mut self, action: impl Into<String>) {
        self.actions.insert(action.into(), true);
    }

    /// Record a scope rejection for `action` unless it already has a value.
    pub fn reject(&mut self, action: impl Into<String>) {
        self.actions.entry(action.into()).or_insert(false);
    }

    /// Check if every action in `actions` is already granted.
    pub fn all_granted<S: AsRef<str>>(&self, actions: &[S]) -> bool {
        actions.iter().all(|a| self.is_granted(a.as_ref()))
    }

    /// Granted action names, sorted.
    pub fn granted_actions(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter(|(_, granted)| **granted)
            .map(|(action, _)| action.as_str())
    }

    /// All action entries, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.actions.iter().map(|(action, value)| (action.as_str(), *value))
    }

    /// Number of action entries (excluding `user_id`).
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if no action has a value.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_constructors() {
        assert!(Decision::granted().is_granted());
        assert!(!Decision::denied(true).is_granted());
        assert!(Decision::denied(true).scope_rejected);
        assert!(!bool::from(Decision::default()));
    }

    #[test]
    fn test_reject_never_downgrades() {
        let mut map = PermissionMap::new(None);
        map.grant("jump");
        map.reject("jump");
        assert_eq!(map.get("jump"), Some(true));

        map.reject("fly");
        map.reject("fly");
        assert_eq!(map.get("fly"), Some(false));

        map.grant("fly");
        assert_eq!(map.get("fly"), Some(true));
    }

    #[test]
    fn test_all_granted() {
        let mut map = PermissionMap::new(None);
        map.grant("jump");
        map.reject("fly");
        assert!(map.all_granted(&["jump"]));
        assert!(!map.all_granted(&["jump", "fly"]));
        assert!(!map.all_granted(&["swing"]));
        assert_eq!(map.granted_actions().collect::<Vec<_>>(), vec!["jump"]);
    }

    #[test]
    fn test_json_shape() {
        let mut map = PermissionMap::new(None);
        map.grant("jump");
        map.reject("fly");

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"user_id": null, "jump": true, "fly": false})
        );

        let parsed: PermissionMap = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_json_with_user_id() {
        let parsed: PermissionMap =
            serde_json::from_str(r#"{"user_id":"1_42","edit":true}"#).unwrap();
        assert_eq!(parsed.user_id.as_deref(), Some("1_42"));
        assert!(parsed.is_granted("edit"));
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_json_rejects_non_boolean_actions() {
        assert!(serde_json::from_str::<PermissionMap>(r#"{"a":1}"#).is_err());
    }
}
