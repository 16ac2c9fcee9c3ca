//! Error types for permission evaluation
//!
//! Evaluation itself only fails when a caller-supplied predicate fails.
//! Cache problems are absorbed by the cache layer and never show up here.

use thiserror::Error;

/// Error a predicate may return. Kept boxed so rule authors can use any
/// error type.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

/// Permission evaluation error types.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// A rule's predicate failed; evaluation stopped at that rule
    #[error("Predicate for rule #{rule} ({actions}) failed: {source}")]
    Predicate {
        /// Position of the rule in registration order
        rule: usize,
        /// The rule's actions, comma-joined
        actions: String,
        /// The predicate's own error
        #[source]
        source: PredicateError,
    },
}

/// Result type for permission evaluation.
pub type PermissionResult<T> = Result<T, PermissionError>;

impl PermissionError {
    /// The predicate's error, as returned by the rule author.
    pub fn predicate_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            PermissionError::Predicate { source, .. } => source.as_ref(),
        }
    }

    /// Position of the failing rule.
    pub fn rule_index(&self) -> usize {
        match self {
            PermissionError::Predicate { rule, .. } => *rule,
        }
    }
}
