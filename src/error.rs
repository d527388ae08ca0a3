//! Engine errors.
//!
//! Every failure is an authoring defect reported to the caller immediately.
//! Nothing here is transient or retryable.

use crate::core::{ActionError, StateId};
use thiserror::Error;

/// Errors raised while building or driving a machine.
#[derive(Debug, Error)]
pub enum HsmError {
    /// An operation was called in a state that does not allow it.
    #[error("Precondition violated: {reason}")]
    PreconditionViolation { reason: String },

    /// The state graph is malformed. All detected violations are reported.
    #[error("Invalid topology: {}", format_violations(.violations))]
    InvalidTopology { violations: Vec<TopologyViolation> },

    /// A fallible action returned an error; the dispatch was aborted.
    #[error("Action '{handler}' failed: {source}")]
    ActionFailed {
        handler: String,
        #[source]
        source: ActionError,
    },

    /// Unconditional chaining did not settle within the configured bound.
    #[error("Unconditional transition chain exceeded {limit} steps")]
    ChainLimitExceeded { limit: usize },
}

impl HsmError {
    pub(crate) fn precondition(reason: impl Into<String>) -> Self {
        HsmError::PreconditionViolation {
            reason: reason.into(),
        }
    }

    pub(crate) fn topology(violation: TopologyViolation) -> Self {
        HsmError::InvalidTopology {
            violations: vec![violation],
        }
    }
}

impl From<crate::builder::BuildError> for HsmError {
    fn from(err: crate::builder::BuildError) -> Self {
        HsmError::precondition(err.to_string())
    }
}

/// A single reason a state graph is invalid.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopologyViolation {
    #[error("state {0} does not belong to this machine")]
    UnknownState(StateId),

    #[error("transition from '{from}' targets unknown state {target}")]
    UnknownTarget { from: String, target: StateId },

    #[error("transition from '{from}' targets initial pseudostate '{target}'")]
    TargetsInitialPseudostate { from: String, target: String },

    #[error("'{0}' is not a composite state")]
    NotComposite(String),

    #[error("initial pseudostate of '{composite}' is bound to '{target}', which is not one of its children")]
    InitialOutsideRegion { composite: String, target: String },

    #[error("initial pseudostate of '{0}' must hold exactly one unguarded transition")]
    MalformedInitial(String),

    #[error("cycle of unguarded transitions through {}", .0.join(" -> "))]
    UnguardedCycle(Vec<String>),

    #[error("topology is frozen once the machine has started")]
    Frozen,
}

fn format_violations(violations: &[TopologyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_error_lists_every_violation() {
        let err = HsmError::InvalidTopology {
            violations: vec![
                TopologyViolation::NotComposite("Idle".to_string()),
                TopologyViolation::Frozen,
            ],
        };

        assert_eq!(
            err.to_string(),
            "Invalid topology: 'Idle' is not a composite state; \
             topology is frozen once the machine has started"
        );
    }

    #[test]
    fn build_errors_are_preconditions() {
        let err: HsmError = crate::builder::BuildError::MissingTarget.into();
        assert!(matches!(err, HsmError::PreconditionViolation { .. }));
    }

    #[test]
    fn cycle_violation_shows_path() {
        let violation =
            TopologyViolation::UnguardedCycle(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(
            violation.to_string(),
            "cycle of unguarded transitions through A -> B -> A"
        );
    }
}
