//! Error types for xng operations.
//!
//! Every error here is a caller error: the engine never swallows them,
//! and a failed call leaves network state unchanged.

use crate::types::{ClusterId, ClusterKind, NodeId, Tick};
use thiserror::Error;

/// Result type for xng operations.
pub type Result<T> = std::result::Result<T, XngError>;

/// Errors that can occur while building or driving a network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XngError {
    /// A task was scheduled before the current virtual time.
    #[error("cannot schedule at tick {at}; clock is already at {now}")]
    InvalidTime { at: Tick, now: Tick },

    /// A conjunction over this many priors could fire on one fewer.
    #[error(
        "too many priors ({count}) to guarantee a reliable conjunction \
         (coefficient {coefficient}); stage the evaluation into a tree"
    )]
    TooManyPriors { count: usize, coefficient: f32 },

    /// A context lookup for a key that was never bound.
    #[error("context missing required key {0}")]
    UnknownKey(NodeId),

    /// Plasticity must lie in [0, 1].
    #[error("plasticity ({0}) must be in [0, 1]")]
    PlasticityOutOfRange(f32),

    /// A profile with a non-positive ramp or negative period.
    #[error("invalid integration profile ({ramp_up}, {period}, {ramp_down})")]
    InvalidProfile {
        ramp_up: i64,
        period: i64,
        ramp_down: i64,
    },

    /// The node was never created or has been reclaimed.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The cluster does not exist in this network.
    #[error("cluster not found: {0}")]
    ClusterNotFound(ClusterId),

    /// The node cannot originate edges.
    #[error("node {0} is not a prior")]
    NotAPrior(NodeId),

    /// The node cannot receive edges.
    #[error("node {0} is not a posterior")]
    NotAPosterior(NodeId),

    /// Plasticity was requested from a cluster that never acts as a posterior.
    #[error("cluster {cluster} ({kind}) is not a posterior cluster")]
    NotAPosteriorCluster { cluster: ClusterId, kind: ClusterKind },

    /// The operation requires a cluster of a different kind.
    #[error("cluster {cluster} is {found}, expected {expected}")]
    WrongClusterKind {
        cluster: ClusterId,
        expected: ClusterKind,
        found: ClusterKind,
    },

    /// Data was written to a final (immutable) data node.
    #[error("data node {0} is final")]
    ImmutableData(NodeId),

    /// Invalid configuration value.
    #[error("invalid value for {field}: {value} ({reason})")]
    Config {
        field: String,
        value: String,
        reason: String,
    },
}

// Convenience constructors
impl XngError {
    pub fn invalid_time(at: Tick, now: Tick) -> Self {
        XngError::InvalidTime { at, now }
    }

    pub fn invalid_config(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        XngError::Config {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error stems from a handle that no longer resolves.
    pub fn is_stale_handle(&self) -> bool {
        matches!(self, XngError::NodeNotFound(_) | XngError::ClusterNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = XngError::invalid_time(3, 7);
        assert_eq!(err.to_string(), "cannot schedule at tick 3; clock is already at 7");

        let err = XngError::PlasticityOutOfRange(1.5);
        assert!(err.to_string().contains("1.5"));

        let err = XngError::invalid_config("trace_retention", -4, "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid value for trace_retention: -4 (must be positive)"
        );
    }

    #[test]
    fn stale_handles_are_classified() {
        assert!(XngError::NodeNotFound(NodeId::new(1, 0)).is_stale_handle());
        assert!(!XngError::UnknownKey(NodeId::new(1, 0)).is_stale_handle());
    }
}
