//! Shared types and constants used across all xng crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in virtual time. Ticks are monotonically non-decreasing within a run.
pub type Tick = i64;

/// A signed span of virtual time.
pub type Duration = i64;

/// The value an integrator must reach for its posterior to fire.
pub const THRESHOLD: f32 = 1.0;

/// Headroom added on top of [`THRESHOLD`] when presetting coefficients, so
/// that floating point drift cannot keep an intended firing just short.
pub const THRESHOLD_MARGIN: f32 = 0.2;

/// Coefficient installed by `then` / `disjunction`.
pub const DEFAULT_COEFFICIENT: f32 = THRESHOLD + THRESHOLD_MARGIN;

/// Plasticity of a freshly created posterior cluster.
pub const DEFAULT_PLASTICITY: f32 = 0.1;

/// Weights at or below this magnitude are snapped to zero and their edge is dead.
pub const WEIGHT_EPSILON: f32 = 1e-6;

/// Stable identifier for a node in a network arena.
///
/// The `generation` distinguishes a live node from an earlier, reclaimed
/// occupant of the same slot, so stale references fail lookups instead of
/// aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub index: u32,
    pub generation: u32,
}

impl NodeId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}.{}", self.index, self.generation)
    }
}

/// Identifier for a cluster. Clusters are never reclaimed, so a plain index suffices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// The role of a cluster, which fixes the capabilities of the nodes it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterKind {
    /// Externally driven priors. Never reinforced as posteriors, so no plasticity.
    Input,
    /// Nodes that are both prior and posterior.
    Bi,
    /// Posteriors that run a side effect when activated.
    Action,
    /// Bi nodes carrying a data payload.
    Data,
    /// Short-term memory: a bi cluster with a dedicated address node.
    Stm,
}

impl ClusterKind {
    /// Whether nodes of this cluster can receive edges (and so need plasticity).
    pub fn is_posterior(&self) -> bool {
        !matches!(self, ClusterKind::Input)
    }

    /// Whether nodes of this cluster can originate edges.
    pub fn is_prior(&self) -> bool {
        !matches!(self, ClusterKind::Action)
    }
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClusterKind::Input => "input",
            ClusterKind::Bi => "bi",
            ClusterKind::Action => "action",
            ClusterKind::Data => "data",
            ClusterKind::Stm => "stm",
        };
        f.write_str(name)
    }
}

/// A single node activation, as delivered to cluster observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub node: NodeId,
    pub cluster: ClusterId,
    pub at: Tick,
}

/// Scale `value` toward `identity` by how hot a trace is.
///
/// A trace at or above `1 / (1 + THRESHOLD_MARGIN)` applies `value` in full;
/// a zero trace leaves `identity`.
pub fn weight_by_trace(value: f32, identity: f32, trace: f32) -> f32 {
    let tolerant_trace = (trace * (1.0 + THRESHOLD_MARGIN)).min(1.0);
    identity + (value - identity) * tolerant_trace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_coefficient_clears_threshold_with_margin() {
        assert!((DEFAULT_COEFFICIENT - 1.2).abs() < 1e-6);
    }

    #[test]
    fn weight_by_trace_interpolates() {
        assert_eq!(weight_by_trace(5.0, 1.0, 0.0), 1.0);
        assert_eq!(weight_by_trace(5.0, 1.0, 1.0), 5.0);
        // 0.25 * 1.2 = 0.3 of the way from identity to value
        assert!((weight_by_trace(-1.0, 0.0, 0.25) + 0.3).abs() < 1e-6);
    }

    #[test]
    fn cluster_capabilities() {
        assert!(ClusterKind::Input.is_prior());
        assert!(!ClusterKind::Input.is_posterior());
        assert!(!ClusterKind::Action.is_prior());
        assert!(ClusterKind::Stm.is_prior() && ClusterKind::Stm.is_posterior());
    }
}
