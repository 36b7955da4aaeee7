//! Nodes and edges stored in the network arena.
//!
//! A node's behavior is fixed by the kind of cluster it was created in.
//! Rather than a type per kind, every node carries optional capability
//! records: [`PriorState`] when it can originate edges, [`PosteriorState`]
//! when it can receive them.

use crate::network::Network;
use crate::recency::Link;
use petgraph::stable_graph::EdgeIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use xng_core::distribution::Distribution;
use xng_core::error::Result;
use xng_core::integrator::Trace;
use xng_core::profile::IntegrationProfile;
use xng_core::threshold::ThresholdIntegrator;
use xng_core::types::{ClusterId, ClusterKind, Tick};

/// Side effect run when an action node fires.
pub type SideEffect = Box<dyn FnMut(&mut Network) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Externally driven prior.
    Input,
    /// Prior and posterior.
    Bi,
    /// Posterior with a side effect.
    Action,
    /// Bi node with a data payload.
    Data,
}

impl NodeKind {
    pub fn for_cluster(kind: ClusterKind) -> Self {
        match kind {
            ClusterKind::Input => NodeKind::Input,
            ClusterKind::Bi | ClusterKind::Stm => NodeKind::Bi,
            ClusterKind::Action => NodeKind::Action,
            ClusterKind::Data => NodeKind::Data,
        }
    }

    pub fn is_prior(&self) -> bool {
        !matches!(self, NodeKind::Action)
    }

    pub fn is_posterior(&self) -> bool {
        !matches!(self, NodeKind::Input)
    }
}

/// Payload of a data node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Bool(v) => write!(f, "{v}"),
            DataValue::Int(v) => write!(f, "{v}"),
            DataValue::Float(v) => write!(f, "{v}"),
            DataValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Bool(v)
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int(v)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Float(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::Text(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::Text(v)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DataSlot {
    pub(crate) value: Option<DataValue>,
    pub(crate) mutable: bool,
}

/// Outgoing edges, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PriorState {
    pub(crate) posteriors: Vec<EdgeIndex>,
}

impl PriorState {
    pub fn len(&self) -> usize {
        self.posteriors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posteriors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PosteriorState {
    pub(crate) integrator: ThresholdIntegrator,
}

impl PosteriorState {
    pub fn integrator(&self) -> &ThresholdIntegrator {
        &self.integrator
    }
}

pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) cluster: ClusterId,
    pub(crate) link: Link,
    pub(crate) trace: Trace,
    pub(crate) last_activation: Option<Tick>,
    /// External retainers; incoming edges are counted by the graph itself.
    pub(crate) retainers: u32,
    pub(crate) prior: Option<PriorState>,
    pub(crate) posterior: Option<PosteriorState>,
    pub(crate) action: Option<SideEffect>,
    pub(crate) data: Option<DataSlot>,
    pub(crate) label: Option<String>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, cluster: ClusterId, link: Link, trace: Trace) -> Self {
        Self {
            kind,
            cluster,
            link,
            trace,
            last_activation: None,
            retainers: 1,
            prior: kind.is_prior().then(PriorState::default),
            posterior: kind.is_posterior().then(PosteriorState::default),
            action: None,
            data: (kind == NodeKind::Data).then_some(DataSlot {
                value: None,
                mutable: true,
            }),
            label: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn cluster(&self) -> ClusterId {
        self.cluster
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn last_activation(&self) -> Option<Tick> {
        self.last_activation
    }

    pub fn retainers(&self) -> u32 {
        self.retainers
    }

    pub fn prior(&self) -> Option<&PriorState> {
        self.prior.as_ref()
    }

    pub fn posterior(&self) -> Option<&PosteriorState> {
        self.posterior.as_ref()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn data(&self) -> Option<&DataValue> {
        self.data.as_ref().and_then(|d| d.value.as_ref())
    }

    /// Whether this is a data node whose payload can still be replaced.
    pub fn is_mutable_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.mutable)
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("cluster", &self.cluster)
            .field("last_activation", &self.last_activation)
            .field("retainers", &self.retainers)
            .field("label", &self.label)
            .field("data", &self.data())
            .finish()
    }
}

/// A directed prior → posterior connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub(crate) profile: IntegrationProfile,
    pub(crate) distribution: Distribution,
}

impl Edge {
    pub(crate) fn new(profile: IntegrationProfile, distribution: Distribution) -> Self {
        Self {
            profile,
            distribution,
        }
    }

    pub fn profile(&self) -> IntegrationProfile {
        self.profile
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn weight(&self) -> f32 {
        self.distribution.weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_cluster_kinds() {
        assert_eq!(NodeKind::for_cluster(ClusterKind::Stm), NodeKind::Bi);
        assert!(NodeKind::for_cluster(ClusterKind::Input).is_prior());
        assert!(!NodeKind::for_cluster(ClusterKind::Input).is_posterior());
        assert!(!NodeKind::Action.is_prior());
        assert!(NodeKind::Data.is_prior() && NodeKind::Data.is_posterior());
    }

    #[test]
    fn data_values_display() {
        assert_eq!(DataValue::from(3i64).to_string(), "3");
        assert_eq!(DataValue::from("hi").to_string(), "\"hi\"");
        assert_eq!(DataValue::from(true).to_string(), "true");
    }
}
