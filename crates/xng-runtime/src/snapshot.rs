//! Read-only export of network state.
//!
//! A snapshot captures what a persistence layer would need to reproduce
//! learning state: recency order per cluster, plasticity, and every edge
//! with its full smoothing statistics. It is not loaded back.

use crate::network::Network;
use crate::node::DataValue;
use serde::{Deserialize, Serialize};
use xng_core::distribution::Distribution;
use xng_core::profile::IntegrationProfile;
use xng_core::types::{ClusterId, ClusterKind, NodeId, Tick};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub now: Tick,
    pub clusters: Vec<ClusterSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub id: ClusterId,
    pub kind: ClusterKind,
    pub name: String,
    pub plasticity: Option<f32>,
    /// Nodes from most to least recently activated.
    pub recency: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub last_activation: Option<Tick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub prior: NodeId,
    pub posterior: NodeId,
    pub profile: IntegrationProfile,
    pub distribution: Distribution,
}

impl NetworkSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn node_count(&self) -> usize {
        self.clusters.iter().map(|c| c.recency.len()).sum()
    }
}

impl Network {
    /// Capture the current state. Edges are listed per prior, in cluster and
    /// recency order, then in the prior's edge insertion order.
    pub fn snapshot(&self) -> NetworkSnapshot {
        let mut clusters = Vec::new();
        let mut edges = Vec::new();

        for cluster in self.clusters() {
            let mut recency = Vec::new();
            for id in cluster.activations() {
                let Ok(node) = self.node(id) else { continue };
                recency.push(NodeSnapshot {
                    id,
                    label: node.label().map(str::to_string),
                    last_activation: node.last_activation(),
                    data: node.data().cloned(),
                });
                if let Ok(posteriors) = self.posteriors(id) {
                    edges.extend(posteriors.into_iter().map(|(posterior, edge)| EdgeSnapshot {
                        prior: id,
                        posterior,
                        profile: edge.profile(),
                        distribution: edge.distribution().clone(),
                    }));
                }
            }
            clusters.push(ClusterSnapshot {
                id: cluster.id(),
                kind: cluster.kind(),
                name: cluster.name().to_string(),
                plasticity: cluster.plasticity(),
                recency,
            });
        }

        NetworkSnapshot {
            now: self.now(),
            clusters,
            edges,
        }
    }
}
