//! Clusters: typed groups of nodes with a recency queue and plasticity.
//!
//! A cluster does not own its nodes; the network arena does. The cluster's
//! recency queue refers to them by [`NodeId`] and is swept by
//! `Network::clean()` once a node is no longer retained.

use crate::recency::RecencyQueue;
use std::fmt;
use xng_core::error::{Result, XngError};
use xng_core::types::{Activation, ClusterId, ClusterKind, NodeId};

/// Callback invoked synchronously inside every firing of a cluster's nodes.
pub type Observer = Box<dyn FnMut(&Activation)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

pub struct Cluster {
    id: ClusterId,
    kind: ClusterKind,
    name: String,
    plasticity: Option<f32>,
    pub(crate) queue: RecencyQueue<NodeId>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    pub(crate) address: Option<NodeId>,
}

impl Cluster {
    pub(crate) fn new(id: ClusterId, kind: ClusterKind, name: String, plasticity: f32) -> Self {
        Self {
            id,
            kind,
            name,
            plasticity: kind.is_posterior().then_some(plasticity),
            queue: RecencyQueue::new(),
            observers: Vec::new(),
            next_observer: 0,
            address: None,
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn kind(&self) -> ClusterKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plasticity applied when nodes of this cluster are reinforced as
    /// posteriors. Input clusters have none.
    pub fn plasticity(&self) -> Option<f32> {
        self.plasticity
    }

    pub fn set_plasticity(&mut self, plasticity: f32) -> Result<()> {
        if !self.kind.is_posterior() {
            return Err(XngError::NotAPosteriorCluster {
                cluster: self.id,
                kind: self.kind,
            });
        }
        if !(0.0..=1.0).contains(&plasticity) {
            return Err(XngError::PlasticityOutOfRange(plasticity));
        }
        self.plasticity = Some(plasticity);
        Ok(())
    }

    /// The dedicated address node of a short-term memory cluster.
    pub fn address(&self) -> Option<NodeId> {
        self.address
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Nodes from most to least recently activated. Nodes that never fired
    /// come last.
    pub fn activations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.queue.iter().copied()
    }

    pub fn observe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&Activation) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(o, _)| *o != id);
        self.observers.len() != before
    }

    pub(crate) fn notify(&mut self, activation: &Activation) {
        for (_, observer) in self.observers.iter_mut() {
            observer(activation);
        }
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("plasticity", &self.plasticity)
            .field("len", &self.queue.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
