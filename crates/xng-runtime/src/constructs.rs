//! Constructs: small reusable circuits assembled from ordinary nodes.
//!
//! - [`Latch`]: one bit of state with set/clear actions and edge-triggered outputs
//! - [`BooleanDecoder`]: an action that routes to one of two inputs by predicate
//! - [`Sequence`]: a builder that chains execution nodes into timed programs

use crate::network::Network;
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;
use xng_core::error::Result;
use xng_core::profile::IntegrationProfile;
use xng_core::types::{ClusterId, Duration, NodeId};

/// A one-bit memory.
///
/// Firing `set` or `clear` changes the state and, on a transition, fires
/// `is_true` or `is_false` respectively. Firing `read` fires the output
/// matching the current state.
#[derive(Debug, Clone)]
pub struct Latch {
    state: Rc<Cell<bool>>,
    pub set: NodeId,
    pub clear: NodeId,
    pub read: NodeId,
    pub is_true: NodeId,
    pub is_false: NodeId,
}

impl Latch {
    /// Build a latch with its actions in `actions` and outputs in `input`.
    pub fn new(net: &mut Network, actions: ClusterId, input: ClusterId) -> Result<Self> {
        let state = Rc::new(Cell::new(false));
        let is_true = net.add_node(input)?;
        let is_false = net.add_node(input)?;

        let s = state.clone();
        let set = net.add_action(actions, move |net| {
            if s.replace(true) {
                return Ok(());
            }
            net.activate(is_true)
        })?;

        let s = state.clone();
        let clear = net.add_action(actions, move |net| {
            if !s.replace(false) {
                return Ok(());
            }
            net.activate(is_false)
        })?;

        let s = state.clone();
        let read = net.add_action(actions, move |net| {
            net.activate(if s.get() { is_true } else { is_false })
        })?;

        Ok(Self {
            state,
            set,
            clear,
            read,
            is_true,
            is_false,
        })
    }

    pub fn get(&self) -> bool {
        self.state.get()
    }
}

/// Evaluates a predicate over the network when `node` fires and fires
/// `is_true` or `is_false` with the result.
#[derive(Debug, Clone, Copy)]
pub struct BooleanDecoder {
    pub node: NodeId,
    pub is_true: NodeId,
    pub is_false: NodeId,
}

impl BooleanDecoder {
    pub fn new<P>(
        net: &mut Network,
        actions: ClusterId,
        input: ClusterId,
        mut predicate: P,
    ) -> Result<Self>
    where
        P: FnMut(&Network) -> bool + 'static,
    {
        let is_true = net.add_node(input)?;
        let is_false = net.add_node(input)?;
        let node = net.add_action(actions, move |net| {
            let out = if predicate(&*net) { is_true } else { is_false };
            net.activate(out)
        })?;
        Ok(Self {
            node,
            is_true,
            is_false,
        })
    }
}

/// Chain builder for execution sequences.
///
/// Each step hangs a fresh node from the `execution` cluster off the current
/// tail, so consecutive steps fire one edge delay apart. `head` is fixed at
/// construction and is the node to activate to run the sequence.
///
/// ```rust
/// use xng_core::prelude::*;
/// use xng_runtime::constructs::Sequence;
/// use xng_runtime::network::Network;
///
/// let mut net = Network::new();
/// let exec = net.add_cluster(ClusterKind::Bi, "execution");
/// let (start, a, b) = (
///     net.add_node(exec).unwrap(),
///     net.add_node(exec).unwrap(),
///     net.add_node(exec).unwrap(),
/// );
///
/// Sequence::new(start, exec)
///     .then_sequential(&mut net, &[a, b])
///     .unwrap();
///
/// net.activate(start).unwrap();
/// net.fast_forward_until_idle().unwrap();
/// assert_eq!(net.node(a).unwrap().last_activation(), Some(20));
/// assert_eq!(net.node(b).unwrap().last_activation(), Some(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    head: NodeId,
    tail: NodeId,
    execution: ClusterId,
}

impl Sequence {
    pub fn new(head: NodeId, execution: ClusterId) -> Self {
        Self {
            head,
            tail: head,
            execution,
        }
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn tail(&self) -> NodeId {
        self.tail
    }

    /// Step once, then fire `next` off the new tail. `next` does not become
    /// the tail.
    pub fn then(self, net: &mut Network, next: NodeId) -> Result<Self> {
        let seq = self.step(net)?;
        net.then(seq.tail, next)?;
        Ok(seq)
    }

    /// Wire `next` straight off the tail and continue from it.
    pub fn then_direct(mut self, net: &mut Network, next: NodeId) -> Result<Self> {
        net.then(self.tail, next)?;
        self.tail = next;
        Ok(self)
    }

    /// One step per node, each node fired by its own step.
    pub fn then_sequential(self, net: &mut Network, nodes: &[NodeId]) -> Result<Self> {
        let mut seq = self;
        for &node in nodes {
            seq = seq.step(net)?;
            net.then(seq.tail, node)?;
        }
        Ok(seq)
    }

    /// A single step firing every node at once.
    pub fn then_parallel(self, net: &mut Network, nodes: &[NodeId]) -> Result<Self> {
        let seq = self.step(net)?;
        for &node in nodes {
            net.then(seq.tail, node)?;
        }
        Ok(seq)
    }

    /// A single empty step.
    pub fn then_delay(self, net: &mut Network) -> Result<Self> {
        self.step(net)
    }

    /// Empty steps paced by the TRANSIENT default interval until `period`
    /// is covered.
    pub fn then_delay_for(self, net: &mut Network, period: Duration) -> Result<Self> {
        let dt = IntegrationProfile::TRANSIENT.default_interval();
        let mut seq = self;
        let mut t = 0;
        while t < period {
            seq = seq.step(net)?;
            t += dt;
        }
        Ok(seq)
    }

    fn step(mut self, net: &mut Network) -> Result<Self> {
        let next = net.add_node(self.execution)?;
        net.then(self.tail, next)?;
        trace!(from = %self.tail, to = %next, "sequence step");
        self.tail = next;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DataValue;
    use xng_core::types::{ClusterKind, Tick};

    struct Fixture {
        net: Network,
        input: ClusterId,
        actions: ClusterId,
        exec: ClusterId,
    }

    fn fixture() -> Fixture {
        let mut net = Network::new();
        let input = net.add_cluster(ClusterKind::Input, "input");
        let actions = net.add_cluster(ClusterKind::Action, "actions");
        let exec = net.add_cluster(ClusterKind::Bi, "execution");
        Fixture {
            net,
            input,
            actions,
            exec,
        }
    }

    fn fired(net: &Network, node: NodeId) -> Option<Tick> {
        net.node(node).unwrap().last_activation()
    }

    #[test]
    fn latch_fires_on_transitions_only() {
        let Fixture {
            mut net,
            input,
            actions,
            ..
        } = fixture();
        let latch = Latch::new(&mut net, actions, input).unwrap();
        assert!(!latch.get());

        net.activate(latch.clear).unwrap();
        assert_eq!(fired(&net, latch.is_false), None);

        net.activate(latch.set).unwrap();
        assert!(latch.get());
        assert_eq!(fired(&net, latch.is_true), Some(0));

        net.run_for(5).unwrap();
        net.activate(latch.set).unwrap();
        assert_eq!(fired(&net, latch.is_true), Some(0));

        net.activate(latch.read).unwrap();
        assert_eq!(fired(&net, latch.is_true), Some(5));

        net.activate(latch.clear).unwrap();
        assert!(!latch.get());
        assert_eq!(fired(&net, latch.is_false), Some(5));
    }

    #[test]
    fn decoder_routes_by_predicate() {
        let Fixture {
            mut net,
            input,
            actions,
            ..
        } = fixture();
        let data = net.add_cluster(ClusterKind::Data, "data");
        let flag = net.add_data(data, Some(DataValue::Bool(false))).unwrap();

        let decoder = BooleanDecoder::new(&mut net, actions, input, move |net| {
            matches!(net.data(flag), Ok(Some(DataValue::Bool(true))))
        })
        .unwrap();

        net.activate(decoder.node).unwrap();
        assert_eq!(fired(&net, decoder.is_false), Some(0));
        assert_eq!(fired(&net, decoder.is_true), None);

        net.run_for(1).unwrap();
        net.set_data(flag, true).unwrap();
        net.activate(decoder.node).unwrap();
        assert_eq!(fired(&net, decoder.is_true), Some(1));
    }

    #[test]
    fn parallel_step_fires_together() {
        let Fixture {
            mut net,
            input,
            exec,
            ..
        } = fixture();
        let start = net.add_node(input).unwrap();
        let a = net.add_node(exec).unwrap();
        let b = net.add_node(exec).unwrap();

        let seq = Sequence::new(start, exec)
            .then_parallel(&mut net, &[a, b])
            .unwrap();
        assert_eq!(seq.head(), start);

        net.activate(start).unwrap();
        net.fast_forward_until_idle().unwrap();
        assert_eq!(fired(&net, a), Some(20));
        assert_eq!(fired(&net, b), Some(20));
        assert_eq!(fired(&net, seq.tail()), Some(10));
    }

    #[test]
    fn delay_for_is_paced_by_the_default_interval() {
        let Fixture {
            mut net,
            input,
            exec,
            ..
        } = fixture();
        let start = net.add_node(input).unwrap();
        let done = net.add_node(exec).unwrap();
        let before = net.node_count();

        Sequence::new(start, exec)
            .then_delay_for(&mut net, IntegrationProfile::TRANSIENT.period())
            .unwrap()
            .then(&mut net, done)
            .unwrap();
        // eight delay steps plus the step carrying `done`
        assert_eq!(net.node_count() - before, 9);

        net.activate(start).unwrap();
        net.fast_forward_until_idle().unwrap();
        assert_eq!(fired(&net, done), Some(100));
    }

    #[test]
    fn direct_continues_from_the_target() {
        let Fixture {
            mut net,
            input,
            exec,
            ..
        } = fixture();
        let start = net.add_node(input).unwrap();
        let mid = net.add_node(exec).unwrap();
        let end = net.add_node(exec).unwrap();

        let seq = Sequence::new(start, exec)
            .then_direct(&mut net, mid)
            .unwrap()
            .then_delay(&mut net)
            .unwrap()
            .then_direct(&mut net, end)
            .unwrap();
        assert_eq!(seq.tail(), end);

        net.activate(start).unwrap();
        net.fast_forward_until_idle().unwrap();
        assert_eq!(fired(&net, mid), Some(10));
        assert_eq!(fired(&net, end), Some(30));
    }
}
