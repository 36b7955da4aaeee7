//! Network: the single worker that owns every node, edge and cluster.
//!
//! All state lives in one arena (a `StableDiGraph`) and is mutated only by
//! tasks popped from the virtual-time scheduler, one at a time.
//!
//! A firing at `t`:
//! 1. records `(t, 1)` on the node's trace and sets `last_activation`
//! 2. promotes the node in its cluster and notifies observers
//! 3. for each outgoing edge, in insertion order, applies reverse STDP and
//!    either removes the edge (weight collapsed) or schedules a contribution
//!    at `t + delay`
//! 4. runs the node's side effect, if it is an action node
//!
//! Contributions land on the posterior's threshold integrator, which may in
//! turn schedule a firing. Superseded firings are dropped by token.

use crate::cluster::{Cluster, ObserverId};
use crate::config::NetworkConfig;
use crate::node::{DataValue, Edge, Node, NodeKind};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::{debug, trace, warn};
use xng_core::error::{Result, XngError};
use xng_core::integrator::{Impulse, Trace};
use xng_core::profile::IntegrationProfile;
use xng_core::scheduler::Scheduler;
use xng_core::threshold::Reschedule;
use xng_core::types::{Activation, ClusterId, ClusterKind, Duration, NodeId, Tick};

type Callback = Box<dyn FnOnce(&mut Network) -> Result<()>>;

enum Task {
    Activate(NodeId),
    Contribute { posterior: NodeId, impulse: Impulse },
    Threshold { node: NodeId, token: u64 },
    Call(Callback),
}

impl Task {
    fn describe(&self) -> &'static str {
        match self {
            Task::Activate(_) => "activate",
            Task::Contribute { .. } => "contribute",
            Task::Threshold { .. } => "threshold",
            Task::Call(_) => "call",
        }
    }
}

pub(crate) type Graph = StableDiGraph<Node, Edge>;

/// The simulation: scheduler, node arena and clusters.
pub struct Network {
    config: NetworkConfig,
    scheduler: Scheduler<Task>,
    pub(crate) graph: Graph,
    generations: Vec<u32>,
    pub(crate) clusters: Vec<Cluster>,
}

impl Network {
    /// Create a network with default configuration.
    pub fn new() -> Self {
        Self::with_valid_config(NetworkConfig::default())
    }

    /// Create a network with the specified configuration.
    pub fn from_config(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: NetworkConfig) -> Self {
        Self {
            config,
            scheduler: Scheduler::new(),
            graph: Graph::default(),
            generations: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Current virtual time.
    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    // ── Clusters ─────────────────────────────────────────────────────

    /// Create a cluster. Short-term memory clusters get their address node here.
    pub fn add_cluster(&mut self, kind: ClusterKind, name: impl Into<String>) -> ClusterId {
        let id = ClusterId(self.clusters.len() as u32);
        let name = name.into();
        debug!(cluster = %id, %kind, name = %name, "cluster created");
        self.clusters
            .push(Cluster::new(id, kind, name, self.config.default_plasticity));

        if kind == ClusterKind::Stm {
            let address = self.insert_node(id, NodeKind::Bi);
            if let Some(idx) = self.resolve(address) {
                self.graph[idx].label = Some("address".to_string());
            }
            self.clusters[id.0 as usize].address = Some(address);
        }
        id
    }

    pub fn cluster(&self, id: ClusterId) -> Result<&Cluster> {
        self.clusters
            .get(id.0 as usize)
            .ok_or(XngError::ClusterNotFound(id))
    }

    pub fn cluster_mut(&mut self, id: ClusterId) -> Result<&mut Cluster> {
        self.clusters
            .get_mut(id.0 as usize)
            .ok_or(XngError::ClusterNotFound(id))
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Subscribe to every activation of a cluster's nodes.
    pub fn observe<F>(&mut self, cluster: ClusterId, observer: F) -> Result<ObserverId>
    where
        F: FnMut(&Activation) + 'static,
    {
        Ok(self.cluster_mut(cluster)?.observe(observer))
    }

    fn expect_kind(&self, cluster: ClusterId, expected: ClusterKind) -> Result<()> {
        let found = self.cluster(cluster)?.kind();
        if found != expected {
            return Err(XngError::WrongClusterKind {
                cluster,
                expected,
                found,
            });
        }
        Ok(())
    }

    // ── Nodes ────────────────────────────────────────────────────────

    /// Create a node whose capabilities follow the cluster's kind. The caller
    /// holds one retain on it.
    pub fn add_node(&mut self, cluster: ClusterId) -> Result<NodeId> {
        let kind = NodeKind::for_cluster(self.cluster(cluster)?.kind());
        Ok(self.insert_node(cluster, kind))
    }

    /// Create an action node that runs `effect` whenever it fires.
    pub fn add_action<F>(&mut self, cluster: ClusterId, effect: F) -> Result<NodeId>
    where
        F: FnMut(&mut Network) -> Result<()> + 'static,
    {
        self.expect_kind(cluster, ClusterKind::Action)?;
        let id = self.insert_node(cluster, NodeKind::Action);
        self.set_action(id, effect)?;
        Ok(id)
    }

    /// Replace the side effect of an action node.
    pub fn set_action<F>(&mut self, node: NodeId, effect: F) -> Result<()>
    where
        F: FnMut(&mut Network) -> Result<()> + 'static,
    {
        let idx = self.index(node)?;
        let n = &mut self.graph[idx];
        if n.kind != NodeKind::Action {
            let cluster = n.cluster;
            return Err(XngError::WrongClusterKind {
                cluster,
                expected: ClusterKind::Action,
                found: self.clusters[cluster.0 as usize].kind(),
            });
        }
        n.action = Some(Box::new(effect));
        Ok(())
    }

    /// Create a mutable data node.
    pub fn add_data(&mut self, cluster: ClusterId, value: Option<DataValue>) -> Result<NodeId> {
        self.expect_kind(cluster, ClusterKind::Data)?;
        let id = self.insert_node(cluster, NodeKind::Data);
        let idx = self.index(id)?;
        if let Some(slot) = self.graph[idx].data.as_mut() {
            slot.value = value;
        }
        Ok(id)
    }

    /// Create a data node whose payload can never change.
    pub fn add_final_data(
        &mut self,
        cluster: ClusterId,
        value: impl Into<DataValue>,
    ) -> Result<NodeId> {
        self.expect_kind(cluster, ClusterKind::Data)?;
        let id = self.insert_node(cluster, NodeKind::Data);
        let idx = self.index(id)?;
        if let Some(slot) = self.graph[idx].data.as_mut() {
            slot.value = Some(value.into());
            slot.mutable = false;
        }
        Ok(id)
    }

    pub fn set_data(&mut self, node: NodeId, value: impl Into<DataValue>) -> Result<()> {
        let idx = self.index(node)?;
        let n = &mut self.graph[idx];
        let cluster = n.cluster;
        match n.data.as_mut() {
            None => Err(XngError::WrongClusterKind {
                cluster,
                expected: ClusterKind::Data,
                found: self.clusters[cluster.0 as usize].kind(),
            }),
            Some(slot) if !slot.mutable => Err(XngError::ImmutableData(node)),
            Some(slot) => {
                slot.value = Some(value.into());
                Ok(())
            }
        }
    }

    pub fn data(&self, node: NodeId) -> Result<Option<&DataValue>> {
        Ok(self.node(node)?.data())
    }

    pub fn set_label(&mut self, node: NodeId, label: impl Into<String>) -> Result<()> {
        let idx = self.index(node)?;
        self.graph[idx].label = Some(label.into());
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        let idx = self.index(id)?;
        Ok(&self.graph[idx])
    }

    /// Whether `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Value of a posterior's threshold integrator at `t`.
    pub fn integrator_value(&self, id: NodeId, t: Tick) -> Result<f32> {
        self.node(id)?
            .posterior()
            .map(|p| p.integrator().value(t))
            .ok_or(XngError::NotAPosterior(id))
    }

    /// Value of a node's trace at `t` under `profile`.
    pub fn trace_value(&self, id: NodeId, t: Tick, profile: &IntegrationProfile) -> Result<f32> {
        Ok(self.node(id)?.trace().evaluate(t, profile))
    }

    pub(crate) fn index(&self, id: NodeId) -> Result<NodeIndex> {
        self.resolve(id).ok_or(XngError::NodeNotFound(id))
    }

    pub(crate) fn resolve(&self, id: NodeId) -> Option<NodeIndex> {
        let idx = NodeIndex::new(id.index as usize);
        let current = self.generations.get(id.index as usize) == Some(&id.generation);
        (current && self.graph.contains_node(idx)).then_some(idx)
    }

    pub(crate) fn id_of(&self, idx: NodeIndex) -> NodeId {
        let i = idx.index();
        NodeId::new(i as u32, self.generations.get(i).copied().unwrap_or(0))
    }

    fn insert_node(&mut self, cluster: ClusterId, kind: NodeKind) -> NodeId {
        let trace = Trace::new(IntegrationProfile::TRANSIENT, self.config.trace_retention);
        let queue = &mut self.clusters[cluster.0 as usize].queue;
        // Never-activated nodes are the oldest.
        let link = queue.push_back(NodeId::new(u32::MAX, 0));
        let idx = self.graph.add_node(Node::new(kind, cluster, link, trace));

        let i = idx.index();
        if i >= self.generations.len() {
            self.generations.resize(i + 1, 0);
        }
        let id = NodeId::new(i as u32, self.generations[i]);
        if let Some(slot) = self.clusters[cluster.0 as usize].queue.get_mut(link) {
            *slot = id;
        }
        trace!(node = %id, cluster = %cluster, ?kind, "node created");
        id
    }

    // ── Retention ────────────────────────────────────────────────────

    /// Add an external retainer.
    pub fn retain(&mut self, id: NodeId) -> Result<()> {
        let idx = self.index(id)?;
        self.graph[idx].retainers += 1;
        Ok(())
    }

    /// Drop an external retainer. Once a node has none and no incoming
    /// edges, the next `clean()` reclaims it.
    pub fn release(&mut self, id: NodeId) -> Result<()> {
        let idx = self.index(id)?;
        let node = &mut self.graph[idx];
        node.retainers = node.retainers.saturating_sub(1);
        Ok(())
    }

    /// Remove dead edges, then sweep every cluster from the tail reclaiming
    /// unretained nodes. Returns the number of nodes reclaimed.
    pub fn clean(&mut self) -> usize {
        let dead: Vec<EdgeIndex> = self
            .graph
            .edge_indices()
            .filter(|&e| self.graph[e].distribution.is_dead())
            .collect();
        if !dead.is_empty() {
            debug!(edges = dead.len(), "pruning dead edges");
        }
        for e in dead {
            self.remove_edge(e);
        }

        let mut reclaimed = 0;
        for c in 0..self.clusters.len() {
            let graph = &self.graph;
            let generations = &self.generations;
            let doomed = self.clusters[c]
                .queue
                .sweep(|id| Self::reclaimable(graph, generations, *id));
            for id in doomed {
                if let Some(idx) = self.resolve(id) {
                    self.remove_node(idx);
                    reclaimed += 1;
                }
            }
        }
        if reclaimed > 0 {
            debug!(reclaimed, "reclaimed unretained nodes");
        }
        reclaimed
    }

    fn reclaimable(graph: &Graph, generations: &[u32], id: NodeId) -> bool {
        if generations.get(id.index as usize) != Some(&id.generation) {
            return true;
        }
        let idx = NodeIndex::new(id.index as usize);
        match graph.node_weight(idx) {
            None => true,
            Some(node) => {
                node.retainers == 0
                    && graph
                        .edges_directed(idx, Direction::Incoming)
                        .next()
                        .is_none()
            }
        }
    }

    /// Remove a node and all of its edges. The caller has already taken it
    /// out of its cluster's queue.
    fn remove_node(&mut self, idx: NodeIndex) {
        let edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        for e in edges {
            self.remove_edge(e);
        }
        let id = self.id_of(idx);
        self.graph.remove_node(idx);
        if let Some(generation) = self.generations.get_mut(idx.index()) {
            *generation = generation.wrapping_add(1);
        }
        trace!(node = %id, "node reclaimed");
    }

    pub(crate) fn remove_edge(&mut self, e: EdgeIndex) {
        if let Some((source, _)) = self.graph.edge_endpoints(e) {
            if let Some(prior) = self.graph[source].prior.as_mut() {
                prior.posteriors.retain(|&x| x != e);
            }
        }
        self.graph.remove_edge(e);
    }

    // ── Driving ──────────────────────────────────────────────────────

    /// Fire a node now.
    pub fn activate(&mut self, id: NodeId) -> Result<()> {
        let idx = self.index(id)?;
        let now = self.now();

        let node = &mut self.graph[idx];
        node.trace.record(now);
        node.last_activation = Some(now);
        let (cluster, link) = (node.cluster, node.link);
        debug!(node = %id, cluster = %cluster, at = now, "node fired");

        let activation = Activation {
            node: id,
            cluster,
            at: now,
        };
        let c = &mut self.clusters[cluster.0 as usize];
        c.queue.promote(link);
        c.notify(&activation);

        self.propagate(idx, now)?;
        self.run_action(id);
        Ok(())
    }

    /// Fire a node `delay` ticks from now.
    pub fn schedule_activation(&mut self, id: NodeId, delay: Duration) -> Result<()> {
        self.index(id)?;
        self.scheduler.schedule(delay, Task::Activate(id))
    }

    /// Run `task` `delay` ticks from now.
    pub fn schedule<F>(&mut self, delay: Duration, task: F) -> Result<()>
    where
        F: FnOnce(&mut Network) -> Result<()> + 'static,
    {
        self.scheduler.schedule(delay, Task::Call(Box::new(task)))
    }

    /// Run `task` at tick `at`, which may not be in the past.
    pub fn schedule_at<F>(&mut self, at: Tick, task: F) -> Result<()>
    where
        F: FnOnce(&mut Network) -> Result<()> + 'static,
    {
        self.scheduler.schedule_at(at, Task::Call(Box::new(task)))
    }

    /// Run every pending task, in order, until none remain.
    pub fn fast_forward_until_idle(&mut self) -> Result<()> {
        while let Some(task) = self.scheduler.pop() {
            self.dispatch(task)?;
        }
        Ok(())
    }

    /// Run every task due within `span` ticks, then rest the clock at `now + span`.
    pub fn run_for(&mut self, span: Duration) -> Result<()> {
        let now = self.now();
        if span < 0 {
            return Err(XngError::invalid_time(now + span, now));
        }
        let until = now.saturating_add(span);
        while let Some(task) = self.scheduler.pop_until(until) {
            self.dispatch(task)?;
        }
        self.scheduler.advance_to(until)
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Number of tasks waiting in the scheduler.
    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    fn dispatch(&mut self, task: Task) -> Result<()> {
        trace!(at = self.now(), task = task.describe(), "dispatch");
        match task {
            Task::Activate(id) => {
                if self.resolve(id).is_none() {
                    warn!(node = %id, "scheduled activation reached a reclaimed node");
                    return Ok(());
                }
                self.activate(id)
            }
            Task::Contribute { posterior, impulse } => self.contribute(posterior, impulse),
            Task::Threshold { node, token } => self.on_threshold(node, token),
            Task::Call(task) => task(self),
        }
    }

    fn propagate(&mut self, idx: NodeIndex, now: Tick) -> Result<()> {
        let edges = match &self.graph[idx].prior {
            Some(prior) => prior.posteriors.clone(),
            None => return Ok(()),
        };

        for e in edges {
            let Some((_, target)) = self.graph.edge_endpoints(e) else {
                continue;
            };
            let profile = self.graph[e].profile;
            let posterior = &self.graph[target];
            let plasticity = self.clusters[posterior.cluster.0 as usize]
                .plasticity()
                .unwrap_or(0.0);
            // Reverse STDP: a posterior that fired just before its prior is depressed.
            let delta = -posterior.trace.evaluate(now, &profile) * plasticity;

            let distribution = &mut self.graph[e].distribution;
            distribution.reinforce(delta);
            let weight = distribution.weight();
            if distribution.is_dead() {
                debug!(edge = e.index(), "edge weight collapsed, removing");
                self.remove_edge(e);
                continue;
            }

            let posterior = self.id_of(target);
            let impulse = Impulse::new(now, weight, profile);
            self.scheduler
                .schedule(profile.delay(), Task::Contribute { posterior, impulse })?;
        }
        Ok(())
    }

    fn contribute(&mut self, posterior: NodeId, impulse: Impulse) -> Result<()> {
        let Some(idx) = self.resolve(posterior) else {
            warn!(node = %posterior, "contribution reached a reclaimed node");
            return Ok(());
        };
        let now = self.now();
        let Some(state) = self.graph[idx].posterior.as_mut() else {
            return Ok(());
        };
        let update = state.integrator.add(now, impulse);
        trace!(node = %posterior, at = now, magnitude = impulse.magnitude, "contribution");
        self.apply(posterior, update)
    }

    fn on_threshold(&mut self, node: NodeId, token: u64) -> Result<()> {
        let Some(idx) = self.resolve(node) else {
            warn!(node = %node, "threshold task reached a reclaimed node");
            return Ok(());
        };
        let now = self.now();
        let fired = self.graph[idx]
            .posterior
            .as_mut()
            .is_some_and(|s| s.integrator.fire(now, token));
        if !fired {
            trace!(node = %node, token, "stale threshold task");
            return Ok(());
        }

        self.activate(node)?;

        let Some(idx) = self.resolve(node) else {
            return Ok(());
        };
        let update = match self.graph[idx].posterior.as_mut() {
            Some(state) => state.integrator.reschedule(now),
            None => return Ok(()),
        };
        self.apply(node, update)
    }

    fn apply(&mut self, node: NodeId, update: Reschedule) -> Result<()> {
        if let Reschedule::Schedule { at, token } = update {
            trace!(node = %node, at, token, "threshold crossing scheduled");
            self.scheduler
                .schedule_at(at, Task::Threshold { node, token })?;
        }
        Ok(())
    }

    fn run_action(&mut self, id: NodeId) {
        let Some(idx) = self.resolve(id) else { return };
        let Some(mut effect) = self.graph[idx].action.take() else {
            return;
        };
        if let Err(err) = effect(self) {
            warn!(node = %id, error = %err, "action side effect failed");
        }
        // The effect may have installed a replacement while it ran.
        if let Some(idx) = self.resolve(id) {
            let node = &mut self.graph[idx];
            if node.action.is_none() {
                node.action = Some(effect);
            }
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
