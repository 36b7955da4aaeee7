//! Bulk association: trace-weighted weight rewrites across whole clusters.
//!
//! Every operator here walks a cluster's recency queue from the front and
//! stops at the first node too old to have a trace, so the cost scales with
//! recent activity rather than cluster size.
//!
//! - `associate`: pure LTP, wiring recently active priors into conjunctions
//!   for each recently active posterior
//! - `disassociate`: undo that wiring between two clusters, by trace
//! - `disassociate_all`: pull every outgoing edge of active priors toward zero
//! - `scale_posteriors`: scale every outgoing edge of active priors

use crate::junction::ConjunctionJunction;
use crate::network::Network;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;
use xng_core::distribution::Distribution;
use xng_core::error::{Result, XngError};
use xng_core::profile::IntegrationProfile;
use xng_core::types::{weight_by_trace, ClusterId, NodeId, Tick};

/// A prior cluster together with the profiles its traces are read under.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorClusterProfile {
    pub cluster: ClusterId,
    pub profiles: Vec<IntegrationProfile>,
}

impl PriorClusterProfile {
    pub fn new(cluster: ClusterId, profiles: impl IntoIterator<Item = IntegrationProfile>) -> Self {
        Self {
            cluster,
            profiles: profiles.into_iter().collect(),
        }
    }

    /// The cluster read under TRANSIENT only.
    pub fn transient(cluster: ClusterId) -> Self {
        Self::new(cluster, [IntegrationProfile::TRANSIENT])
    }

    pub fn list() -> PriorClusterProfileList {
        PriorClusterProfileList::default()
    }
}

/// Builder for a list of [`PriorClusterProfile`]s sharing base profiles.
///
/// ```rust
/// use xng_core::prelude::*;
/// use xng_runtime::association::PriorClusterProfile;
///
/// let priors = PriorClusterProfile::list()
///     .add(ClusterId(0), &[IntegrationProfile::TWOGRAM])
///     .add(ClusterId(1), &[])
///     .build();
/// assert_eq!(priors[0].profiles.len(), 2);
/// assert_eq!(priors[1].profiles, vec![IntegrationProfile::TRANSIENT]);
/// ```
#[derive(Debug, Clone)]
pub struct PriorClusterProfileList {
    backing: Vec<PriorClusterProfile>,
    base: Vec<IntegrationProfile>,
}

impl Default for PriorClusterProfileList {
    fn default() -> Self {
        Self {
            backing: Vec::new(),
            base: vec![IntegrationProfile::TRANSIENT],
        }
    }
}

impl PriorClusterProfileList {
    /// Replace the profiles every subsequently added cluster starts with.
    pub fn base_profiles(mut self, profiles: &[IntegrationProfile]) -> Self {
        self.base = profiles.to_vec();
        self
    }

    /// Add a cluster read under the base profiles plus `additional`.
    pub fn add(mut self, cluster: ClusterId, additional: &[IntegrationProfile]) -> Self {
        let profiles = self.base.iter().chain(additional).copied();
        self.backing.push(PriorClusterProfile::new(cluster, profiles));
        self
    }

    pub fn build(self) -> Vec<PriorClusterProfile> {
        self.backing
    }
}

impl Network {
    /// Recently active nodes of `cluster` with a positive trace under
    /// `profile` at `t`, newest first.
    ///
    /// The walk stops at the first node whose last activation is at or
    /// before `t − period`; nodes that never fired end the walk too.
    pub fn active_by_trace(
        &self,
        cluster: ClusterId,
        profile: IntegrationProfile,
        t: Tick,
    ) -> Result<Vec<(NodeId, f32)>> {
        let horizon = t - profile.period();
        let mut active = Vec::new();
        for id in self.cluster(cluster)?.activations() {
            let Some(idx) = self.resolve(id) else {
                continue;
            };
            let node = &self.graph[idx];
            match node.last_activation {
                Some(at) if at > horizon => {}
                _ => break,
            }
            let trace = node.trace.evaluate(t, &profile);
            if trace > 0.0 {
                active.push((id, trace));
            }
        }
        Ok(active)
    }

    /// Visit each node [`active_by_trace`](Self::active_by_trace) yields.
    pub fn for_each_by_trace<F>(
        &self,
        cluster: ClusterId,
        profile: IntegrationProfile,
        t: Tick,
        mut f: F,
    ) -> Result<()>
    where
        F: FnMut(NodeId, f32),
    {
        for (id, trace) in self.active_by_trace(cluster, profile, t)? {
            f(id, trace);
        }
        Ok(())
    }

    /// Wire every prior active at `t` into a conjunction onto `posterior`
    /// with overall strength `weight`.
    pub fn associate_node(
        &mut self,
        priors: &[PriorClusterProfile],
        posterior: NodeId,
        t: Tick,
        weight: f32,
    ) -> Result<()> {
        let mut junction = ConjunctionJunction::new();
        for prior in priors {
            for &profile in &prior.profiles {
                for (node, trace) in self.active_by_trace(prior.cluster, profile, t)? {
                    junction.add(node, profile, trace);
                }
            }
        }
        junction.build(self, posterior, weight)?;
        Ok(())
    }

    /// For each posterior active under TRANSIENT at `t`, associate the priors
    /// active at that posterior's last activation, weighted by its trace.
    pub fn associate_at(
        &mut self,
        priors: &[PriorClusterProfile],
        posterior_cluster: ClusterId,
        t: Tick,
    ) -> Result<()> {
        self.expect_posterior_cluster(posterior_cluster)?;
        let posteriors = self.active_by_trace(posterior_cluster, IntegrationProfile::TRANSIENT, t)?;
        debug!(cluster = %posterior_cluster, posteriors = posteriors.len(), at = t, "associate");
        for (posterior, trace) in posteriors {
            let Some(at) = self.node(posterior)?.last_activation() else {
                continue;
            };
            self.associate_node(priors, posterior, at, trace)?;
        }
        Ok(())
    }

    /// [`associate_at`](Self::associate_at) the current tick.
    pub fn associate(
        &mut self,
        priors: &[PriorClusterProfile],
        posterior_cluster: ClusterId,
    ) -> Result<()> {
        self.associate_at(priors, posterior_cluster, self.now())
    }

    /// Associate a single prior cluster read under TRANSIENT.
    pub fn associate_clusters(
        &mut self,
        prior_cluster: ClusterId,
        posterior_cluster: ClusterId,
    ) -> Result<()> {
        self.associate(&[PriorClusterProfile::transient(prior_cluster)], posterior_cluster)
    }

    /// Break associations from `prior_cluster` into the posteriors of
    /// `posterior_cluster` that are active now, by the product of the traces.
    pub fn disassociate(
        &mut self,
        prior_cluster: ClusterId,
        posterior_cluster: ClusterId,
    ) -> Result<()> {
        self.cluster(prior_cluster)?;
        self.expect_posterior_cluster(posterior_cluster)?;
        let now = self.now();

        let mut touched = 0;
        for (posterior, posterior_trace) in
            self.active_by_trace(posterior_cluster, IntegrationProfile::TRANSIENT, now)?
        {
            let idx = self.index(posterior)?;
            let Some(at) = self.graph[idx].last_activation else {
                continue;
            };
            let incoming: Vec<(EdgeIndex, NodeIndex)> = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .map(|e| (e.id(), e.source()))
                .collect();

            for (e, source) in incoming {
                let prior = &self.graph[source];
                if prior.cluster != prior_cluster {
                    continue;
                }
                let prior_trace = prior.trace.evaluate(at, &self.graph[e].profile);
                if prior_trace > 0.0 {
                    let distribution = &mut self.graph[e].distribution;
                    let w = distribution.weight();
                    distribution.reinforce(weight_by_trace(-w, 0.0, prior_trace * posterior_trace));
                    touched += 1;
                }
            }
        }
        debug!(prior = %prior_cluster, posterior = %posterior_cluster, edges = touched, "disassociate");
        Ok(())
    }

    /// Pull every outgoing edge of the priors active now toward zero, by trace.
    pub fn disassociate_all(&mut self, prior_cluster: ClusterId) -> Result<()> {
        let touched = self.rewrite_outgoing(prior_cluster, |distribution, trace| {
            let w = distribution.weight();
            distribution.reinforce(weight_by_trace(-w, 0.0, trace));
        })?;
        debug!(prior = %prior_cluster, edges = touched, "disassociate all");
        Ok(())
    }

    /// Scale every outgoing edge of the priors active now by `factor`,
    /// interpolated toward 1 for cooler traces.
    pub fn scale_posteriors(&mut self, prior_cluster: ClusterId, factor: f32) -> Result<()> {
        let touched = self.rewrite_outgoing(prior_cluster, |distribution, trace| {
            distribution.scale(weight_by_trace(factor, 1.0, trace));
        })?;
        debug!(prior = %prior_cluster, factor, edges = touched, "scale posteriors");
        Ok(())
    }

    fn rewrite_outgoing<F>(&mut self, prior_cluster: ClusterId, mut rewrite: F) -> Result<usize>
    where
        F: FnMut(&mut Distribution, f32),
    {
        let now = self.now();
        let mut touched = 0;
        for (prior, trace) in
            self.active_by_trace(prior_cluster, IntegrationProfile::TRANSIENT, now)?
        {
            let idx = self.index(prior)?;
            let edges = match &self.graph[idx].prior {
                Some(state) => state.posteriors.clone(),
                None => continue,
            };
            for e in edges {
                if let Some(edge) = self.graph.edge_weight_mut(e) {
                    rewrite(&mut edge.distribution, trace);
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    fn expect_posterior_cluster(&self, cluster: ClusterId) -> Result<()> {
        let kind = self.cluster(cluster)?.kind();
        if !kind.is_posterior() {
            return Err(XngError::NotAPosteriorCluster { cluster, kind });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xng_core::types::{ClusterKind, DEFAULT_COEFFICIENT};

    #[test]
    fn list_builder_applies_base_profiles() {
        let priors = PriorClusterProfile::list()
            .base_profiles(&[IntegrationProfile::TWOGRAM])
            .add(ClusterId(3), &[IntegrationProfile::TRANSIENT])
            .build();
        assert_eq!(
            priors,
            vec![PriorClusterProfile::new(
                ClusterId(3),
                [IntegrationProfile::TWOGRAM, IntegrationProfile::TRANSIENT]
            )]
        );
    }

    #[test]
    fn active_by_trace_stops_at_the_horizon() {
        let mut net = Network::new();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let (old, mid, new, idle) = (
            net.add_node(c).unwrap(),
            net.add_node(c).unwrap(),
            net.add_node(c).unwrap(),
            net.add_node(c).unwrap(),
        );
        net.activate(old).unwrap();
        net.run_for(30).unwrap();
        net.activate(mid).unwrap();
        net.run_for(15).unwrap();
        net.activate(new).unwrap();
        net.run_for(5).unwrap();

        // t = 50, horizon = 10: `old` fired at 0 and ends the walk
        let active = net
            .active_by_trace(c, IntegrationProfile::TRANSIENT, 50)
            .unwrap();
        assert_eq!(active, vec![(new, 0.5), (mid, 1.0)]);
        assert!(!active.iter().any(|(n, _)| *n == idle));

        let mut seen = Vec::new();
        net.for_each_by_trace(c, IntegrationProfile::TRANSIENT, 50, |n, _| seen.push(n))
            .unwrap();
        assert_eq!(seen, vec![new, mid]);
    }

    #[test]
    fn associate_requires_posterior_cluster() {
        let mut net = Network::new();
        let input = net.add_cluster(ClusterKind::Input, "in");
        let bi = net.add_cluster(ClusterKind::Bi, "bi");
        assert!(matches!(
            net.associate_clusters(bi, input),
            Err(XngError::NotAPosteriorCluster { .. })
        ));
    }

    #[test]
    fn associate_wires_co_active_priors() {
        let mut net = Network::new();
        let a_cluster = net.add_cluster(ClusterKind::Input, "a");
        let b_cluster = net.add_cluster(ClusterKind::Bi, "b");
        let a1 = net.add_node(a_cluster).unwrap();
        let a2 = net.add_node(a_cluster).unwrap();
        let b = net.add_node(b_cluster).unwrap();

        net.activate(a1).unwrap();
        net.activate(a2).unwrap();
        net.run_for(10).unwrap();
        net.activate(b).unwrap();
        net.run_for(10).unwrap();

        net.associate_clusters(a_cluster, b_cluster).unwrap();
        assert!((net.weight(a1, b).unwrap() - 0.6).abs() < 1e-6);
        assert!((net.weight(a2, b).unwrap() - 0.6).abs() < 1e-6);

        // Together they fire b again; alone they do not.
        net.run_for(200).unwrap();
        net.activate(a1).unwrap();
        net.run_for(100).unwrap();
        assert_eq!(net.node(b).unwrap().last_activation(), Some(10));
        net.activate(a1).unwrap();
        net.activate(a2).unwrap();
        net.fast_forward_until_idle().unwrap();
        assert_eq!(net.node(b).unwrap().last_activation(), Some(330));
    }

    #[test]
    fn scale_posteriors_by_trace() {
        let mut net = Network::new();
        let priors = net.add_cluster(ClusterKind::Bi, "priors");
        let posteriors = net.add_cluster(ClusterKind::Bi, "posteriors");
        let (hot, cold) = (net.add_node(priors).unwrap(), net.add_node(priors).unwrap());
        let q = net.add_node(posteriors).unwrap();
        net.then(hot, q).unwrap();
        net.then(cold, q).unwrap();

        net.activate(hot).unwrap();
        net.run_for(20).unwrap();
        net.scale_posteriors(priors, 0.5).unwrap();

        assert!((net.weight(hot, q).unwrap() - 0.6).abs() < 1e-6);
        assert_eq!(net.weight(cold, q), Some(DEFAULT_COEFFICIENT));
    }

    #[test]
    fn disassociate_all_clears_outgoing_edges() {
        let mut net = Network::new();
        let priors = net.add_cluster(ClusterKind::Bi, "priors");
        let posteriors = net.add_cluster(ClusterKind::Bi, "posteriors");
        let p = net.add_node(priors).unwrap();
        let q = net.add_node(posteriors).unwrap();
        net.then(p, q).unwrap();

        net.activate(p).unwrap();
        net.run_for(20).unwrap();
        net.disassociate_all(priors).unwrap();
        assert_eq!(net.weight(p, q), Some(0.0));

        net.clean();
        assert_eq!(net.weight(p, q), None);
    }
}
