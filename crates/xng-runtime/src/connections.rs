//! Connections: creating and presetting prior → posterior edges.
//!
//! There is at most one edge per `(prior, posterior, profile)`. The presets
//! mirror the boolean shapes a posterior can take:
//!
//! - `then` / `disjunction`: any one prior fires the posterior
//! - `conjunction`: all `n` priors are needed, `n − 1` are not enough
//! - `inhibit` / `inhibitor`: the prior cancels one full-strength edge

use crate::network::Network;
use crate::node::Edge;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use tracing::trace;
use xng_core::distribution::Distribution;
use xng_core::error::{Result, XngError};
use xng_core::profile::IntegrationProfile;
use xng_core::types::{NodeId, DEFAULT_COEFFICIENT, THRESHOLD, THRESHOLD_MARGIN};

/// Coefficient of an inhibitory edge.
pub const INHIBITION: f32 = -1.0;

impl Network {
    /// Wire `prior → posterior` at [`DEFAULT_COEFFICIENT`] under TRANSIENT.
    /// Idempotent. Returns `posterior` so chains can be built.
    pub fn then(&mut self, prior: NodeId, posterior: NodeId) -> Result<NodeId> {
        self.set_coefficient(prior, posterior, DEFAULT_COEFFICIENT)?;
        Ok(posterior)
    }

    /// `then` from one prior to several posteriors.
    pub fn then_all(&mut self, prior: NodeId, posteriors: &[NodeId]) -> Result<()> {
        self.check_prior(prior)?;
        for &posterior in posteriors {
            self.check_posterior(posterior)?;
        }
        for &posterior in posteriors {
            self.then(prior, posterior)?;
        }
        Ok(())
    }

    /// Make `prior` suppress `posterior`.
    pub fn inhibit(&mut self, prior: NodeId, posterior: NodeId) -> Result<()> {
        self.set_coefficient(prior, posterior, INHIBITION)
    }

    /// Make `posterior` suppressed by `prior`. Returns `posterior`.
    pub fn inhibitor(&mut self, posterior: NodeId, prior: NodeId) -> Result<NodeId> {
        self.inhibit(prior, posterior)?;
        Ok(posterior)
    }

    /// Wire `priors` so that `posterior` fires only when all of them fire
    /// within a TRANSIENT window.
    pub fn conjunction(&mut self, posterior: NodeId, priors: &[NodeId]) -> Result<NodeId> {
        let n = priors.len();
        let coefficient = (THRESHOLD + THRESHOLD_MARGIN) / n as f32;
        if n > 0 && coefficient * (n - 1) as f32 >= THRESHOLD {
            return Err(XngError::TooManyPriors {
                count: n,
                coefficient,
            });
        }
        self.check_posterior(posterior)?;
        for &prior in priors {
            self.check_prior(prior)?;
        }
        for &prior in priors {
            self.set_coefficient(prior, posterior, coefficient)?;
        }
        Ok(posterior)
    }

    /// Wire `priors` so that any one of them fires `posterior`.
    pub fn disjunction(&mut self, posterior: NodeId, priors: &[NodeId]) -> Result<NodeId> {
        self.check_posterior(posterior)?;
        for &prior in priors {
            self.check_prior(prior)?;
        }
        for &prior in priors {
            self.then(prior, posterior)?;
        }
        Ok(posterior)
    }

    /// Overwrite the TRANSIENT edge weight, resetting its reinforcement history.
    pub fn set_coefficient(
        &mut self,
        prior: NodeId,
        posterior: NodeId,
        coefficient: f32,
    ) -> Result<()> {
        let e = self.ensure_edge(prior, posterior, IntegrationProfile::TRANSIENT)?;
        self.graph[e].distribution.set(coefficient);
        Ok(())
    }

    /// Reinforce an edge, creating it at weight zero if absent. Returns the new weight.
    pub fn reinforce_edge(
        &mut self,
        prior: NodeId,
        posterior: NodeId,
        profile: IntegrationProfile,
        delta: f32,
    ) -> Result<f32> {
        let e = self.ensure_edge(prior, posterior, profile)?;
        let distribution = &mut self.graph[e].distribution;
        distribution.reinforce(delta);
        trace!(%prior, %posterior, delta, weight = distribution.weight(), "edge reinforced");
        Ok(distribution.weight())
    }

    /// The edge `prior → posterior` under `profile`, if any.
    pub fn edge(
        &self,
        prior: NodeId,
        posterior: NodeId,
        profile: IntegrationProfile,
    ) -> Option<&Edge> {
        let a = self.resolve(prior)?;
        let b = self.resolve(posterior)?;
        self.find_edge(a, b, profile).map(|e| &self.graph[e])
    }

    /// Weight of the TRANSIENT edge `prior → posterior`, if any.
    pub fn weight(&self, prior: NodeId, posterior: NodeId) -> Option<f32> {
        self.edge(prior, posterior, IntegrationProfile::TRANSIENT)
            .map(Edge::weight)
    }

    /// Outgoing edges of `prior`, in insertion order.
    pub fn posteriors(&self, prior: NodeId) -> Result<Vec<(NodeId, &Edge)>> {
        let idx = self.index(prior)?;
        let Some(state) = self.graph[idx].prior.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(state
            .posteriors
            .iter()
            .filter_map(|&e| {
                let (_, target) = self.graph.edge_endpoints(e)?;
                Some((self.id_of(target), &self.graph[e]))
            })
            .collect())
    }

    /// Find or create the edge `prior → posterior` under `profile`.
    pub(crate) fn ensure_edge(
        &mut self,
        prior: NodeId,
        posterior: NodeId,
        profile: IntegrationProfile,
    ) -> Result<EdgeIndex> {
        let a = self.check_prior(prior)?;
        let b = self.check_posterior(posterior)?;
        if let Some(e) = self.find_edge(a, b, profile) {
            return Ok(e);
        }

        let distribution = Distribution::with_alpha(0.0, self.config().smoothing_alpha);
        let e = self.graph.add_edge(a, b, Edge::new(profile, distribution));
        if let Some(state) = self.graph[a].prior.as_mut() {
            state.posteriors.push(e);
        }
        trace!(%prior, %posterior, ?profile, "edge created");
        Ok(e)
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex, profile: IntegrationProfile) -> Option<EdgeIndex> {
        let state = self.graph[a].prior.as_ref()?;
        state.posteriors.iter().copied().find(|&e| {
            self.graph.edge_endpoints(e).map(|(_, t)| t) == Some(b) && self.graph[e].profile == profile
        })
    }

    pub(crate) fn check_prior(&self, id: NodeId) -> Result<NodeIndex> {
        let idx = self.index(id)?;
        if self.graph[idx].prior.is_none() {
            return Err(XngError::NotAPrior(id));
        }
        Ok(idx)
    }

    pub(crate) fn check_posterior(&self, id: NodeId) -> Result<NodeIndex> {
        let idx = self.index(id)?;
        if self.graph[idx].posterior.is_none() {
            return Err(XngError::NotAPosterior(id));
        }
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xng_core::types::ClusterKind;

    fn setup() -> (Network, NodeId, NodeId) {
        let mut net = Network::new();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let a = net.add_node(c).unwrap();
        let b = net.add_node(c).unwrap();
        (net, a, b)
    }

    #[test]
    fn then_is_idempotent() {
        let (mut net, a, b) = setup();
        net.then(a, b).unwrap();
        net.reinforce_edge(a, b, IntegrationProfile::TRANSIENT, -0.3)
            .unwrap();
        net.then(a, b).unwrap();

        assert_eq!(net.edge_count(), 1);
        assert_eq!(net.weight(a, b), Some(DEFAULT_COEFFICIENT));
        assert_eq!(
            net.edge(a, b, IntegrationProfile::TRANSIENT)
                .unwrap()
                .distribution()
                .samples(),
            0
        );
    }

    #[test]
    fn profiles_key_distinct_edges() {
        let (mut net, a, b) = setup();
        net.then(a, b).unwrap();
        net.reinforce_edge(a, b, IntegrationProfile::TWOGRAM, 0.5)
            .unwrap();
        assert_eq!(net.edge_count(), 2);

        let posteriors = net.posteriors(a).unwrap();
        assert_eq!(posteriors.len(), 2);
        assert_eq!(posteriors[0].1.profile(), IntegrationProfile::TRANSIENT);
        assert_eq!(posteriors[1].1.weight(), 0.5);
    }

    #[test]
    fn conjunction_coefficients() {
        let mut net = Network::new();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let priors: Vec<_> = (0..3).map(|_| net.add_node(c).unwrap()).collect();
        let b = net.add_node(c).unwrap();

        net.conjunction(b, &priors).unwrap();
        for &p in &priors {
            assert!((net.weight(p, b).unwrap() - 0.4).abs() < 1e-6);
        }
    }

    #[test]
    fn conjunction_rejects_unsafe_fan_in() {
        let mut net = Network::new();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let priors: Vec<_> = (0..6).map(|_| net.add_node(c).unwrap()).collect();
        let b = net.add_node(c).unwrap();

        // 1.2 / 6 * 5 = 1.0, which would fire on five priors
        let err = net.conjunction(b, &priors).unwrap_err();
        assert!(matches!(err, XngError::TooManyPriors { count: 6, .. }));
        assert_eq!(net.edge_count(), 0);

        assert!(net.conjunction(b, &priors[..5]).is_ok());
    }

    #[test]
    fn capability_checks_leave_state_untouched() {
        let mut net = Network::new();
        let input = net.add_cluster(ClusterKind::Input, "in");
        let actions = net.add_cluster(ClusterKind::Action, "act");
        let i = net.add_node(input).unwrap();
        let act = net.add_action(actions, |_| Ok(())).unwrap();

        assert_eq!(net.then(act, i), Err(XngError::NotAPrior(act)));
        assert_eq!(net.then(i, i), Err(XngError::NotAPosterior(i)));
        assert_eq!(
            net.disjunction(act, &[i, act]),
            Err(XngError::NotAPrior(act))
        );
        assert_eq!(net.edge_count(), 0);
    }

    #[test]
    fn inhibitor_sets_negative_weight() {
        let (mut net, a, b) = setup();
        assert_eq!(net.inhibitor(b, a).unwrap(), b);
        assert_eq!(net.weight(a, b), Some(INHIBITION));
    }
}
