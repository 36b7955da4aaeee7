//! Conjunction junction: sizes edges so a co-active set of priors fires a posterior.

use crate::network::Network;
use std::collections::HashMap;
use tracing::debug;
use xng_core::error::{Result, XngError};
use xng_core::profile::IntegrationProfile;
use xng_core::types::{weight_by_trace, NodeId, THRESHOLD, THRESHOLD_MARGIN};

/// Insertion-ordered accumulator of `(prior, profile) → trace`.
#[derive(Debug, Clone, Default)]
pub struct ConjunctionJunction {
    entries: Vec<(NodeId, IntegrationProfile, f32)>,
    index: HashMap<(NodeId, IntegrationProfile), usize>,
}

impl ConjunctionJunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `trace` into the slot for `(node, profile)`.
    pub fn add(&mut self, node: NodeId, profile: IntegrationProfile, trace: f32) {
        match self.index.get(&(node, profile)) {
            Some(&i) => self.entries[i].2 += trace,
            None => {
                self.index.insert((node, profile), self.entries.len());
                self.entries.push((node, profile, trace));
            }
        }
    }

    pub fn trace(&self, node: NodeId, profile: IntegrationProfile) -> Option<f32> {
        self.index.get(&(node, profile)).map(|&i| self.entries[i].2)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with a positive accumulated trace.
    pub fn active(&self) -> impl Iterator<Item = (NodeId, IntegrationProfile, f32)> + '_ {
        self.entries.iter().copied().filter(|e| e.2 > 0.0)
    }

    /// Per-edge coefficient `build` aims for, or `None` with no active entries.
    pub fn coefficient(&self, weight: f32) -> Option<f32> {
        let n = self.active().count();
        (n > 0).then(|| weight * (THRESHOLD + THRESHOLD_MARGIN) / n as f32)
    }

    /// Move every active entry's edge toward the conjunction coefficient,
    /// scaled by how hot the entry's trace is. Reinforcement is used rather
    /// than `set`, so existing evidence on the edges is kept.
    ///
    /// The safe-conjunction bound is only re-checked when the network is
    /// configured with `strict_conjunction`.
    pub fn build(&self, net: &mut Network, posterior: NodeId, weight: f32) -> Result<NodeId> {
        let active: Vec<_> = self.active().collect();
        let Some(target) = self.coefficient(weight) else {
            return Ok(posterior);
        };
        let n = active.len();
        if net.config().strict_conjunction && target * (n - 1) as f32 >= THRESHOLD {
            return Err(XngError::TooManyPriors {
                count: n,
                coefficient: target,
            });
        }

        net.check_posterior(posterior)?;
        for &(node, _, _) in &active {
            net.check_prior(node)?;
        }

        for (node, profile, trace) in active {
            let e = net.ensure_edge(node, posterior, profile)?;
            let distribution = &mut net.graph[e].distribution;
            let current = distribution.weight();
            distribution.reinforce(weight_by_trace(target, current, trace) - current);
        }
        debug!(%posterior, priors = n, target, "conjunction built");
        Ok(posterior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use xng_core::types::ClusterKind;

    #[test]
    fn accumulates_per_slot() {
        let mut j = ConjunctionJunction::new();
        let a = NodeId::new(0, 0);
        j.add(a, IntegrationProfile::TRANSIENT, 0.25);
        j.add(a, IntegrationProfile::TRANSIENT, 0.5);
        j.add(a, IntegrationProfile::TWOGRAM, 0.0);
        assert_eq!(j.len(), 2);
        assert_eq!(j.trace(a, IntegrationProfile::TRANSIENT), Some(0.75));
        assert_eq!(j.active().count(), 1);
    }

    #[test]
    fn build_splits_weight_over_active_priors() {
        let mut net = Network::new();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let (a, b, q) = (
            net.add_node(c).unwrap(),
            net.add_node(c).unwrap(),
            net.add_node(c).unwrap(),
        );

        let mut j = ConjunctionJunction::new();
        j.add(a, IntegrationProfile::TRANSIENT, 1.0);
        j.add(b, IntegrationProfile::TRANSIENT, 1.0);
        j.build(&mut net, q, 1.0).unwrap();

        assert!((net.weight(a, q).unwrap() - 0.6).abs() < 1e-6);
        assert!((net.weight(b, q).unwrap() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn partial_trace_moves_partway() {
        let mut net = Network::new();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let (a, q) = (net.add_node(c).unwrap(), net.add_node(c).unwrap());

        let mut j = ConjunctionJunction::new();
        j.add(a, IntegrationProfile::TRANSIENT, 0.5);
        j.build(&mut net, q, 1.0).unwrap();
        // 1.2 * min(1, 0.5 * 1.2)
        assert!((net.weight(a, q).unwrap() - 0.72).abs() < 1e-6);
    }

    #[test]
    fn empty_junction_is_a_no_op() {
        let mut net = Network::new();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let (a, q) = (net.add_node(c).unwrap(), net.add_node(c).unwrap());
        let mut j = ConjunctionJunction::new();
        j.add(a, IntegrationProfile::TRANSIENT, 0.0);
        assert_eq!(j.build(&mut net, q, 1.0), Ok(q));
        assert_eq!(net.edge_count(), 0);
    }

    #[test]
    fn strict_mode_checks_the_bound() {
        let config = NetworkConfig {
            strict_conjunction: true,
            ..Default::default()
        };
        let mut net = Network::from_config(config).unwrap();
        let c = net.add_cluster(ClusterKind::Bi, "bi");
        let q = net.add_node(c).unwrap();
        let mut j = ConjunctionJunction::new();
        for _ in 0..6 {
            j.add(net.add_node(c).unwrap(), IntegrationProfile::TRANSIENT, 1.0);
        }
        assert!(matches!(
            j.build(&mut net, q, 1.0),
            Err(XngError::TooManyPriors { count: 6, .. })
        ));
        assert_eq!(net.edge_count(), 0);

        let mut lax = Network::new();
        let c = lax.add_cluster(ClusterKind::Bi, "bi");
        let q = lax.add_node(c).unwrap();
        let mut j = ConjunctionJunction::new();
        for _ in 0..6 {
            j.add(lax.add_node(c).unwrap(), IntegrationProfile::TRANSIENT, 1.0);
        }
        assert!(j.build(&mut lax, q, 1.0).is_ok());
        assert_eq!(lax.edge_count(), 6);
    }
}
