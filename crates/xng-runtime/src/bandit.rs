//! Bernoulli bandit probe.
//!
//! A minimal closed loop that checks the learning machinery end to end: a
//! `choose` input node fans out to one node per arm, arms that fire are
//! pulled, and each pull reinforces the `choose → arm` edge by its payoff.
//! When no arm fires, a random arm is activated to explore. Explicit wiring
//! can instead take a `miss_penalty` on every `choose → arm` edge.
//!
//! Two wirings are supported:
//! - explicit: every arm starts wired to `choose` at full strength
//! - Hebbian: no edges at first; they grow from reinforcement alone

use crate::network::Network;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};
use xng_core::error::{Result, XngError};
use xng_core::profile::IntegrationProfile;
use xng_core::types::{ClusterKind, Duration, NodeId};

/// Bandit probe parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BanditConfig {
    /// Number of arms, used when `probabilities` is not given.
    pub arms: usize,
    /// Payoff probability per arm. Drawn uniformly from the seed when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
    pub seed: u64,
    /// Start with no edges instead of wiring every arm.
    pub hebbian: bool,
    /// Scale applied to each payoff before it reinforces an edge.
    pub learning_rate: f32,
    /// Pull budget before the run is judged on efficacy alone.
    pub max_pulls: u32,
    /// Consecutive best-arm-only trials that count as convergence.
    pub convergence_streak: u32,
    /// Ticks between trials. Must cover a TRANSIENT support so trials stay independent.
    pub trial_spacing: Duration,
    /// Negative reinforcement applied to every `choose → arm` edge when no
    /// arm fires under explicit wiring, in place of exploring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miss_penalty: Option<f32>,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            arms: 4,
            probabilities: None,
            seed: 0,
            hebbian: false,
            learning_rate: 0.1,
            max_pulls: 10_000,
            convergence_streak: 100,
            trial_spacing: IntegrationProfile::TWOGRAM.support(),
            miss_penalty: None,
        }
    }
}

impl BanditConfig {
    pub fn validate(&self) -> Result<()> {
        let arms = self.probabilities.as_ref().map_or(self.arms, Vec::len);
        if arms == 0 {
            return Err(XngError::invalid_config("arms", arms, "need at least one arm"));
        }
        if let Some(p) = self
            .probabilities
            .iter()
            .flatten()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(XngError::invalid_config("probabilities", p, "must be in [0, 1]"));
        }
        if self.learning_rate <= 0.0 {
            return Err(XngError::invalid_config(
                "learning_rate",
                self.learning_rate,
                "must be positive",
            ));
        }
        if let Some(penalty) = self.miss_penalty {
            if !(penalty < 0.0 && penalty.is_finite()) {
                return Err(XngError::invalid_config(
                    "miss_penalty",
                    penalty,
                    "must be negative",
                ));
            }
        }
        if self.trial_spacing < IntegrationProfile::TRANSIENT.support() {
            return Err(XngError::invalid_config(
                "trial_spacing",
                self.trial_spacing,
                "must cover a TRANSIENT support",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Arm {
    node: NodeId,
    p: f64,
}

/// Result of a bandit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditOutcome {
    pub pulls: u32,
    pub reward: u32,
    /// Mean reward relative to always pulling the best arm.
    pub efficacy: f64,
    pub converged: bool,
    pub best_arm: usize,
    pub trials: u32,
    pub probabilities: Vec<f64>,
}

impl BanditOutcome {
    /// Converged, or made it through the pull budget with efficacy above 0.9.
    pub fn passed(&self) -> bool {
        self.converged || self.efficacy > 0.9
    }
}

/// Drives a network through bandit trials.
pub struct BanditHarness {
    net: Network,
    config: BanditConfig,
    rng: StdRng,
    choose: NodeId,
    arms: Vec<Arm>,
    fired: Rc<RefCell<Vec<NodeId>>>,
    pulls: u32,
    reward: u32,
}

impl BanditHarness {
    pub fn new(config: BanditConfig) -> Result<Self> {
        Self::with_network(Network::new(), config)
    }

    /// Build the probe inside an existing network.
    pub fn with_network(mut net: Network, config: BanditConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let probabilities = match &config.probabilities {
            Some(p) => p.clone(),
            None => (0..config.arms).map(|_| rng.gen::<f64>()).collect(),
        };

        let input = net.add_cluster(ClusterKind::Input, "bandit.choose");
        let arm_cluster = net.add_cluster(ClusterKind::Bi, "bandit.arms");
        let choose = net.add_node(input)?;
        net.set_label(choose, "choose")?;

        let mut arms = Vec::with_capacity(probabilities.len());
        for p in probabilities {
            let node = net.add_node(arm_cluster)?;
            net.set_label(node, format!("{p:.4}"))?;
            if !config.hebbian {
                net.then(choose, node)?;
            }
            arms.push(Arm { node, p });
        }

        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = fired.clone();
        net.observe(arm_cluster, move |activation| {
            sink.borrow_mut().push(activation.node)
        })?;

        debug!(
            arms = arms.len(),
            hebbian = config.hebbian,
            seed = config.seed,
            "bandit harness ready"
        );
        Ok(Self {
            net,
            config,
            rng,
            choose,
            arms,
            fired,
            pulls: 0,
            reward: 0,
        })
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn choose(&self) -> NodeId {
        self.choose
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.arms.iter().map(|a| a.p).collect()
    }

    /// Index of the arm with the highest payoff probability.
    pub fn best_arm(&self) -> usize {
        let mut best = 0;
        for (i, arm) in self.arms.iter().enumerate() {
            if arm.p > self.arms[best].p {
                best = i;
            }
        }
        best
    }

    pub fn pulls(&self) -> u32 {
        self.pulls
    }

    pub fn reward(&self) -> u32 {
        self.reward
    }

    /// Fire `choose` and pull every arm that fires in response. When none
    /// does, either penalize the explicit wiring or explore a random arm.
    /// Returns the pulled arm indices in firing order.
    pub fn run_trial(&mut self) -> Result<Vec<usize>> {
        self.fired.borrow_mut().clear();
        self.net.activate(self.choose)?;
        self.net.run_for(self.config.trial_spacing)?;

        if self.fired.borrow().is_empty() {
            match self.config.miss_penalty {
                Some(penalty) if !self.config.hebbian => self.penalize(penalty)?,
                _ => {
                    let arm = self.rng.gen_range(0..self.arms.len());
                    trace!(arm, "no arm fired, exploring");
                    self.net.activate(self.arms[arm].node)?;
                    self.net.run_for(self.config.trial_spacing)?;
                }
            }
        }

        let fired: Vec<NodeId> = self.fired.borrow_mut().drain(..).collect();
        let mut pulled = Vec::with_capacity(fired.len());
        for node in fired {
            let Some(arm) = self.arms.iter().position(|a| a.node == node) else {
                continue;
            };
            self.pull(arm)?;
            pulled.push(arm);
        }
        Ok(pulled)
    }

    fn pull(&mut self, arm: usize) -> Result<()> {
        self.pulls += 1;
        let reinforcement = if self.rng.gen::<f64>() < self.arms[arm].p {
            self.reward += 1;
            1.0
        } else {
            // Failures weigh in proportion to the running success ratio.
            self.reward as f32 / (self.reward as f32 - self.pulls as f32)
        };
        let weight = self.net.reinforce_edge(
            self.choose,
            self.arms[arm].node,
            IntegrationProfile::TRANSIENT,
            reinforcement * self.config.learning_rate,
        )?;
        trace!(arm, reinforcement, weight, "pull");
        Ok(())
    }

    fn penalize(&mut self, penalty: f32) -> Result<()> {
        trace!(penalty, "no arm fired, penalizing");
        for arm in &self.arms {
            self.net.reinforce_edge(
                self.choose,
                arm.node,
                IntegrationProfile::TRANSIENT,
                penalty,
            )?;
        }
        Ok(())
    }

    fn efficacy(&self) -> f64 {
        if self.pulls == 0 {
            return 0.0;
        }
        let best = self.arms[self.best_arm()].p;
        if best == 0.0 {
            return 1.0;
        }
        f64::from(self.reward) / f64::from(self.pulls) / best
    }

    /// Run trials until the best arm alone has been pulled for
    /// `convergence_streak` consecutive trials, or the pull budget runs out.
    pub fn run_suite(&mut self) -> Result<BanditOutcome> {
        let best = self.best_arm();
        let mut streak = 0;
        let mut trials = 0;
        let mut converged = false;

        while self.pulls <= self.config.max_pulls {
            trials += 1;
            let pulled = self.run_trial()?;
            if pulled == [best] {
                streak += 1;
            } else {
                streak = 0;
            }
            if streak >= self.config.convergence_streak {
                converged = true;
                break;
            }
        }

        let outcome = BanditOutcome {
            pulls: self.pulls,
            reward: self.reward,
            efficacy: self.efficacy(),
            converged,
            best_arm: best,
            trials,
            probabilities: self.probabilities(),
        };
        debug!(
            pulls = outcome.pulls,
            efficacy = outcome.efficacy,
            converged,
            "bandit suite finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(hebbian: bool) -> BanditConfig {
        BanditConfig {
            probabilities: Some(vec![0.2, 0.4, 0.6, 0.9]),
            hebbian,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_bad_configs() {
        let bad = BanditConfig {
            probabilities: Some(vec![0.5, 1.5]),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(XngError::Config { .. })));

        let bad = BanditConfig {
            probabilities: Some(Vec::new()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = BanditConfig {
            trial_spacing: 30,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn explicit_wiring_pulls_every_arm_first() {
        let mut harness = BanditHarness::new(config(false)).unwrap();
        assert_eq!(harness.best_arm(), 3);
        assert_eq!(harness.run_trial().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(harness.pulls(), 4);
        assert_eq!(harness.network().now(), 120);
    }

    #[test]
    fn hebbian_wiring_explores_one_arm() {
        let mut harness = BanditHarness::new(config(true)).unwrap();
        assert_eq!(harness.network().edge_count(), 0);

        let pulled = harness.run_trial().unwrap();
        assert_eq!(pulled.len(), 1);
        assert_eq!(harness.network().edge_count(), 1);
        assert_eq!(harness.network().now(), 240);
    }

    #[test]
    fn explicit_miss_penalizes_every_arm() {
        let config = BanditConfig {
            miss_penalty: Some(-0.1),
            ..config(false)
        };
        let mut harness = BanditHarness::new(config).unwrap();
        let choose = harness.choose();
        let arms: Vec<NodeId> = harness.arms.iter().map(|a| a.node).collect();
        for &arm in &arms {
            harness.net.set_coefficient(choose, arm, 0.5).unwrap();
        }

        assert!(harness.run_trial().unwrap().is_empty());
        assert_eq!(harness.pulls(), 0);
        assert_eq!(harness.network().now(), 120);
        for &arm in &arms {
            let weight = harness.network().weight(choose, arm).unwrap();
            assert!((weight - 0.4).abs() < 1e-6, "{weight}");
        }
    }

    #[test]
    fn miss_penalty_must_be_negative() {
        let bad = BanditConfig {
            miss_penalty: Some(0.1),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn drawn_probabilities_follow_the_seed() {
        let a = BanditHarness::new(BanditConfig::default()).unwrap();
        let b = BanditHarness::new(BanditConfig::default()).unwrap();
        assert_eq!(a.probabilities(), b.probabilities());
        assert_eq!(a.probabilities().len(), 4);
    }
}
