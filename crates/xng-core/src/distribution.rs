//! Distribution: an edge weight plus the smoothing state used to interpret
//! reinforcement.
//!
//! Reinforcement is damped by how erratic recent reinforcement magnitudes
//! have been: an exponential moving mean and variance of `|δ|` are kept,
//! and each step is scaled by `clamp(1 − stddev / (|mean| + ε), 0, 1)`.
//! Consistent evidence moves the weight at full rate; noisy evidence
//! barely moves it.

use crate::types::WEIGHT_EPSILON;
use serde::{Deserialize, Serialize};

/// Decay of the moving statistics.
pub const SMOOTHING_ALPHA: f32 = 0.1;

const MEAN_EPSILON: f32 = 1e-6;

/// Scalar weight with reinforcement smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    weight: f32,
    mean: f32,
    variance: f32,
    samples: u32,
    alpha: f32,
}

impl Distribution {
    pub fn new(weight: f32) -> Self {
        Self::with_alpha(weight, SMOOTHING_ALPHA)
    }

    /// A distribution whose moving statistics decay at `alpha` instead of the default.
    pub fn with_alpha(weight: f32, alpha: f32) -> Self {
        let mut d = Self {
            weight: 0.0,
            mean: 0.0,
            variance: 0.0,
            samples: 0,
            alpha,
        };
        d.set(weight);
        d
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Whether the weight has collapsed to zero and the owning edge may be removed.
    pub fn is_dead(&self) -> bool {
        self.weight == 0.0
    }

    /// Number of reinforcement samples since the last `set`.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Running mean of `|δ|`.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Running standard deviation of `|δ|`.
    pub fn stddev(&self) -> f32 {
        self.variance.max(0.0).sqrt()
    }

    /// Overwrite the weight and forget all reinforcement history.
    pub fn set(&mut self, weight: f32) {
        self.weight = weight;
        self.mean = 0.0;
        self.variance = 0.0;
        self.samples = 0;
        self.snap();
    }

    /// Multiply the weight, leaving the smoothing statistics alone.
    pub fn scale(&mut self, factor: f32) {
        self.weight *= factor;
        self.snap();
    }

    /// Move the weight by `delta`, damped by the noise of recent reinforcement.
    ///
    /// A zero delta carries no evidence and is ignored. Until two samples have
    /// been seen the variance is undefined and the raw delta is applied.
    pub fn reinforce(&mut self, delta: f32) {
        if delta == 0.0 || !delta.is_finite() {
            return;
        }

        let magnitude = delta.abs();
        if self.samples == 0 {
            self.mean = magnitude;
            self.variance = 0.0;
        } else {
            let diff = magnitude - self.mean;
            let increment = self.alpha * diff;
            self.mean += increment;
            self.variance = (1.0 - self.alpha) * (self.variance + diff * increment);
        }
        self.samples = self.samples.saturating_add(1);

        let step = if self.samples < 2 {
            delta
        } else {
            delta * self.confidence()
        };
        self.weight += step;
        self.snap();
    }

    /// Fraction of a reinforcement that is currently applied.
    pub fn confidence(&self) -> f32 {
        (1.0 - self.stddev() / (self.mean.abs() + MEAN_EPSILON)).clamp(0.0, 1.0)
    }

    fn snap(&mut self) {
        if self.weight.abs() <= WEIGHT_EPSILON {
            self.weight = 0.0;
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_resets_history() {
        let mut d = Distribution::new(0.5);
        d.reinforce(0.1);
        d.reinforce(0.3);
        d.set(1.2);
        assert_eq!(d.weight(), 1.2);
        assert_eq!(d.samples(), 0);
        assert_eq!(d.mean(), 0.0);
    }

    #[test]
    fn first_sample_is_raw() {
        let mut d = Distribution::new(1.2);
        d.reinforce(-0.05);
        assert!((d.weight() - 1.15).abs() < 1e-6);
    }

    #[test]
    fn consistent_samples_apply_in_full() {
        let mut d = Distribution::new(0.0);
        d.reinforce(1.2);
        d.reinforce(-1.2);
        assert_eq!(d.weight(), 0.0);
        assert!(d.is_dead());
    }

    #[test]
    fn noisy_samples_are_damped() {
        let mut d = Distribution::new(0.0);
        d.reinforce(0.01);
        d.reinforce(1.0);
        // mean 0.109, stddev ~0.297: the second step is swallowed entirely
        assert!((d.weight() - 0.01).abs() < 1e-6);
        assert!(d.confidence() < 1.0);
    }

    #[test]
    fn zero_reinforcement_is_not_evidence() {
        let mut d = Distribution::new(1.0);
        d.reinforce(0.0);
        assert_eq!(d.samples(), 0);
        assert_eq!(d.weight(), 1.0);
    }

    #[test]
    fn scale_keeps_statistics_and_snaps() {
        let mut d = Distribution::new(1.0);
        d.reinforce(0.5);
        let mean = d.mean();
        d.scale(0.5);
        assert_eq!(d.weight(), 0.75);
        assert_eq!(d.mean(), mean);
        d.scale(1e-7);
        assert_eq!(d.weight(), 0.0);
    }

    #[test]
    fn json_keeps_smoothing_state() {
        let mut d = Distribution::new(0.5);
        d.reinforce(0.2);
        d.reinforce(0.3);

        let json = serde_json::to_string(&d).unwrap();
        let mut restored: Distribution = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, d);

        d.reinforce(-0.4);
        restored.reinforce(-0.4);
        assert_eq!(restored.weight(), d.weight());
        assert_eq!(restored.samples(), 3);
    }

    #[test]
    fn tiny_weights_snap_to_zero() {
        let d = Distribution::new(5e-7);
        assert!(d.is_dead());
    }
}
