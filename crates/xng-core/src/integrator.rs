//! Integrators: piecewise-linear accumulators of kernel-weighted impulses.
//!
//! The value of an integrator at `t` is the superposition
//! `Σ magnitude · k(t − t0)` over its impulses. Because every kernel is a
//! trapezoid, the sum is linear between consecutive breakpoints, which lets
//! threshold crossings be solved exactly instead of sampled.

use crate::profile::IntegrationProfile;
use crate::types::{Duration, Tick};
use serde::{Deserialize, Serialize};

/// Slack applied when comparing an integrated value against a threshold,
/// absorbing `f32` rounding in sums such as `3 × 0.4`.
pub const CROSSING_TOLERANCE: f32 = 1e-5;

/// A single contribution to an integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impulse {
    /// Origin of the kernel.
    pub at: Tick,
    pub magnitude: f32,
    pub profile: IntegrationProfile,
}

impl Impulse {
    pub fn new(at: Tick, magnitude: f32, profile: IntegrationProfile) -> Self {
        Self {
            at,
            magnitude,
            profile,
        }
    }

    fn value(&self, t: Tick) -> f32 {
        self.magnitude * self.profile.kernel(t - self.at)
    }
}

/// Accumulator of impulses, each decaying under its own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Integrator {
    impulses: Vec<Impulse>,
}

impl Integrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an impulse. Impulses whose envelopes ended before it are dropped.
    pub fn add(&mut self, impulse: Impulse) {
        self.prune(impulse.at, None);
        self.impulses.push(impulse);
    }

    /// Record an impulse without pruning by its own support.
    fn push(&mut self, impulse: Impulse) {
        self.impulses.push(impulse);
    }

    /// Value at `t`, each impulse under its own profile.
    pub fn evaluate(&self, t: Tick) -> f32 {
        self.impulses.iter().map(|i| i.value(t)).sum()
    }

    /// Value at `t` with every impulse reinterpreted under `profile`.
    pub fn evaluate_under(&self, t: Tick, profile: &IntegrationProfile) -> f32 {
        self.impulses
            .iter()
            .map(|i| i.magnitude * profile.kernel(t - i.at))
            .sum()
    }

    /// Drop impulses that can no longer contribute at or after `now`.
    ///
    /// With a `retention`, impulses are kept for that long regardless of their
    /// own support, so that they can still be read under a longer profile.
    pub fn prune(&mut self, now: Tick, retention: Option<Duration>) {
        self.impulses.retain(|i| {
            let horizon = retention.unwrap_or_else(|| i.profile.support());
            now - i.at < horizon
        });
    }

    pub fn impulses(&self) -> &[Impulse] {
        &self.impulses
    }

    pub fn len(&self) -> usize {
        self.impulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impulses.is_empty()
    }

    pub fn clear(&mut self) {
        self.impulses.clear();
    }

    /// Earliest tick `>= from` at which the value is at or above `threshold`.
    pub fn next_crossing(&self, from: Tick, threshold: f32) -> Option<Tick> {
        self.first_tick(from, threshold, true)
    }

    /// Earliest tick `>= from` at which the value is below `threshold`.
    pub fn next_release(&self, from: Tick, threshold: f32) -> Option<Tick> {
        self.first_tick(from, threshold, false)
    }

    fn first_tick(&self, from: Tick, threshold: f32, above: bool) -> Option<Tick> {
        let target = threshold - CROSSING_TOLERANCE;
        let hit = |v: f32| (v >= target) == above;

        let v_from = self.evaluate(from);
        if hit(v_from) {
            return Some(from);
        }

        let mut knots: Vec<Tick> = self
            .impulses
            .iter()
            .flat_map(|i| i.profile.breakpoints(i.at))
            .filter(|&b| b > from)
            .collect();
        knots.sort_unstable();
        knots.dedup();

        let (mut a, mut va) = (from, v_from);
        for b in knots {
            let vb = self.evaluate(b);
            if hit(vb) {
                // Linear on [a, b]: solve v(x) = target, then settle on the
                // first whole tick that satisfies the comparison.
                let x = a as f64
                    + (target as f64 - va as f64) / (vb as f64 - va as f64) * (b - a) as f64;
                let mut t = (x.ceil() as Tick).clamp(a + 1, b);
                while t > a + 1 && hit(self.evaluate(t - 1)) {
                    t -= 1;
                }
                while t < b && !hit(self.evaluate(t)) {
                    t += 1;
                }
                return Some(t);
            }
            a = b;
            va = vb;
        }
        None
    }
}

/// A node's activation trace: unit impulses under the node's own profile,
/// retained long enough to be read under any standard profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    integrator: Integrator,
    profile: IntegrationProfile,
    retention: Duration,
}

impl Trace {
    pub fn new(profile: IntegrationProfile, retention: Duration) -> Self {
        Self {
            integrator: Integrator::new(),
            profile,
            retention: retention.max(profile.support()),
        }
    }

    /// Record an activation at `t`.
    pub fn record(&mut self, t: Tick) {
        self.integrator.prune(t, Some(self.retention));
        self.integrator.push(Impulse::new(t, 1.0, self.profile));
    }

    /// Trace value at `t` under `profile`.
    pub fn evaluate(&self, t: Tick, profile: &IntegrationProfile) -> f32 {
        self.integrator.evaluate_under(t, profile)
    }

    pub fn profile(&self) -> IntegrationProfile {
        self.profile
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new(
            IntegrationProfile::TRANSIENT,
            IntegrationProfile::TWOGRAM.support(),
        )
    }
}
