//! Threshold integrators: integrators that know when they will fire.
//!
//! Every time an impulse lands, the earliest upward crossing of the
//! threshold is recomputed in closed form. If it moved, the previous firing
//! is invalidated by bumping a generation token and a new one is requested.
//! Firing tasks carry the token they were issued with; a task holding a
//! stale token is a no-op when it runs.

use crate::integrator::{Impulse, Integrator};
use crate::types::{Tick, THRESHOLD};
use serde::{Deserialize, Serialize};

/// What the owner must do with the scheduler after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reschedule {
    /// The pending firing (or its absence) still holds.
    Unchanged,
    /// Schedule a firing at `at` carrying `token`; any earlier token is stale.
    Schedule { at: Tick, token: u64 },
    /// The pending firing is stale and nothing replaces it.
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdIntegrator {
    integrator: Integrator,
    threshold: f32,
    scheduled: Option<Tick>,
    token: u64,
    last_fired: Option<Tick>,
}

impl ThresholdIntegrator {
    pub fn new() -> Self {
        Self::with_threshold(THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            integrator: Integrator::new(),
            threshold,
            scheduled: None,
            token: 0,
            last_fired: None,
        }
    }

    /// Absorb an impulse at `now` and work out the next firing.
    pub fn add(&mut self, now: Tick, impulse: Impulse) -> Reschedule {
        self.integrator.add(impulse);
        self.reschedule(now)
    }

    /// Integrated value at `t`.
    pub fn value(&self, t: Tick) -> f32 {
        self.integrator.evaluate(t)
    }

    /// Earliest tick `>= now` at which the value reaches the threshold having
    /// dropped below it since the last firing.
    pub fn next_firing(&self, now: Tick) -> Option<Tick> {
        let from = match self.last_fired {
            None => now,
            Some(fired) => self
                .integrator
                .next_release(fired, self.threshold)?
                .max(now),
        };
        self.integrator.next_crossing(from, self.threshold)
    }

    /// Recompute the pending firing, issuing a fresh token if it moved.
    pub fn reschedule(&mut self, now: Tick) -> Reschedule {
        let next = self.next_firing(now);
        if next == self.scheduled {
            return Reschedule::Unchanged;
        }

        self.token += 1;
        self.scheduled = next;
        match next {
            Some(at) => Reschedule::Schedule {
                at,
                token: self.token,
            },
            None => Reschedule::Cancelled,
        }
    }

    /// Whether a task carrying `token` is still the pending firing.
    pub fn is_current(&self, token: u64) -> bool {
        self.scheduled.is_some() && self.token == token
    }

    /// Consume the pending firing if `token` is current. Returns whether the
    /// owner should activate its posterior.
    pub fn fire(&mut self, now: Tick, token: u64) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.scheduled = None;
        self.last_fired = Some(now);
        true
    }

    pub fn scheduled(&self) -> Option<Tick> {
        self.scheduled
    }

    pub fn last_fired(&self) -> Option<Tick> {
        self.last_fired
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }
}

impl Default for ThresholdIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::IntegrationProfile;

    const T: IntegrationProfile = IntegrationProfile::TRANSIENT;

    #[test]
    fn schedules_on_arrival_at_full_strength() {
        let mut ti = ThresholdIntegrator::new();
        let r = ti.add(10, Impulse::new(0, 1.2, T));
        assert_eq!(r, Reschedule::Schedule { at: 10, token: 1 });
        assert!(ti.fire(10, 1));
        assert_eq!(ti.scheduled(), None);
        // still above threshold until the ramp down: no refire
        assert_eq!(ti.reschedule(10), Reschedule::Unchanged);
    }

    #[test]
    fn inhibition_cancels_pending_firing() {
        let mut ti = ThresholdIntegrator::new();
        let first = ti.add(10, Impulse::new(0, 1.2, T));
        assert_eq!(first, Reschedule::Schedule { at: 10, token: 1 });
        assert_eq!(ti.add(10, Impulse::new(0, -1.0, T)), Reschedule::Cancelled);
        assert!(!ti.fire(10, 1));
    }

    #[test]
    fn stale_token_is_ignored_after_move() {
        let mut ti = ThresholdIntegrator::new();
        // crosses on the ramp at t = 5
        assert_eq!(
            ti.add(0, Impulse::new(0, 2.0, T)),
            Reschedule::Schedule { at: 5, token: 1 }
        );
        // a second impulse pulls the crossing earlier
        assert_eq!(
            ti.add(0, Impulse::new(0, 2.0, T)),
            Reschedule::Schedule { at: 3, token: 2 }
        );
        assert!(!ti.fire(5, 1));
        assert!(ti.fire(3, 2));
    }

    #[test]
    fn refires_after_release() {
        let mut ti = ThresholdIntegrator::new();
        ti.add(10, Impulse::new(0, 1.2, T));
        assert!(ti.fire(10, 1));
        // the first envelope drops below threshold at 52; a second arrives later
        let r = ti.add(110, Impulse::new(100, 1.2, T));
        assert_eq!(r, Reschedule::Schedule { at: 110, token: 2 });
    }

    #[test]
    fn no_refire_while_still_above() {
        let mut ti = ThresholdIntegrator::new();
        ti.add(10, Impulse::new(0, 1.2, T));
        assert!(ti.fire(10, 1));
        assert_eq!(ti.add(20, Impulse::new(10, 1.2, T)), Reschedule::Unchanged);
    }
}
