//! Integration profiles: the trapezoidal time kernels shared by traces and edges.
//!
//! A profile `(ramp_up, period, ramp_down)` describes how an impulse at `t0`
//! is felt over time:
//!
//! ```text
//!   1 |      ___________
//!     |     /           \
//!   0 |____/             \______
//!         t0  +ramp_up  +period  +ramp_down
//! ```
//!
//! The kernel is continuous, peaks at 1 and has finite support, so every
//! integrator built on it is piecewise linear in time.

use crate::error::{Result, XngError};
use crate::types::{Duration, Tick};
use serde::{Deserialize, Serialize};

/// Immutable trapezoid kernel shape. Profiles compare equal by their three spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegrationProfile {
    ramp_up: Duration,
    period: Duration,
    ramp_down: Duration,
}

impl IntegrationProfile {
    /// Short window, the default for traces and edges.
    pub const TRANSIENT: IntegrationProfile = IntegrationProfile {
        ramp_up: 10,
        period: 40,
        ramp_down: 10,
    };

    /// Longer window used for sequence memory.
    pub const TWOGRAM: IntegrationProfile = IntegrationProfile {
        ramp_up: 20,
        period: 80,
        ramp_down: 20,
    };

    /// Create a profile. Both ramps must be positive and the period nonnegative.
    pub fn new(ramp_up: Duration, period: Duration, ramp_down: Duration) -> Result<Self> {
        if ramp_up <= 0 || period < 0 || ramp_down <= 0 {
            return Err(XngError::InvalidProfile {
                ramp_up,
                period,
                ramp_down,
            });
        }
        Ok(Self {
            ramp_up,
            period,
            ramp_down,
        })
    }

    pub fn ramp_up(&self) -> Duration {
        self.ramp_up
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ramp_down(&self) -> Duration {
        self.ramp_down
    }

    /// Latency of an edge under this profile: contributions are delivered once fully ramped.
    pub fn delay(&self) -> Duration {
        self.ramp_up
    }

    /// Pacing step for synthetic delay chains.
    pub fn default_interval(&self) -> Duration {
        self.period / 8
    }

    /// Total length of the kernel's nonzero region.
    pub fn support(&self) -> Duration {
        self.ramp_up + self.period + self.ramp_down
    }

    /// Kernel value `d` ticks after an impulse.
    pub fn kernel(&self, d: Duration) -> f32 {
        if d <= 0 || d >= self.support() {
            0.0
        } else if d < self.ramp_up {
            d as f32 / self.ramp_up as f32
        } else if d <= self.ramp_up + self.period {
            1.0
        } else {
            (self.support() - d) as f32 / self.ramp_down as f32
        }
    }

    /// The ticks at which an impulse at `t0` changes slope.
    pub fn breakpoints(&self, t0: Tick) -> [Tick; 4] {
        [
            t0,
            t0 + self.ramp_up,
            t0 + self.ramp_up + self.period,
            t0 + self.support(),
        ]
    }
}

impl Default for IntegrationProfile {
    fn default() -> Self {
        Self::TRANSIENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_shape() {
        let p = IntegrationProfile::TRANSIENT;
        assert_eq!(p.delay(), 10);
        assert_eq!(p.default_interval(), 5);
        assert_eq!(p.support(), 60);

        assert_eq!(p.kernel(-1), 0.0);
        assert_eq!(p.kernel(0), 0.0);
        assert_eq!(p.kernel(5), 0.5);
        assert_eq!(p.kernel(10), 1.0);
        assert_eq!(p.kernel(50), 1.0);
        assert_eq!(p.kernel(55), 0.5);
        assert_eq!(p.kernel(60), 0.0);
        assert_eq!(p.kernel(1_000), 0.0);
    }

    #[test]
    fn kernel_is_continuous_at_breakpoints() {
        let p = IntegrationProfile::new(3, 0, 7).unwrap();
        for d in 0..p.support() {
            let step = (p.kernel(d + 1) - p.kernel(d)).abs();
            assert!(step <= 1.0 / 3.0 + 1e-6, "jump of {step} at {d}");
        }
        assert_eq!(p.kernel(3), 1.0);
    }

    #[test]
    fn rejects_degenerate_profiles() {
        assert!(IntegrationProfile::new(0, 10, 10).is_err());
        assert!(IntegrationProfile::new(10, -1, 10).is_err());
        assert!(IntegrationProfile::new(10, 10, 0).is_err());
        assert!(IntegrationProfile::new(1, 0, 1).is_ok());
    }

    #[test]
    fn profiles_are_value_equal() {
        let a = IntegrationProfile::new(10, 40, 10).unwrap();
        assert_eq!(a, IntegrationProfile::TRANSIENT);
        assert_ne!(a, IntegrationProfile::TWOGRAM);
    }

    #[test]
    fn profiles_serialize_by_shape() {
        let json = serde_json::to_string(&IntegrationProfile::TWOGRAM).unwrap();
        let back: IntegrationProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IntegrationProfile::TWOGRAM);
        assert_eq!(back.delay(), 20);
    }
}
