//! xng Core Prelude: convenient imports for common usage.
//!
//! ```rust
//! use xng_core::prelude::*;
//! ```

pub use crate::types::{
    weight_by_trace, Activation, ClusterId, ClusterKind, Duration, NodeId, Tick,
    DEFAULT_COEFFICIENT, DEFAULT_PLASTICITY, THRESHOLD, THRESHOLD_MARGIN, WEIGHT_EPSILON,
};

pub use crate::distribution::Distribution;
pub use crate::integrator::{Impulse, Integrator, Trace};
pub use crate::profile::IntegrationProfile;
pub use crate::scheduler::Scheduler;
pub use crate::threshold::{Reschedule, ThresholdIntegrator};

pub use crate::error::{Result, XngError};
