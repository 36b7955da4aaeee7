//! # xng Core
//!
//! Core types for the xng associative spiking network.
//!
//! This crate holds the pieces of the activation engine that carry no
//! graph structure of their own:
//!
//! - **Scheduler**: the virtual-time clock and FIFO-stable task heap
//! - **IntegrationProfile**: trapezoidal time kernels `(ramp_up, period, ramp_down)`
//! - **Integrator / Trace**: piecewise-linear sums of kernel-weighted impulses
//! - **ThresholdIntegrator**: an integrator that predicts its own firing
//! - **Distribution**: a plastic edge weight with reinforcement smoothing
//!
//! ## Quick Start
//!
//! ```rust
//! use xng_core::prelude::*;
//!
//! let mut integrator = ThresholdIntegrator::new();
//! let impulse = Impulse::new(0, DEFAULT_COEFFICIENT, IntegrationProfile::TRANSIENT);
//! let next = integrator.add(10, impulse);
//! assert_eq!(next, Reschedule::Schedule { at: 10, token: 1 });
//! ```

pub mod distribution;
pub mod error;
pub mod integrator;
pub mod prelude;
pub mod profile;
pub mod scheduler;
pub mod threshold;
pub mod types;
