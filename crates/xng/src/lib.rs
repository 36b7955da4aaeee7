//! # xng
//!
//! A discrete-event simulator for small associative "spiking" networks that
//! learn temporal conjunctions between nodes.
//!
//! Nodes emit instantaneous activations. Edges carry weighted, time-profiled
//! contributions that integrate at posterior nodes until a threshold is
//! crossed, firing them in turn. Edge weights move by reverse STDP on every
//! prior firing, and bulk operators rewrite weights across whole clusters
//! from recent activity.
//!
//! ## Quick Start
//!
//! ```rust
//! use xng::prelude::*;
//!
//! let mut net = Network::new();
//! let input = net.add_cluster(ClusterKind::Input, "input");
//! let hidden = net.add_cluster(ClusterKind::Bi, "hidden");
//!
//! let (a1, a2) = (net.add_node(input).unwrap(), net.add_node(input).unwrap());
//! let b = net.add_node(hidden).unwrap();
//!
//! // b fires only when both a1 and a2 fire within a TRANSIENT window.
//! net.conjunction(b, &[a1, a2]).unwrap();
//!
//! net.activate(a1).unwrap();
//! net.fast_forward_until_idle().unwrap();
//! assert_eq!(net.node(b).unwrap().last_activation(), None);
//!
//! net.run_for(100).unwrap();
//! net.activate(a1).unwrap();
//! net.activate(a2).unwrap();
//! net.fast_forward_until_idle().unwrap();
//! assert!(net.node(b).unwrap().last_activation().is_some());
//! ```
//!
//! ## Architecture
//!
//! - [`xng_core`] - Time kernels, integrators, distributions, the scheduler
//! - [`xng_runtime`] - The `Network` engine, clusters, association, constructs
//!
//! ## Key Concepts
//!
//! | Concept | What It Does |
//! |---------|--------------|
//! | Integration profile | Trapezoid kernel `(ramp_up, period, ramp_down)` shaping every impulse |
//! | Trace | Decaying record of a node's own firings, read under any profile |
//! | Threshold integrator | Sums incoming contributions and schedules the posterior's firing |
//! | Distribution | Edge weight plus the smoothing statistics that damp reinforcement |
//! | Cluster | Typed group of nodes with a recency queue and a plasticity |
//!
//! ### Learning
//!
//! - When a prior fires just after its posterior, the edge is depressed by
//!   the posterior's trace times the cluster plasticity.
//! - `associate` wires the priors active at each recent posterior's firing
//!   into a conjunction on it; `disassociate` undoes it by trace.

pub use xng_core as core;
pub use xng_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use xng::prelude::*;
/// ```
pub mod prelude {
    pub use xng_runtime::prelude::*;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
