//! # xng Runtime
//!
//! The network engine: a single worker that owns every node, edge and
//! cluster and drives them through virtual time.
//!
//! Nodes fire, edges carry time-profiled contributions to posterior
//! threshold integrators, and reverse STDP depresses edges whose posterior
//! fired just before the prior. Bulk operators (associate, disassociate,
//! scale) rewrite weights across whole clusters by recency.
//!
//! ```rust
//! use xng_runtime::prelude::*;
//!
//! let mut net = Network::new();
//! let input = net.add_cluster(ClusterKind::Input, "input");
//! let bi = net.add_cluster(ClusterKind::Bi, "bi");
//! let a = net.add_node(input).unwrap();
//! let b = net.add_node(bi).unwrap();
//! net.then(a, b).unwrap();
//!
//! net.activate(a).unwrap();
//! net.fast_forward_until_idle().unwrap();
//! assert_eq!(net.node(b).unwrap().last_activation(), Some(10));
//! ```

pub mod association;
pub mod bandit;
pub mod cluster;
pub mod config;
pub mod connections;
pub mod constructs;
pub mod context;
pub mod junction;
pub mod network;
pub mod node;
pub mod prelude;
pub mod recency;
pub mod snapshot;
