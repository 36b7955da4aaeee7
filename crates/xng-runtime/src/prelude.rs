//! xng Runtime Prelude: convenient imports for common usage.
//!
//! ```rust
//! use xng_runtime::prelude::*;
//! ```

pub use crate::association::{PriorClusterProfile, PriorClusterProfileList};
pub use crate::bandit::{BanditConfig, BanditHarness, BanditOutcome};
pub use crate::cluster::{Cluster, Observer, ObserverId};
pub use crate::config::NetworkConfig;
pub use crate::connections::INHIBITION;
pub use crate::constructs::{BooleanDecoder, Latch, Sequence};
pub use crate::context::Context;
pub use crate::junction::ConjunctionJunction;
pub use crate::network::Network;
pub use crate::node::{DataValue, Edge, Node, NodeKind, PosteriorState, PriorState};
pub use crate::recency::{Link, RecencyQueue};
pub use crate::snapshot::{ClusterSnapshot, EdgeSnapshot, NetworkSnapshot, NodeSnapshot};

pub use xng_core::prelude::*;
