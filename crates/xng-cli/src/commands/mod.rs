//! CLI command implementations.

pub mod bandit;
pub mod init;
pub mod scenario;
