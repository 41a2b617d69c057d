//! Error types for discovery.
//!
//! Harvest and reveal failures are absorbed by the loop (a failed harvest
//! is an iteration with zero new items); only unusable configuration is an
//! error.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DiscoveryError {
    #[error("Invalid discovery config: {0}")]
    InvalidConfig(String),
}
