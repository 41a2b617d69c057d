//! Core types for the discovery loop.

use async_trait::async_trait;
use handrail_driver::DriverError;
use serde::{Deserialize, Serialize};

/// One item as harvested from the current UI snapshot, before merging.
/// The identity key is derived from visible text or an accessibility label
/// by the source; keys must be stable for the same on-screen item.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawItem {
    pub key: String,
    pub payload: serde_json::Value,
}

impl RawItem {
    pub fn new(key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }

    /// Item whose identity and payload are both its visible text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            payload: serde_json::Value::String(text.clone()),
            key: text,
        }
    }
}

/// A merged item with its first-sighting position. Identity keys are
/// unique within one discovery session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveredItem {
    pub key: String,
    pub payload: serde_json::Value,

    /// 1-based iteration at which the item was first seen.
    pub first_seen_iteration: u32,
}

/// The harvest / reveal pair driving one discovery session.
///
/// `harvest` reads the currently visible items; `reveal_more` changes what
/// is visible for the next iteration (scroll, "load more" tap, pagination).
#[async_trait]
pub trait DiscoverySource: Send {
    async fn harvest(&mut self) -> Result<Vec<RawItem>, DriverError>;

    async fn reveal_more(&mut self) -> Result<(), DriverError>;
}

/// Termination policy. The thresholds are empirical and vary by screen, so
/// they are parameters rather than constants.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Hard cap on iterations.
    pub max_iterations: u32,

    /// Consecutive zero-growth iterations after which the loop stops.
    pub stagnation_limit: u32,

    /// Minimum iterations before stagnation may terminate the loop; early
    /// iterations legitimately show transient zero growth.
    pub grace_period: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            stagnation_limit: 2,
            grace_period: 2,
        }
    }
}

impl DiscoveryConfig {
    pub fn new(max_iterations: u32, stagnation_limit: u32) -> Self {
        Self {
            max_iterations,
            stagnation_limit,
            ..Self::default()
        }
    }

    pub fn with_grace_period(mut self, grace_period: u32) -> Self {
        self.grace_period = grace_period;
        self
    }
}
