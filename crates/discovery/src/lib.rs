//! Scroll-driven content discovery.
//!
//! Repeatedly harvests the currently visible items and triggers a "reveal
//! more" side effect (typically a scroll), merging results into a
//! deduplicated, order-preserving accumulator until the iteration cap or
//! the stagnation policy fires.

pub mod discover;
pub mod errors;
pub mod types;

pub use discover::{discover, DiscoveryLoop};
pub use errors::DiscoveryError;
pub use types::{DiscoveredItem, DiscoveryConfig, DiscoverySource, RawItem};
