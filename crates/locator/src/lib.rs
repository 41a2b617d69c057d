//! Ordered-fallback element resolution.
//!
//! One parameterized resolver driven by declarative candidate tables
//! replaces the per-element "find X button" helpers of the original
//! scripts, preserving their exact ordered-fallback semantics.

pub mod errors;
pub mod resolver;
pub mod types;

pub use errors::LocatorError;
pub use resolver::SelectorResolver;
pub use types::{ElementHandle, LocatorCandidate, Readiness, Resolution, TargetKind};
