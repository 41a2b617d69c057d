//! Error types for candidate resolution.
//!
//! "No candidate matched" is not represented here: the resolver returns it
//! as a [`crate::Resolution::NotFound`] value. Errors cover malformed input
//! only.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// An empty candidate table was supplied.
    #[error("Empty candidate table: {0}")]
    EmptyCandidateList(String),

    /// A candidate expression is unusable (empty query, wrong platform).
    #[error("Invalid candidate at index {index}: {reason}")]
    InvalidCandidate { index: usize, reason: String },
}
