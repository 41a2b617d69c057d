//! Error types for instrumentation side channels.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ObserveError {
    /// Artifact capture failed (driver or filesystem).
    #[error("Artifact capture failed: {0}")]
    Artifact(String),

    /// The results directory is unusable.
    #[error("Results directory error: {0}")]
    ResultsDir(String),
}
