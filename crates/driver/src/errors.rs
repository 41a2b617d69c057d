//! Error types for driver communication.

use thiserror::Error;

/// Errors surfaced by the underlying driver session.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    /// Transport or protocol failure talking to the session.
    #[error("Driver I/O error: {0}")]
    Io(String),

    /// A command was rejected or failed inside the driver.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The element reference no longer points at a live element.
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// The session itself is gone (crashed app, closed browser).
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// A driver-side wait gave up.
    #[error("Driver wait timed out: {0}")]
    WaitTimeout(String),
}

impl DriverError {
    /// Whether retrying the same command against the same session can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriverError::Io(_) | DriverError::StaleElement(_) | DriverError::WaitTimeout(_)
        )
    }

    /// Severity level (0=low, 1=medium, 2=high, 3=critical).
    pub fn severity(&self) -> u8 {
        match self {
            DriverError::SessionLost(_) => 3,
            DriverError::Io(_) => 2,
            DriverError::CommandFailed(_) | DriverError::WaitTimeout(_) => 1,
            DriverError::StaleElement(_) => 0,
        }
    }
}
