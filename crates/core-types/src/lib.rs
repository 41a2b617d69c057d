//! Shared identifiers and the failure taxonomy used across the Handrail crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier for one UI driver session. Every component instance is owned by
/// exactly one session; sessions are never shared across test workers.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

/// Target platform of a locator expression or driver session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Accessibility-tree queries against a mobile app.
    Mobile,
    /// DOM / text selectors against a web page.
    Web,
}

/// Explicit session context passed into every call. Replaces the implicit
/// module-level driver assumptions of the original scripts.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionRoute {
    pub session: SessionId,
    pub platform: Platform,
}

impl SessionRoute {
    pub fn new(session: SessionId, platform: Platform) -> Self {
        Self { session, platform }
    }
}

impl fmt::Display for SessionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session={} platform={:?}", self.session.0, self.platform)
    }
}

/// Failure classification shared by every component.
///
/// `NotFound`, `ActionFailed` and `Timeout` are recovered locally by the
/// executor's fallback chain and surface only once every configured
/// procedure is exhausted. `EnvironmentUnstable` marks exhaustion of the
/// platform-level fallback posture on top of the chain: the UI is in an
/// unknown state and only the recovery controller can bring it back. It is
/// logged and best-effort recovered, never escalated into a crash.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
pub enum FailureKind {
    /// No candidate in a resolution attempt matched.
    #[error("NotFound")]
    NotFound,

    /// A candidate matched but the interaction or its post-condition failed.
    #[error("ActionFailed")]
    ActionFailed,

    /// A bounded wait was exceeded during probing or post-condition checking.
    #[error("Timeout")]
    Timeout,

    /// The fallback chain and the platform-level posture both failed; the
    /// UI is in an unknown state pending recovery.
    #[error("EnvironmentUnstable")]
    EnvironmentUnstable,
}

impl FailureKind {
    /// Whether an alternate procedure is worth attempting after this failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FailureKind::NotFound | FailureKind::ActionFailed | FailureKind::Timeout
        )
    }

    /// Severity level (0=low, 1=medium, 2=high).
    pub fn severity(&self) -> u8 {
        match self {
            FailureKind::NotFound => 0,
            FailureKind::ActionFailed | FailureKind::Timeout => 1,
            FailureKind::EnvironmentUnstable => 2,
        }
    }
}
