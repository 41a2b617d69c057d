//! Core types for action execution.

use chrono::{DateTime, Utc};
use handrail_core_types::{ActionId, FailureKind, SessionRoute};
use handrail_locator::{LocatorCandidate, Readiness};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Execution context threaded through every action.
///
/// Carries the session route, an overall deadline and a cooperative
/// cancellation token; no component keeps hidden session state.
#[derive(Clone)]
pub struct ExecCtx {
    pub route: SessionRoute,

    /// Deadline for the whole action, fallback chain included.
    pub deadline: Instant,

    pub cancel_token: CancellationToken,

    /// Unique identifier for tracing and correlation.
    pub action_id: ActionId,
}

impl ExecCtx {
    pub fn new(route: SessionRoute, deadline: Instant, cancel_token: CancellationToken) -> Self {
        Self {
            route,
            deadline,
            cancel_token,
            action_id: ActionId::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_past_deadline(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn remaining_time(&self) -> std::time::Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// What an action is trying to accomplish, for reporting and for the
/// exhaustion policy (navigation intents get the fallback posture).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionIntent {
    pub name: String,
    pub kind: IntentKind,
}

impl ActionIntent {
    pub fn standard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IntentKind::Standard,
        }
    }

    pub fn navigation(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IntentKind::Navigation,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum IntentKind {
    /// Leaves the current screen as-is on failure.
    Standard,

    /// Expected to move to a different screen; exhaustion triggers the
    /// back/home/relaunch fallback posture.
    Navigation,
}

/// The single interaction a procedure performs once its element resolves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Interaction {
    Tap,

    SetValue(String),

    /// Wait (bounded) for the resolved element to reach a state.
    WaitForState(Readiness),
}

/// Verification that an interaction had its intended effect, checked with
/// a bounded wait after the interaction returns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PostCondition {
    /// No verification beyond the interaction itself succeeding.
    None,

    /// The interacted element reports this exact value.
    ValueIs(String),

    /// Some candidate of this table resolves (e.g. a dialog appeared).
    ElementPresent(Vec<LocatorCandidate>),

    /// No candidate of this table resolves any more (e.g. spinner gone).
    ElementGone(Vec<LocatorCandidate>),

    /// The foreground surface id contains this fragment (navigation
    /// actually happened).
    SurfaceContains(String),
}

/// One entry of an action's fallback chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Procedure {
    /// Optional label for diagnostics ("primary", "overflow menu", ...).
    pub label: Option<String>,

    pub candidates: Vec<LocatorCandidate>,

    /// Readiness required of the resolved element.
    pub readiness: Option<Readiness>,

    pub interaction: Interaction,

    pub post: PostCondition,
}

impl Procedure {
    pub fn new(candidates: Vec<LocatorCandidate>, interaction: Interaction) -> Self {
        Self {
            label: None,
            candidates,
            readiness: None,
            interaction,
            post: PostCondition::None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = Some(readiness);
        self
    }

    pub fn with_post(mut self, post: PostCondition) -> Self {
        self.post = post;
        self
    }
}

/// Stage at which a procedure was abandoned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AttemptStage {
    Resolution,
    Interaction,
    PostCondition,
}

/// Why one procedure attempt failed.
#[derive(Clone, Debug, Error, Serialize, Deserialize)]
#[error("{stage:?} failed ({kind}): {detail}")]
pub struct AttemptFailure {
    pub kind: FailureKind,
    pub stage: AttemptStage,
    pub detail: String,
}

/// Record of one abandoned procedure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub procedure_index: usize,
    pub label: Option<String>,
    pub failure: AttemptFailure,
}

/// The procedure (and candidate within it) that completed the action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletedAttempt {
    pub procedure_index: usize,
    pub label: Option<String>,
    pub candidate: LocatorCandidate,
    pub candidate_index: usize,
}

/// Platform-level stage of the navigation fallback posture.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FallbackPosture {
    BackKey,
    HomeKey,
    Relaunch,
}

/// What the navigation fallback posture tried after exhaustion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavigationRecovery {
    pub attempted: Vec<FallbackPosture>,
    pub succeeded: Option<FallbackPosture>,
}

/// Complete report of one action. Created per call and handed straight to
/// the caller; never cached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub intent: ActionIntent,

    pub success: bool,

    /// Terminal classification; `None` on success.
    pub error: Option<FailureKind>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    /// The procedure that completed, when one did.
    pub completed: Option<CompletedAttempt>,

    /// Every abandoned procedure in attempt order. Populated on success
    /// too, covering the procedures tried before the one that completed.
    pub attempts: Vec<AttemptRecord>,

    /// Fallback posture record for exhausted navigation intents.
    pub recovery: Option<NavigationRecovery>,
}

impl ActionOutcome {
    pub(crate) fn started(intent: ActionIntent) -> Self {
        let now = Utc::now();
        Self {
            intent,
            success: false,
            error: None,
            started_at: now,
            finished_at: now,
            attempts: Vec::new(),
            completed: None,
            recovery: None,
            latency_ms: 0,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at).num_milliseconds().max(0) as u64;
        self
    }
}
