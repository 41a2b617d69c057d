//! Handrail: a resilient interaction and observability layer for UI test
//! automation.
//!
//! Tests describe WHAT to interact with (ordered candidate tables, fallback
//! procedure chains, post-conditions) and Handrail owns HOW: bounded waits,
//! ordered fallback, failure classification, step recording with artifact
//! capture, and bounded return-to-baseline recovery.
//!
//! [`Harness`] wires the component crates around one driver session;
//! the crates are also usable individually.

pub mod config;
pub mod harness;
pub mod logging;

pub use config::HarnessConfig;
pub use harness::Harness;
pub use logging::init_logging;

pub use handrail_actions::{
    ActionExecutor, ActionIntent, ActionOutcome, AttemptRecord, ExecCtx, ExecutorConfig,
    FallbackPosture, IntentKind, Interaction, PostCondition, Procedure,
};
pub use handrail_core_types::{FailureKind, Platform, SessionId, SessionRoute};
pub use handrail_discovery::{
    discover, DiscoveredItem, DiscoveryConfig, DiscoveryLoop, DiscoverySource, RawItem,
};
pub use handrail_driver::{
    wait_until, DriverError, ElementProbe, ElementRef, LocatorExpr, ScrollDirection, SurfaceInfo,
    SystemKey, UiDriver, WaitOpts, WaitOutcome,
};
pub use handrail_locator::{
    ElementHandle, LocatorCandidate, LocatorError, Readiness, Resolution, SelectorResolver,
    TargetKind,
};
pub use handrail_observe::{
    ArtifactSink, ObserveError, ScreenshotSink, StepRecord, StepRecorder, StepReport, StepStatus,
};
pub use handrail_recovery::{RecoveryConfig, RecoveryOutcome, StateRecoveryController};
