//! Fallback-chain action execution.
//!
//! An action is an intent plus an ordered list of procedures. Each
//! procedure resolves a candidate table, performs one interaction and
//! verifies a post-condition; the first procedure to fully complete wins.
//! Exhaustion is reported with the complete attempt history, and
//! navigation intents additionally degrade to a platform-level fallback
//! posture so the next operation starts from a known state.

pub mod executor;
pub mod types;

pub use executor::{ActionExecutor, ExecutorConfig};
pub use types::{
    ActionIntent, ActionOutcome, AttemptFailure, AttemptRecord, AttemptStage, CompletedAttempt,
    ExecCtx, FallbackPosture, IntentKind, Interaction, NavigationRecovery, PostCondition,
    Procedure,
};
