//! Return-to-baseline recovery.
//!
//! [`StateRecoveryController::ensure_known_state`] drives the session back
//! to a known baseline surface through a bounded, documented sequence. It
//! never errors and is safe to call repeatedly, so teardown paths can rely
//! on it unconditionally.

pub mod controller;

pub use controller::{RecoveryConfig, RecoveryOutcome, StateRecoveryController};
