//! Step-level instrumentation.
//!
//! [`StepRecorder::run_step`] wraps any unit of work with start/end
//! logging, timing and optional artifact capture, without changing the
//! work's result or error: instrumentation is a pure side channel. Nested
//! steps form a tree that is handed to an external reporting collaborator
//! at teardown.

pub mod artifact;
pub mod errors;
pub mod recorder;
pub mod types;

pub use artifact::{ArtifactSink, ScreenshotSink};
pub use errors::ObserveError;
pub use recorder::{StepOptions, StepRecorder};
pub use types::{StepRecord, StepReport, StepStatus};
