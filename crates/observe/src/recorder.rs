//! Transparent step recording.

use crate::artifact::ArtifactSink;
use crate::types::{StepRecord, StepReport, StepStatus};
use parking_lot::Mutex;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-step knobs. The default captures an artifact only on failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepOptions {
    /// Also capture an artifact when the step succeeds.
    pub capture_on_success: bool,
}

struct RecorderState {
    roots: Vec<StepRecord>,
    /// Index path from `roots` down to the currently open step.
    stack: Vec<usize>,
}

impl RecorderState {
    fn open(&mut self, name: &str) {
        let record = StepRecord::pending(name);
        let siblings = Self::children_at(&mut self.roots, &self.stack);
        siblings.push(record);
        let index = siblings.len() - 1;
        self.stack.push(index);
    }

    fn close(&mut self, status: StepStatus, error: Option<String>, artifact: Option<PathBuf>) {
        if let Some(record) = self.current_mut() {
            record.finish(status, error);
            if artifact.is_some() {
                record.artifact = artifact;
            }
        }
        self.stack.pop();
    }

    fn current_mut(&mut self) -> Option<&mut StepRecord> {
        let (last, parents) = self.stack.split_last()?;
        Some(&mut Self::children_at(&mut self.roots, parents)[*last])
    }

    fn children_at<'a>(roots: &'a mut Vec<StepRecord>, path: &[usize]) -> &'a mut Vec<StepRecord> {
        let mut current = roots;
        for &index in path {
            current = &mut current[index].children;
        }
        current
    }
}

/// Records a tree of [`StepRecord`]s around arbitrary async work.
///
/// `run_step` is a pure side channel: the wrapped future's value or error
/// is returned unchanged, whatever the recorder does around it. Recording
/// state sits behind a mutex so a recorder can be shared across helpers
/// within one test; steps themselves run sequentially.
pub struct StepRecorder {
    state: Mutex<RecorderState>,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecorderState {
                roots: Vec::new(),
                stack: Vec::new(),
            }),
            sink: None,
        }
    }

    /// Attach an artifact sink consulted when steps fail.
    pub fn with_sink(sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            state: Mutex::new(RecorderState {
                roots: Vec::new(),
                stack: Vec::new(),
            }),
            sink: Some(sink),
        }
    }

    /// Run `body` as a named step. Returns exactly what `body` returned.
    pub async fn run_step<T, E, F>(&self, name: &str, body: F) -> Result<T, E>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        self.run_step_with(StepOptions::default(), name, body).await
    }

    /// `run_step` with explicit options.
    pub async fn run_step_with<T, E, F>(
        &self,
        options: StepOptions,
        name: &str,
        body: F,
    ) -> Result<T, E>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        debug!(step = name, "step started");
        self.state.lock().open(name);

        let result = body.await;

        match &result {
            Ok(_) => {
                let artifact = if options.capture_on_success {
                    self.capture(name).await
                } else {
                    None
                };
                self.state.lock().close(StepStatus::Success, None, artifact);
                info!(step = name, "step succeeded");
            }
            Err(err) => {
                let artifact = self.capture(name).await;
                self.state
                    .lock()
                    .close(StepStatus::Failure, Some(err.to_string()), artifact);
                warn!(step = name, error = %err, "step failed");
            }
        }

        result
    }

    /// Step wrapper for bodies that cannot fail.
    pub async fn run_step_ok<T, F>(&self, name: &str, body: F) -> T
    where
        F: Future<Output = T>,
    {
        debug!(step = name, "step started");
        self.state.lock().open(name);
        let value = body.await;
        self.state.lock().close(StepStatus::Success, None, None);
        info!(step = name, "step succeeded");
        value
    }

    /// Record a step that was deliberately not run.
    pub fn record_skipped(&self, name: &str) {
        let mut state = self.state.lock();
        state.open(name);
        state.close(StepStatus::Skipped, None, None);
        info!(step = name, "step skipped");
    }

    /// Capture an artifact on demand and attach it to the innermost open
    /// step, or to the last finished root when no step is open.
    pub async fn attach_artifact(&self, name: &str) {
        if let Some(path) = self.capture(name).await {
            let mut state = self.state.lock();
            if let Some(record) = state.current_mut() {
                record.artifact = Some(path);
            } else if let Some(record) = state.roots.last_mut() {
                record.artifact = Some(path);
            }
        }
    }

    async fn capture(&self, step_name: &str) -> Option<PathBuf> {
        let sink = self.sink.as_ref()?;
        match sink.capture(step_name).await {
            Ok(path) => Some(path),
            Err(err) => {
                // Capture trouble must never fail the step itself.
                warn!(step = step_name, error = %err, "artifact capture failed");
                None
            }
        }
    }

    /// Consume the recorder and hand the finished tree over.
    pub fn into_report(self) -> StepReport {
        let state = self.state.into_inner();
        StepReport { steps: state.roots }
    }
}

impl Default for StepRecorder {
    fn default() -> Self {
        Self::new()
    }
}
