//! Step record tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum StepStatus {
    Success,
    Failure,
    Skipped,
}

/// One instrumented step. `finished_at >= started_at` always holds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    pub status: StepStatus,

    /// Error rendering when the step failed.
    pub error: Option<String>,

    /// Path of the captured artifact, when one was taken.
    pub artifact: Option<PathBuf>,

    pub children: Vec<StepRecord>,
}

impl StepRecord {
    pub(crate) fn pending(name: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            status: StepStatus::Skipped,
            error: None,
            artifact: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn finish(&mut self, status: StepStatus, error: Option<String>) {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self.status = status;
        self.error = error;
    }
}

/// The finished tree for one test, handed to the reporting collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepReport {
    pub steps: Vec<StepRecord>,
}

impl StepReport {
    /// Whether any step in the tree failed.
    pub fn has_failures(&self) -> bool {
        fn any_failed(records: &[StepRecord]) -> bool {
            records
                .iter()
                .any(|r| r.status == StepStatus::Failure || any_failed(&r.children))
        }
        any_failed(&self.steps)
    }

    /// Deepest-last path of the most recent captured artifact, for failure
    /// output.
    pub fn last_artifact(&self) -> Option<&PathBuf> {
        fn walk<'a>(records: &'a [StepRecord], found: &mut Option<&'a PathBuf>) {
            for record in records {
                if let Some(path) = &record.artifact {
                    *found = Some(path);
                }
                walk(&record.children, found);
            }
        }
        let mut found = None;
        walk(&self.steps, &mut found);
        found
    }
}
