//! Candidate-table resolver with ordered fallback.

use crate::{errors::LocatorError, types::*};
use handrail_driver::UiDriver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves ordered candidate tables against the current UI snapshot.
///
/// Side-effect free: probing never taps, scrolls or otherwise disturbs the
/// UI, so callers may resolve as often as they like.
pub struct SelectorResolver {
    driver: Arc<dyn UiDriver>,
}

impl SelectorResolver {
    pub fn new(driver: Arc<dyn UiDriver>) -> Self {
        Self { driver }
    }

    /// Resolve the first candidate that exists and satisfies `readiness`.
    ///
    /// Candidates are evaluated strictly in table order with a bounded
    /// existence probe each; a probe that errors or exceeds `probe_timeout`
    /// counts as a miss and the next candidate is tried. Total exhaustion
    /// yields [`Resolution::NotFound`] carrying every attempted candidate.
    pub async fn resolve(
        &self,
        candidates: &[LocatorCandidate],
        readiness: Option<&Readiness>,
        probe_timeout: Duration,
    ) -> Result<Resolution, LocatorError> {
        self.validate(candidates)?;

        let mut missed: Vec<LocatorCandidate> = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            debug!(index, expr = %candidate.expr, "probing candidate");

            let probed =
                match tokio::time::timeout(probe_timeout, self.driver.probe(&candidate.expr))
                    .await
                {
                    Ok(Ok(probed)) => probed,
                    Ok(Err(err)) => {
                        warn!(index, expr = %candidate.expr, error = %err, "probe failed");
                        missed.push(candidate.clone());
                        continue;
                    }
                    Err(_) => {
                        warn!(
                            index,
                            expr = %candidate.expr,
                            timeout_ms = probe_timeout.as_millis() as u64,
                            "probe timed out"
                        );
                        missed.push(candidate.clone());
                        continue;
                    }
                };

            let Some(probe) = probed else {
                debug!(index, expr = %candidate.expr, "candidate absent");
                missed.push(candidate.clone());
                continue;
            };

            if let Some(predicate) = readiness {
                if !predicate.holds(&probe) {
                    debug!(index, expr = %candidate.expr, "candidate present but not ready");
                    missed.push(candidate.clone());
                    continue;
                }
            }

            info!(index, expr = %candidate.expr, "resolved element");
            return Ok(Resolution::Found {
                handle: ElementHandle {
                    element: probe.element,
                    candidate: candidate.clone(),
                    candidate_index: index,
                    text: probe.text,
                },
                missed,
            });
        }

        debug!(attempted = candidates.len(), "all candidates exhausted");
        Ok(Resolution::NotFound { attempted: missed })
    }

    /// Resolve the first table that yields a match, in table order.
    ///
    /// Convenience for screens with several equivalent entry points (e.g.
    /// a menu reachable through an icon or an overflow list).
    pub async fn resolve_first_present(
        &self,
        tables: &[&[LocatorCandidate]],
        readiness: Option<&Readiness>,
        probe_timeout: Duration,
    ) -> Result<Resolution, LocatorError> {
        let mut attempted: Vec<LocatorCandidate> = Vec::new();

        for table in tables {
            match self.resolve(table, readiness, probe_timeout).await? {
                Resolution::Found { handle, missed } => {
                    attempted.extend(missed);
                    return Ok(Resolution::Found {
                        handle,
                        missed: attempted,
                    });
                }
                Resolution::NotFound { attempted: misses } => attempted.extend(misses),
            }
        }

        Ok(Resolution::NotFound { attempted })
    }

    fn validate(&self, candidates: &[LocatorCandidate]) -> Result<(), LocatorError> {
        if candidates.is_empty() {
            return Err(LocatorError::EmptyCandidateList(
                "candidate table has no entries".to_string(),
            ));
        }

        for (index, candidate) in candidates.iter().enumerate() {
            if candidate.expr.query.trim().is_empty() {
                return Err(LocatorError::InvalidCandidate {
                    index,
                    reason: "empty locator query".to_string(),
                });
            }
        }

        Ok(())
    }
}
