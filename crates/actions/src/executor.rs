//! Action executor with ordered procedure fallback.

use crate::types::*;
use handrail_core_types::FailureKind;
use handrail_driver::{wait_until, DriverError, SystemKey, UiDriver, WaitOpts};
use handrail_locator::{ElementHandle, Resolution, SelectorResolver};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout and fallback-posture configuration.
#[derive(Clone, Copy, Debug)]
pub struct ExecutorConfig {
    /// Bounded existence probe per candidate.
    pub probe_timeout: Duration,

    /// Bounded wait for wait-for-state interactions and post-conditions.
    pub condition_timeout: Duration,

    /// Pause between condition probes.
    pub poll_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(1_000),
            condition_timeout: Duration::from_millis(5_000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ExecutorConfig {
    fn wait_opts(&self) -> WaitOpts {
        WaitOpts {
            timeout: self.condition_timeout,
            poll_interval: self.poll_interval,
        }
    }
}

/// Executes actions through an ordered fallback chain of procedures.
///
/// Partial side effects of an abandoned procedure are tolerated and never
/// rolled back; the next procedure simply starts from whatever state the
/// UI is in.
pub struct ActionExecutor {
    driver: Arc<dyn UiDriver>,
    resolver: SelectorResolver,
    config: ExecutorConfig,
}

impl ActionExecutor {
    pub fn new(driver: Arc<dyn UiDriver>, config: ExecutorConfig) -> Self {
        Self {
            resolver: SelectorResolver::new(driver.clone()),
            driver,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Attempt `procedures` strictly in order until one fully completes
    /// (resolve + interact + post-condition). Never returns an error: the
    /// outcome carries the classification and the full attempt history.
    pub async fn perform(
        &self,
        ctx: &ExecCtx,
        intent: &ActionIntent,
        procedures: &[Procedure],
    ) -> ActionOutcome {
        info!(
            action_id = %ctx.action_id.0,
            intent = %intent.name,
            procedures = procedures.len(),
            "executing action"
        );

        let mut outcome = ActionOutcome::started(intent.clone());
        let mut exhausted = true;

        for (index, procedure) in procedures.iter().enumerate() {
            if ctx.is_cancelled() {
                warn!(action_id = %ctx.action_id.0, index, "action cancelled");
                outcome.attempts.push(AttemptRecord {
                    procedure_index: index,
                    label: procedure.label.clone(),
                    failure: AttemptFailure {
                        kind: FailureKind::ActionFailed,
                        stage: AttemptStage::Interaction,
                        detail: "cancelled before attempt".to_string(),
                    },
                });
                exhausted = false;
                break;
            }

            if ctx.is_past_deadline() {
                warn!(action_id = %ctx.action_id.0, index, "action deadline exceeded");
                outcome.attempts.push(AttemptRecord {
                    procedure_index: index,
                    label: procedure.label.clone(),
                    failure: AttemptFailure {
                        kind: FailureKind::Timeout,
                        stage: AttemptStage::Interaction,
                        detail: "deadline exceeded before attempt".to_string(),
                    },
                });
                exhausted = false;
                break;
            }

            debug!(index, label = ?procedure.label, "attempting procedure");
            match self.attempt(procedure).await {
                Ok(handle) => {
                    info!(
                        action_id = %ctx.action_id.0,
                        intent = %intent.name,
                        procedure = index,
                        candidate = %handle.candidate.expr,
                        "action completed"
                    );
                    outcome.completed = Some(CompletedAttempt {
                        procedure_index: index,
                        label: procedure.label.clone(),
                        candidate: handle.candidate,
                        candidate_index: handle.candidate_index,
                    });
                    outcome.success = true;
                    return outcome.finish();
                }
                Err(failure) => {
                    warn!(
                        action_id = %ctx.action_id.0,
                        procedure = index,
                        failure = %failure,
                        "procedure abandoned"
                    );
                    outcome.attempts.push(AttemptRecord {
                        procedure_index: index,
                        label: procedure.label.clone(),
                        failure,
                    });
                }
            }
        }

        outcome.error = Some(classify_attempts(&outcome.attempts));
        warn!(
            action_id = %ctx.action_id.0,
            intent = %intent.name,
            error = ?outcome.error,
            attempts = outcome.attempts.len(),
            "action failed"
        );

        if exhausted && intent.kind == IntentKind::Navigation {
            let recovery = self.navigation_fallback(ctx).await;
            if recovery.succeeded.is_none() {
                // Not even the platform posture landed; the UI is in an
                // unknown state and only the recovery controller can help.
                outcome.error = Some(FailureKind::EnvironmentUnstable);
            }
            outcome.recovery = Some(recovery);
        }

        outcome.finish()
    }

    /// Run one procedure end to end. Abandoned at the first resolution,
    /// interaction, or post-condition failure.
    async fn attempt(&self, procedure: &Procedure) -> Result<ElementHandle, AttemptFailure> {
        let resolution = self
            .resolver
            .resolve(
                &procedure.candidates,
                procedure.readiness.as_ref(),
                self.config.probe_timeout,
            )
            .await
            .map_err(|err| AttemptFailure {
                kind: FailureKind::ActionFailed,
                stage: AttemptStage::Resolution,
                detail: err.to_string(),
            })?;

        let handle = match resolution {
            Resolution::Found { handle, .. } => handle,
            Resolution::NotFound { attempted } => {
                let tried: Vec<String> = attempted.iter().map(|c| c.expr.to_string()).collect();
                return Err(AttemptFailure {
                    kind: FailureKind::NotFound,
                    stage: AttemptStage::Resolution,
                    detail: format!("no candidate matched: [{}]", tried.join(", ")),
                });
            }
        };

        self.interact(procedure, &handle).await?;
        self.check_post(&procedure.post, &handle).await?;
        Ok(handle)
    }

    async fn interact(
        &self,
        procedure: &Procedure,
        handle: &ElementHandle,
    ) -> Result<(), AttemptFailure> {
        match &procedure.interaction {
            Interaction::Tap => self
                .driver
                .tap(&handle.element)
                .await
                .map_err(|err| interaction_failure(err)),

            Interaction::SetValue(value) => self
                .driver
                .set_value(&handle.element, value)
                .await
                .map_err(|err| interaction_failure(err)),

            Interaction::WaitForState(readiness) => {
                let expr = handle.candidate.expr.clone();
                let driver = self.driver.clone();
                let outcome = wait_until(self.config.wait_opts(), move || {
                    let expr = expr.clone();
                    let driver = driver.clone();
                    let readiness = readiness.clone();
                    async move {
                        Ok(driver
                            .probe(&expr)
                            .await?
                            .map(|probe| readiness.holds(&probe))
                            .unwrap_or(false))
                    }
                })
                .await;

                if outcome.satisfied {
                    Ok(())
                } else {
                    Err(AttemptFailure {
                        kind: FailureKind::Timeout,
                        stage: AttemptStage::Interaction,
                        detail: format!(
                            "element never reached state within {}ms",
                            self.config.condition_timeout.as_millis()
                        ),
                    })
                }
            }
        }
    }

    async fn check_post(
        &self,
        post: &PostCondition,
        handle: &ElementHandle,
    ) -> Result<(), AttemptFailure> {
        let satisfied = match post {
            PostCondition::None => return Ok(()),

            PostCondition::ValueIs(expected) => {
                let driver = self.driver.clone();
                let element = handle.element.clone();
                let expected = expected.clone();
                wait_until(self.config.wait_opts(), move || {
                    let driver = driver.clone();
                    let element = element.clone();
                    let expected = expected.clone();
                    async move { Ok(driver.read_value(&element).await? == expected) }
                })
                .await
                .satisfied
            }

            PostCondition::ElementPresent(table) => {
                self.wait_for_table(table, true).await?
            }

            PostCondition::ElementGone(table) => self.wait_for_table(table, false).await?,

            PostCondition::SurfaceContains(fragment) => {
                let driver = self.driver.clone();
                let fragment = fragment.clone();
                wait_until(self.config.wait_opts(), move || {
                    let driver = driver.clone();
                    let fragment = fragment.clone();
                    async move { Ok(driver.current_surface().await?.id.contains(&fragment)) }
                })
                .await
                .satisfied
            }
        };

        if satisfied {
            Ok(())
        } else {
            Err(AttemptFailure {
                kind: FailureKind::Timeout,
                stage: AttemptStage::PostCondition,
                detail: format!(
                    "post-condition not satisfied within {}ms",
                    self.config.condition_timeout.as_millis()
                ),
            })
        }
    }

    /// Wait for a candidate table to become resolvable (or to stop being
    /// resolvable, with `want_present = false`).
    async fn wait_for_table(
        &self,
        table: &[handrail_locator::LocatorCandidate],
        want_present: bool,
    ) -> Result<bool, AttemptFailure> {
        // Surface malformed tables immediately instead of polling them
        // until the budget runs out.
        let first = self
            .resolver
            .resolve(table, None, self.config.probe_timeout)
            .await
            .map_err(|err| AttemptFailure {
                kind: FailureKind::ActionFailed,
                stage: AttemptStage::PostCondition,
                detail: err.to_string(),
            })?;

        if first.is_found() == want_present {
            return Ok(true);
        }

        let resolver = &self.resolver;
        let probe_timeout = self.config.probe_timeout;
        let outcome = wait_until(self.config.wait_opts(), move || async move {
            match resolver.resolve(table, None, probe_timeout).await {
                Ok(resolution) => Ok(resolution.is_found() == want_present),
                Err(_) => Ok(false),
            }
        })
        .await;

        Ok(outcome.satisfied)
    }

    /// Fallback posture for exhausted navigation intents: platform back
    /// key, then home, then a full relaunch, so subsequent operations
    /// still start from a known state.
    async fn navigation_fallback(&self, ctx: &ExecCtx) -> NavigationRecovery {
        let mut recovery = NavigationRecovery::default();

        recovery.attempted.push(FallbackPosture::BackKey);
        match self.driver.press_key(SystemKey::Back).await {
            Ok(()) => {
                info!(action_id = %ctx.action_id.0, "navigation fallback: back key");
                recovery.succeeded = Some(FallbackPosture::BackKey);
                return recovery;
            }
            Err(err) => warn!(error = %err, "back key failed"),
        }

        recovery.attempted.push(FallbackPosture::HomeKey);
        match self.driver.press_key(SystemKey::Home).await {
            Ok(()) => {
                info!(action_id = %ctx.action_id.0, "navigation fallback: home key");
                recovery.succeeded = Some(FallbackPosture::HomeKey);
                return recovery;
            }
            Err(err) => warn!(error = %err, "home key failed"),
        }

        recovery.attempted.push(FallbackPosture::Relaunch);
        match self.driver.relaunch().await {
            Ok(()) => {
                info!(action_id = %ctx.action_id.0, "navigation fallback: relaunch");
                recovery.succeeded = Some(FallbackPosture::Relaunch);
            }
            Err(err) => warn!(error = %err, "relaunch failed, UI state is undefined"),
        }

        recovery
    }
}

fn interaction_failure(err: DriverError) -> AttemptFailure {
    let kind = match err {
        DriverError::WaitTimeout(_) => FailureKind::Timeout,
        _ => FailureKind::ActionFailed,
    };
    AttemptFailure {
        kind,
        stage: AttemptStage::Interaction,
        detail: err.to_string(),
    }
}

/// Terminal classification: the shared kind when every attempt failed the
/// same way, otherwise the generic `ActionFailed`.
fn classify_attempts(attempts: &[AttemptRecord]) -> FailureKind {
    let mut kinds = attempts.iter().map(|a| a.failure.kind);
    match kinds.next() {
        Some(first) if kinds.all(|k| k == first) => first,
        _ => FailureKind::ActionFailed,
    }
}
