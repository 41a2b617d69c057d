//! Per-session wiring of the component stack.

use crate::config::HarnessConfig;
use handrail_actions::{ActionExecutor, ActionIntent, ActionOutcome, ExecCtx, Procedure};
use handrail_core_types::{FailureKind, Platform, SessionId, SessionRoute};
use handrail_discovery::{DiscoveredItem, DiscoveryError, DiscoveryLoop, DiscoverySource};
use handrail_driver::UiDriver;
use handrail_locator::{LocatorCandidate, LocatorError, Readiness, Resolution, SelectorResolver};
use handrail_observe::{ScreenshotSink, StepRecorder, StepReport};
use handrail_recovery::{RecoveryOutcome, StateRecoveryController};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Step-level rendering of an exhausted fallback chain. Names every
/// abandoned procedure in attempt order.
struct ExhaustedAction {
    kind: FailureKind,
    outcome: ActionOutcome,
}

impl From<ActionOutcome> for ExhaustedAction {
    fn from(outcome: ActionOutcome) -> Self {
        Self {
            kind: outcome.error.unwrap_or(FailureKind::ActionFailed),
            outcome,
        }
    }
}

impl fmt::Display for ExhaustedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.kind)?;
        for attempt in &self.outcome.attempts {
            write!(
                f,
                " [{} {}]",
                attempt.label.as_deref().unwrap_or("unlabeled"),
                attempt.failure
            )?;
        }
        Ok(())
    }
}

/// One test worker's view of a driver session: resolver, executor, step
/// recorder and recovery controller wired to the same driver, sharing one
/// configuration. Owns its components exclusively; independent workers
/// build independent harnesses.
pub struct Harness {
    driver: Arc<dyn UiDriver>,
    route: SessionRoute,
    resolver: SelectorResolver,
    executor: ActionExecutor,
    recorder: StepRecorder,
    recovery: StateRecoveryController,
    cancel_token: CancellationToken,
    config: HarnessConfig,
}

impl Harness {
    /// Wire a full stack around `driver`. `baseline` is the procedure chain
    /// the recovery controller tries first when returning to a known state.
    pub fn new(
        driver: Arc<dyn UiDriver>,
        platform: Platform,
        baseline: Vec<Procedure>,
        config: HarnessConfig,
    ) -> Self {
        let route = SessionRoute::new(SessionId::new(), platform);
        let sink = Arc::new(ScreenshotSink::new(
            driver.clone(),
            config.results_dir.clone(),
        ));

        info!(route = %route, "harness created");

        Self {
            resolver: SelectorResolver::new(driver.clone()),
            executor: ActionExecutor::new(driver.clone(), config.executor_config()),
            recorder: StepRecorder::with_sink(sink),
            recovery: StateRecoveryController::new(
                driver.clone(),
                route.clone(),
                baseline,
                config.recovery_config(),
            ),
            cancel_token: CancellationToken::new(),
            driver,
            route,
            config,
        }
    }

    pub fn route(&self) -> &SessionRoute {
        &self.route
    }

    pub fn driver(&self) -> &Arc<dyn UiDriver> {
        &self.driver
    }

    pub fn recorder(&self) -> &StepRecorder {
        &self.recorder
    }

    /// Token observed by every context this harness creates. Cancelling it
    /// stops in-flight fallback chains cooperatively.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Fresh execution context with the given overall budget.
    pub fn ctx(&self, budget: Duration) -> ExecCtx {
        ExecCtx::new(
            self.route.clone(),
            Instant::now() + budget,
            self.cancel_token.clone(),
        )
    }

    /// Side-effect-free lookup against the current UI snapshot.
    pub async fn resolve(
        &self,
        candidates: &[LocatorCandidate],
        readiness: Option<&Readiness>,
    ) -> Result<Resolution, LocatorError> {
        self.resolver
            .resolve(candidates, readiness, self.config.executor_config().probe_timeout)
            .await
    }

    /// Run an action through its fallback chain as a recorded step. The
    /// step is named after the intent and marked failed (with an artifact)
    /// when the chain is exhausted; the outcome is returned either way.
    pub async fn act(
        &self,
        ctx: &ExecCtx,
        intent: ActionIntent,
        procedures: &[Procedure],
    ) -> ActionOutcome {
        let name = intent.name.clone();
        let result = self
            .recorder
            .run_step(&name, async {
                let outcome = self.executor.perform(ctx, &intent, procedures).await;
                if outcome.success {
                    Ok(outcome)
                } else {
                    Err(ExhaustedAction::from(outcome))
                }
            })
            .await;

        match result {
            Ok(outcome) => outcome,
            Err(exhausted) => exhausted.outcome,
        }
    }

    /// Run a discovery session with the configured termination policy.
    pub async fn discover<S: DiscoverySource>(
        &self,
        source: &mut S,
    ) -> Result<Vec<DiscoveredItem>, DiscoveryError> {
        let discovery = DiscoveryLoop::new(self.config.discovery_config())?;
        Ok(discovery.run(source).await)
    }

    /// Return the session to its baseline and hand the step tree over.
    /// Callable on every exit path, including after cancellation.
    pub async fn teardown(self) -> (RecoveryOutcome, StepReport) {
        let recovered = self.recovery.ensure_known_state().await;
        info!(outcome = ?recovered, "harness teardown");
        (recovered, self.recorder.into_report())
    }

    /// Recovery without consuming the harness, for mid-test use after an
    /// exhausted chain left the UI in an unknown state.
    pub async fn ensure_known_state(&self) -> RecoveryOutcome {
        self.recovery.ensure_known_state().await
    }
}
