//! Tiered return-to-baseline controller.

use handrail_actions::{ActionExecutor, ActionIntent, ExecCtx, ExecutorConfig, Procedure};
use handrail_core_types::SessionRoute;
use handrail_driver::{SystemKey, UiDriver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Recovery policy knobs.
#[derive(Clone, Debug)]
pub struct RecoveryConfig {
    /// Fragment the baseline surface id must contain.
    pub baseline_surface: String,

    /// Cap on back presses before escalating to relaunch.
    pub max_back_presses: u32,

    /// Overall budget for the baseline-action tier.
    pub action_budget: Duration,

    /// Quiet period and bound for post-transition idle waits.
    pub settle_quiet: Duration,
    pub settle_timeout: Duration,

    pub executor: ExecutorConfig,
}

impl RecoveryConfig {
    pub fn new(baseline_surface: impl Into<String>) -> Self {
        Self {
            baseline_surface: baseline_surface.into(),
            max_back_presses: 3,
            action_budget: Duration::from_secs(10),
            settle_quiet: Duration::from_millis(200),
            settle_timeout: Duration::from_secs(3),
            executor: ExecutorConfig::default(),
        }
    }

    pub fn with_max_back_presses(mut self, cap: u32) -> Self {
        self.max_back_presses = cap;
        self
    }
}

/// Which tier brought the session back, for logs and reports. Purely
/// informational; callers proceed the same way whatever the value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RecoveryOutcome {
    /// Already on the baseline surface; nothing was done.
    AlreadyKnown,

    /// The configured baseline procedures completed.
    BaselineAction,

    /// Repeated back presses reached the baseline.
    BackNavigation { presses: u32 },

    /// Terminate-and-relaunch reached the baseline.
    Relaunched,

    /// Every tier was exhausted without reaching the baseline.
    Failed,
}

/// Drives the session back to a known baseline between tests.
///
/// `ensure_known_state` never errors and has no preconditions, so teardown
/// paths can call it unconditionally, including after cancellation. Calling
/// it on a session already at baseline performs no driver writes.
pub struct StateRecoveryController {
    driver: Arc<dyn UiDriver>,
    executor: ActionExecutor,
    route: SessionRoute,
    baseline: Vec<Procedure>,
    config: RecoveryConfig,
}

impl StateRecoveryController {
    pub fn new(
        driver: Arc<dyn UiDriver>,
        route: SessionRoute,
        baseline: Vec<Procedure>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            executor: ActionExecutor::new(driver.clone(), config.executor),
            driver,
            route,
            baseline,
            config,
        }
    }

    /// Walk the recovery tiers until the baseline surface is reached:
    /// baseline procedures, capped back presses, relaunch.
    pub async fn ensure_known_state(&self) -> RecoveryOutcome {
        if self.on_baseline().await {
            debug!(baseline = %self.config.baseline_surface, "already on baseline");
            return RecoveryOutcome::AlreadyKnown;
        }

        if self.try_baseline_action().await {
            info!("recovered via baseline action");
            return RecoveryOutcome::BaselineAction;
        }

        if let Some(presses) = self.try_back_navigation().await {
            info!(presses, "recovered via back navigation");
            return RecoveryOutcome::BackNavigation { presses };
        }

        if self.try_relaunch().await {
            info!("recovered via relaunch");
            return RecoveryOutcome::Relaunched;
        }

        warn!(
            baseline = %self.config.baseline_surface,
            "all recovery tiers exhausted"
        );
        RecoveryOutcome::Failed
    }

    async fn try_baseline_action(&self) -> bool {
        if self.baseline.is_empty() {
            return false;
        }

        // Standard intent: this controller owns the escalation ladder, the
        // executor must not run its own navigation posture underneath it.
        let intent = ActionIntent::standard("recover-to-baseline");
        let ctx = ExecCtx::new(
            self.route.clone(),
            Instant::now() + self.config.action_budget,
            CancellationToken::new(),
        );

        let outcome = self.executor.perform(&ctx, &intent, &self.baseline).await;
        if !outcome.success {
            debug!(attempts = outcome.attempts.len(), "baseline action failed");
            return false;
        }

        self.settle().await;
        self.on_baseline().await
    }

    async fn try_back_navigation(&self) -> Option<u32> {
        for press in 1..=self.config.max_back_presses {
            if self.driver.press_key(SystemKey::Back).await.is_err() {
                warn!(press, "back press failed");
                return None;
            }
            self.settle().await;
            if self.on_baseline().await {
                return Some(press);
            }
        }
        debug!(cap = self.config.max_back_presses, "back presses exhausted");
        None
    }

    async fn try_relaunch(&self) -> bool {
        if let Err(err) = self.driver.relaunch().await {
            warn!(error = %err, "relaunch failed");
            return false;
        }
        self.settle().await;
        self.on_baseline().await
    }

    async fn settle(&self) {
        if let Err(err) = self
            .driver
            .wait_idle(self.config.settle_quiet, self.config.settle_timeout)
            .await
        {
            debug!(error = %err, "idle wait did not settle");
        }
    }

    async fn on_baseline(&self) -> bool {
        match self.driver.current_surface().await {
            Ok(surface) => surface.id.contains(&self.config.baseline_surface),
            Err(err) => {
                warn!(error = %err, "surface check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use handrail_actions::{Interaction, PostCondition};
    use handrail_core_types::{Platform, SessionId};
    use handrail_driver::{
        DriverError, ElementProbe, ElementRef, LocatorExpr, ScrollDirection, SurfaceInfo,
    };
    use handrail_locator::LocatorCandidate;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StackDriver {
        surface: Mutex<String>,
        /// Surfaces revealed by successive back presses, front first.
        back_stack: Mutex<Vec<String>>,
        present: HashSet<String>,
        tap_navigates_to: HashMap<String, String>,
        relaunch_surface: Option<String>,
        taps: AtomicU32,
        back_presses: AtomicU32,
        relaunches: AtomicU32,
    }

    impl StackDriver {
        fn on(surface: &str) -> Self {
            Self {
                surface: Mutex::new(surface.to_string()),
                back_stack: Mutex::new(Vec::new()),
                present: HashSet::new(),
                tap_navigates_to: HashMap::new(),
                relaunch_surface: None,
                taps: AtomicU32::new(0),
                back_presses: AtomicU32::new(0),
                relaunches: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl UiDriver for StackDriver {
        async fn probe(
            &self,
            expr: &LocatorExpr,
        ) -> Result<Option<ElementProbe>, DriverError> {
            if self.present.contains(&expr.query) {
                Ok(Some(ElementProbe::new(ElementRef(format!(
                    "el:{}",
                    expr.query
                )))))
            } else {
                Ok(None)
            }
        }

        async fn tap(&self, element: &ElementRef) -> Result<(), DriverError> {
            self.taps.fetch_add(1, Ordering::SeqCst);
            if let Some(next) = self.tap_navigates_to.get(&element.0) {
                *self.surface.lock() = next.clone();
            }
            Ok(())
        }

        async fn set_value(&self, _element: &ElementRef, _value: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn read_value(&self, _element: &ElementRef) -> Result<String, DriverError> {
            Ok(String::new())
        }

        async fn scroll(&self, _direction: ScrollDirection) -> Result<(), DriverError> {
            Ok(())
        }

        async fn press_key(&self, key: SystemKey) -> Result<(), DriverError> {
            if key == SystemKey::Back {
                self.back_presses.fetch_add(1, Ordering::SeqCst);
                let mut stack = self.back_stack.lock();
                if !stack.is_empty() {
                    *self.surface.lock() = stack.remove(0);
                }
            }
            Ok(())
        }

        async fn current_surface(&self) -> Result<SurfaceInfo, DriverError> {
            Ok(SurfaceInfo::new(self.surface.lock().clone()))
        }

        async fn capture_screenshot(&self, _path: &Path) -> Result<(), DriverError> {
            Ok(())
        }

        async fn wait_idle(
            &self,
            _quiet: Duration,
            _timeout: Duration,
        ) -> Result<(), DriverError> {
            Ok(())
        }

        async fn relaunch(&self) -> Result<(), DriverError> {
            self.relaunches.fetch_add(1, Ordering::SeqCst);
            if let Some(surface) = &self.relaunch_surface {
                *self.surface.lock() = surface.clone();
            }
            Ok(())
        }
    }

    fn route() -> SessionRoute {
        SessionRoute::new(SessionId::new(), Platform::Mobile)
    }

    fn fast_config() -> RecoveryConfig {
        let mut config = RecoveryConfig::new("app/home");
        config.executor = ExecutorConfig {
            probe_timeout: Duration::from_millis(100),
            condition_timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(10),
        };
        config.settle_quiet = Duration::from_millis(1);
        config.settle_timeout = Duration::from_millis(5);
        config
    }

    fn home_procedure() -> Procedure {
        Procedure::new(
            vec![LocatorCandidate::clickable(LocatorExpr::mobile("~home-tab"))],
            Interaction::Tap,
        )
        .with_post(PostCondition::SurfaceContains("app/home".into()))
    }

    #[tokio::test]
    async fn short_circuits_when_already_on_baseline() {
        let driver = Arc::new(StackDriver::on("app/home"));
        let controller = StateRecoveryController::new(
            driver.clone(),
            route(),
            vec![home_procedure()],
            fast_config(),
        );

        assert_eq!(
            controller.ensure_known_state().await,
            RecoveryOutcome::AlreadyKnown
        );
        assert_eq!(driver.taps.load(Ordering::SeqCst), 0);
        assert_eq!(driver.back_presses.load(Ordering::SeqCst), 0);
        assert_eq!(driver.relaunches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_calls_are_idempotent() {
        let mut scripted = StackDriver::on("app/detail");
        scripted.present.insert("~home-tab".into());
        scripted
            .tap_navigates_to
            .insert("el:~home-tab".into(), "app/home".into());
        let driver = Arc::new(scripted);
        let controller = StateRecoveryController::new(
            driver.clone(),
            route(),
            vec![home_procedure()],
            fast_config(),
        );

        assert_eq!(
            controller.ensure_known_state().await,
            RecoveryOutcome::BaselineAction
        );
        let taps_after_first = driver.taps.load(Ordering::SeqCst);

        assert_eq!(
            controller.ensure_known_state().await,
            RecoveryOutcome::AlreadyKnown
        );
        assert_eq!(driver.taps.load(Ordering::SeqCst), taps_after_first);
    }

    #[tokio::test]
    async fn falls_back_to_back_navigation() {
        let mut scripted = StackDriver::on("app/detail");
        *scripted.back_stack.get_mut() = vec!["app/list".into(), "app/home".into()];
        let driver = Arc::new(scripted);
        let controller = StateRecoveryController::new(
            driver.clone(),
            route(),
            vec![home_procedure()],
            fast_config(),
        );

        assert_eq!(
            controller.ensure_known_state().await,
            RecoveryOutcome::BackNavigation { presses: 2 }
        );
        assert_eq!(driver.back_presses.load(Ordering::SeqCst), 2);
        assert_eq!(driver.relaunches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn escalates_to_relaunch_after_back_press_cap() {
        let mut scripted = StackDriver::on("app/deeply/nested");
        scripted.relaunch_surface = Some("app/home".into());
        let driver = Arc::new(scripted);
        let controller =
            StateRecoveryController::new(driver.clone(), route(), Vec::new(), fast_config());

        assert_eq!(
            controller.ensure_known_state().await,
            RecoveryOutcome::Relaunched
        );
        assert_eq!(driver.back_presses.load(Ordering::SeqCst), 3);
        assert_eq!(driver.relaunches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reports_failure_when_every_tier_misses() {
        let driver = Arc::new(StackDriver::on("app/stuck"));
        let controller =
            StateRecoveryController::new(driver.clone(), route(), Vec::new(), fast_config());

        assert_eq!(
            controller.ensure_known_state().await,
            RecoveryOutcome::Failed
        );
        assert_eq!(driver.relaunches.load(Ordering::SeqCst), 1);
    }
}
