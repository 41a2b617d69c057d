//! Harness configuration.
//!
//! Loaded from a TOML file with environment overrides for the values that
//! differ between CI and local runs. Every field has a default, so an
//! empty file (or no file) is a valid configuration.

use anyhow::Context;
use handrail_actions::ExecutorConfig;
use handrail_discovery::DiscoveryConfig;
use handrail_recovery::RecoveryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory for screenshots and other failure artifacts.
    pub results_dir: PathBuf,

    /// Fragment the baseline surface id must contain.
    pub baseline_surface: String,

    pub timeouts: TimeoutSettings,
    pub discovery: DiscoverySettings,
    pub recovery: RecoverySettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            baseline_surface: "home".to_string(),
            timeouts: TimeoutSettings::default(),
            discovery: DiscoverySettings::default(),
            recovery: RecoverySettings::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
    pub probe_ms: u64,
    pub condition_ms: u64,
    pub poll_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            probe_ms: 1_000,
            condition_ms: 5_000,
            poll_ms: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySettings {
    pub max_iterations: u32,
    pub stagnation_limit: u32,
    pub grace_period: u32,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            stagnation_limit: 2,
            grace_period: 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecoverySettings {
    pub max_back_presses: u32,
    pub action_budget_ms: u64,
    pub settle_quiet_ms: u64,
    pub settle_timeout_ms: u64,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            max_back_presses: 3,
            action_budget_ms: 10_000,
            settle_quiet_ms: 200,
            settle_timeout_ms: 3_000,
        }
    }
}

impl HarnessConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    /// Load from a TOML file when it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.apply_env();
            Ok(config)
        }
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("HANDRAIL_RESULTS_DIR") {
            self.results_dir = PathBuf::from(dir);
        }
        if let Ok(surface) = std::env::var("HANDRAIL_BASELINE_SURFACE") {
            self.baseline_surface = surface;
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            probe_timeout: Duration::from_millis(self.timeouts.probe_ms),
            condition_timeout: Duration::from_millis(self.timeouts.condition_ms),
            poll_interval: Duration::from_millis(self.timeouts.poll_ms),
        }
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig::new(self.discovery.max_iterations, self.discovery.stagnation_limit)
            .with_grace_period(self.discovery.grace_period)
    }

    pub fn recovery_config(&self) -> RecoveryConfig {
        let mut config = RecoveryConfig::new(self.baseline_surface.clone())
            .with_max_back_presses(self.recovery.max_back_presses);
        config.action_budget = Duration::from_millis(self.recovery.action_budget_ms);
        config.settle_quiet = Duration::from_millis(self.recovery.settle_quiet_ms);
        config.settle_timeout = Duration::from_millis(self.recovery.settle_timeout_ms);
        config.executor = self.executor_config();
        config
    }
}
