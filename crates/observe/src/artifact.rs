//! Artifact capture with deterministic, step-derived file names.

use crate::errors::ObserveError;
use async_trait::async_trait;
use handrail_driver::UiDriver;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Side channel that turns a step name into a stored artifact.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Capture an artifact for the named step and return its path.
    async fn capture(&self, step_name: &str) -> Result<PathBuf, ObserveError>;
}

/// Screenshot sink writing `<ordinal>_<slug>.png` files into a configured
/// results directory. Ordinals make names unique and sortable when the
/// same step runs repeatedly.
pub struct ScreenshotSink {
    driver: Arc<dyn UiDriver>,
    results_dir: PathBuf,
    counter: AtomicU32,
}

impl ScreenshotSink {
    pub fn new(driver: Arc<dyn UiDriver>, results_dir: PathBuf) -> Self {
        Self {
            driver,
            results_dir,
            counter: AtomicU32::new(0),
        }
    }

    fn next_path(&self, step_name: &str) -> PathBuf {
        let ordinal = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.results_dir
            .join(format!("{:03}_{}.png", ordinal, slug(step_name)))
    }
}

#[async_trait]
impl ArtifactSink for ScreenshotSink {
    async fn capture(&self, step_name: &str) -> Result<PathBuf, ObserveError> {
        std::fs::create_dir_all(&self.results_dir)
            .map_err(|err| ObserveError::ResultsDir(err.to_string()))?;

        let path = self.next_path(step_name);
        self.driver
            .capture_screenshot(&path)
            .await
            .map_err(|err| ObserveError::Artifact(err.to_string()))?;

        debug!(path = %path.display(), "artifact captured");
        Ok(path)
    }
}

/// Lowercased, filesystem-safe rendering of a step name.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("step");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_deterministic_and_safe() {
        assert_eq!(slug("Open checkout / pay"), "open-checkout-pay");
        assert_eq!(slug("Open checkout / pay"), "open-checkout-pay");
        assert_eq!(slug("???"), "step");
    }

    #[test]
    fn paths_are_ordinal_prefixed() {
        struct NoopDriver;

        #[async_trait]
        impl UiDriver for NoopDriver {
            async fn probe(
                &self,
                _expr: &handrail_driver::LocatorExpr,
            ) -> Result<Option<handrail_driver::ElementProbe>, handrail_driver::DriverError>
            {
                Ok(None)
            }
            async fn tap(
                &self,
                _element: &handrail_driver::ElementRef,
            ) -> Result<(), handrail_driver::DriverError> {
                Ok(())
            }
            async fn set_value(
                &self,
                _element: &handrail_driver::ElementRef,
                _value: &str,
            ) -> Result<(), handrail_driver::DriverError> {
                Ok(())
            }
            async fn read_value(
                &self,
                _element: &handrail_driver::ElementRef,
            ) -> Result<String, handrail_driver::DriverError> {
                Ok(String::new())
            }
            async fn scroll(
                &self,
                _direction: handrail_driver::ScrollDirection,
            ) -> Result<(), handrail_driver::DriverError> {
                Ok(())
            }
            async fn press_key(
                &self,
                _key: handrail_driver::SystemKey,
            ) -> Result<(), handrail_driver::DriverError> {
                Ok(())
            }
            async fn current_surface(
                &self,
            ) -> Result<handrail_driver::SurfaceInfo, handrail_driver::DriverError> {
                unreachable!()
            }
            async fn capture_screenshot(
                &self,
                _path: &std::path::Path,
            ) -> Result<(), handrail_driver::DriverError> {
                Ok(())
            }
            async fn wait_idle(
                &self,
                _quiet: std::time::Duration,
                _timeout: std::time::Duration,
            ) -> Result<(), handrail_driver::DriverError> {
                Ok(())
            }
            async fn relaunch(&self) -> Result<(), handrail_driver::DriverError> {
                Ok(())
            }
        }

        let sink = ScreenshotSink::new(Arc::new(NoopDriver), PathBuf::from("/tmp/results"));
        assert_eq!(
            sink.next_path("Open cart"),
            PathBuf::from("/tmp/results/001_open-cart.png")
        );
        assert_eq!(
            sink.next_path("Open cart"),
            PathBuf::from("/tmp/results/002_open-cart.png")
        );
    }
}
