//! UI driver session capability.
//!
//! The driver is an external collaborator injected into every Handrail
//! component. It exposes the small command surface the interaction layer
//! needs (probe, tap, set value, key events, screenshot, idle wait,
//! relaunch) and nothing else; concrete Appium/WebDriver/CDP sessions
//! implement [`UiDriver`] outside this workspace.

pub mod errors;
pub mod types;
pub mod wait;

pub use errors::DriverError;
pub use types::{
    ElementProbe, ElementRef, LocatorExpr, ScrollDirection, SurfaceInfo, SystemKey,
};
pub use wait::{wait_until, WaitOpts, WaitOutcome};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Capability trait for one UI driver session.
///
/// Commands are awaited to completion before the next is issued; the
/// session is not safe for concurrent in-flight commands.
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// Bounded existence probe: returns the element and its interaction
    /// state if the expression currently matches, `None` otherwise.
    /// Probes look at the current snapshot and must not long-wait.
    async fn probe(&self, expr: &LocatorExpr) -> Result<Option<ElementProbe>, DriverError>;

    /// Tap / click a previously probed element.
    async fn tap(&self, element: &ElementRef) -> Result<(), DriverError>;

    /// Replace the value of an input element.
    async fn set_value(&self, element: &ElementRef, value: &str) -> Result<(), DriverError>;

    /// Read the current value (or visible text) of an element.
    async fn read_value(&self, element: &ElementRef) -> Result<String, DriverError>;

    /// Scroll the active viewport to reveal more content.
    async fn scroll(&self, direction: ScrollDirection) -> Result<(), DriverError>;

    /// Send an OS-level key event (back / home).
    async fn press_key(&self, key: SystemKey) -> Result<(), DriverError>;

    /// Identity of the app screen or page currently in the foreground.
    async fn current_surface(&self) -> Result<SurfaceInfo, DriverError>;

    /// Write a screenshot of the current UI to `path`.
    async fn capture_screenshot(&self, path: &Path) -> Result<(), DriverError>;

    /// Wait until the UI has been network/render quiet for `quiet`,
    /// giving up after `timeout`.
    async fn wait_idle(&self, quiet: Duration, timeout: Duration) -> Result<(), DriverError>;

    /// Terminate and relaunch the target application or browser context.
    async fn relaunch(&self) -> Result<(), DriverError>;
}
