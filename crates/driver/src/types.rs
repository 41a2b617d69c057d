//! Wire-level types exchanged with the driver session.

use handrail_core_types::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A platform-specific locator expression: an accessibility-tree query for
/// mobile sessions, a DOM/text selector for web sessions.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LocatorExpr {
    pub platform: Platform,
    pub query: String,
}

impl LocatorExpr {
    pub fn mobile(query: impl Into<String>) -> Self {
        Self {
            platform: Platform::Mobile,
            query: query.into(),
        }
    }

    pub fn web(query: impl Into<String>) -> Self {
        Self {
            platform: Platform::Web,
            query: query.into(),
        }
    }
}

impl fmt::Display for LocatorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.platform {
            Platform::Mobile => write!(f, "ax:{}", self.query),
            Platform::Web => write!(f, "dom:{}", self.query),
        }
    }
}

/// Opaque driver-scoped reference to a resolved element. Valid only until
/// the UI re-renders; never cache across separate actions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ElementRef(pub String);

/// Snapshot of an element's interaction state at probe time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementProbe {
    pub element: ElementRef,

    pub visible: bool,

    pub enabled: bool,

    /// Visible, enabled and not obscured by another element.
    pub clickable: bool,

    /// Visible text or label, when the driver can report one.
    pub text: Option<String>,
}

impl ElementProbe {
    pub fn new(element: ElementRef) -> Self {
        Self {
            element,
            visible: true,
            enabled: true,
            clickable: true,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Identity of the foreground screen or page.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInfo {
    /// App activity name or page URL.
    pub id: String,

    /// Human-readable surface title, when available.
    pub title: Option<String>,
}

impl SurfaceInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }
}

/// OS-level key events used by navigation fallback and state recovery.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SystemKey {
    Back,
    Home,
}

/// Scroll gesture direction for content discovery.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ScrollDirection {
    Down,
    Up,
    Left,
    Right,
}

impl Default for ScrollDirection {
    fn default() -> Self {
        ScrollDirection::Down
    }
}
