//! Core types for candidate-table resolution.

use handrail_driver::{ElementProbe, ElementRef, LocatorExpr};
use serde::{Deserialize, Serialize};

/// What kind of element a candidate is expected to match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TargetKind {
    Clickable,
    Text,
    Container,
    Input,
}

/// One entry of an ordered candidate table. Priority is the entry's
/// position in the table; tables are immutable per call and always
/// evaluated in list order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LocatorCandidate {
    pub expr: LocatorExpr,
    pub kind: TargetKind,
}

impl LocatorCandidate {
    pub fn new(expr: LocatorExpr, kind: TargetKind) -> Self {
        Self { expr, kind }
    }

    pub fn clickable(expr: LocatorExpr) -> Self {
        Self::new(expr, TargetKind::Clickable)
    }

    pub fn text(expr: LocatorExpr) -> Self {
        Self::new(expr, TargetKind::Text)
    }

    pub fn input(expr: LocatorExpr) -> Self {
        Self::new(expr, TargetKind::Input)
    }
}

/// Readiness predicate verified on top of bare existence.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Readiness {
    /// Existence alone is enough.
    Exists,

    Visible,

    Enabled,

    /// Visible, enabled and not obscured.
    Clickable,

    /// Every listed predicate must hold.
    All(Vec<Readiness>),
}

impl Readiness {
    /// Evaluate against a probe snapshot.
    pub fn holds(&self, probe: &ElementProbe) -> bool {
        match self {
            Readiness::Exists => true,
            Readiness::Visible => probe.visible,
            Readiness::Enabled => probe.enabled,
            Readiness::Clickable => probe.clickable,
            Readiness::All(parts) => parts.iter().all(|p| p.holds(probe)),
        }
    }

    /// Compose with another predicate.
    pub fn and(self, other: Readiness) -> Readiness {
        match self {
            Readiness::All(mut parts) => {
                parts.push(other);
                Readiness::All(parts)
            }
            first => Readiness::All(vec![first, other]),
        }
    }
}

/// Ephemeral reference to a resolved element plus the candidate that
/// produced it. Never cached across separate actions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementHandle {
    pub element: ElementRef,

    /// The candidate that matched.
    pub candidate: LocatorCandidate,

    /// Position of the matching candidate in its table.
    pub candidate_index: usize,

    /// Visible text at probe time, when the driver reported one.
    pub text: Option<String>,
}

/// Outcome of a resolution attempt. Absence is an expected, cheap-to-handle
/// outcome, so `NotFound` is a value rather than an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Resolution {
    Found {
        handle: ElementHandle,

        /// Candidates tried and missed before the match, for diagnostics.
        missed: Vec<LocatorCandidate>,
    },

    NotFound {
        /// Every candidate attempted, in table order.
        attempted: Vec<LocatorCandidate>,
    },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    pub fn handle(&self) -> Option<&ElementHandle> {
        match self {
            Resolution::Found { handle, .. } => Some(handle),
            Resolution::NotFound { .. } => None,
        }
    }

    /// Candidates that were tried without matching.
    pub fn attempted(&self) -> &[LocatorCandidate] {
        match self {
            Resolution::Found { missed, .. } => missed,
            Resolution::NotFound { attempted } => attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handrail_driver::LocatorExpr;

    fn probe(visible: bool, enabled: bool, clickable: bool) -> ElementProbe {
        ElementProbe {
            element: ElementRef("e".into()),
            visible,
            enabled,
            clickable,
            text: None,
        }
    }

    #[test]
    fn readiness_predicates() {
        let p = probe(true, false, false);
        assert!(Readiness::Exists.holds(&p));
        assert!(Readiness::Visible.holds(&p));
        assert!(!Readiness::Enabled.holds(&p));
        assert!(!Readiness::Clickable.holds(&p));
    }

    #[test]
    fn readiness_composition() {
        let combined = Readiness::Visible.and(Readiness::Enabled);
        assert!(combined.holds(&probe(true, true, false)));
        assert!(!combined.holds(&probe(true, false, false)));

        let triple = combined.and(Readiness::Clickable);
        assert!(triple.holds(&probe(true, true, true)));
        assert!(!triple.holds(&probe(true, true, false)));
    }

    #[test]
    fn not_found_reports_attempted_in_order() {
        let attempted = vec![
            LocatorCandidate::clickable(LocatorExpr::web(".a")),
            LocatorCandidate::clickable(LocatorExpr::web(".b")),
        ];
        let resolution = Resolution::NotFound {
            attempted: attempted.clone(),
        };
        assert!(!resolution.is_found());
        assert_eq!(resolution.attempted(), attempted.as_slice());
    }
}
