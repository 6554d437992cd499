// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

// --- Reusable Result Types ---
// A custom type alias for probe-internal fallible steps. Probes absorb these
// before anything reaches the core; only the text survives, as evidence.
pub type ProbeResult<T> = Result<T, String>;

// --- Core Data Models ---

// An enumeration representing the severity level of a finding.
// Declared most-severe-first; this declaration order is the canonical
// report order (Critical first), exposed through `descending()`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::Display, strum::EnumIter,
)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    // Position in the declaration order: 0 for Critical, 4 for Info.
    pub(crate) fn index(self) -> usize {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }

    /// Iterates all severities most-severe-first, the order every report
    /// section and summary uses.
    pub fn descending() -> impl Iterator<Item = Severity> {
        Severity::iter()
    }

    /// Uppercase label used in console tags and report headings.
    pub fn label(self) -> String {
        self.to_string().to_uppercase()
    }
}

// Total order with Critical as the greatest element, so `max` picks the
// worse of two severities.
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        other.index().cmp(&self.index())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// A single probe's raw captured evidence about one request/response
// exchange. Ephemeral: observations are consumed by the classifier and
// never persisted on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub probe_name: String,
    pub target_resource: String,
    pub signal: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    // Stamps the capture time at construction.
    pub fn new(probe_name: &str, target_resource: &str, signal: serde_json::Value) -> Self {
        Self {
            probe_name: probe_name.to_string(),
            target_resource: target_resource.to_string(),
            signal,
            timestamp: Utc::now(),
        }
    }
}

// The severity-assignment rule supplied by the probe that produced an
// observation. The probe decides severity from its domain heuristics; the
// classifier only wraps the verdict into a well-formed finding.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub severity: Severity,
    pub message: String,
}

impl Verdict {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

// The explicit result of one probe check. Distinguishes "nothing suspicious
// found" from "the probe itself failed", which a bare catch-and-continue
// would conflate.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// Something suspicious was observed.
    Signal {
        verdict: Verdict,
        observation: Observation,
    },
    /// The probe ran and matched nothing. A true negative, not an error.
    Clear,
    /// The probe routine could not complete at all.
    Failed { probe_name: String, error: String },
}

// A classified, severity-tagged, persisted security observation.
// Immutable after creation: findings are only ever appended, never edited,
// removed, or deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    pub details: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_total_order_puts_critical_on_top() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
        assert_eq!(Severity::Critical.max(Severity::Info), Severity::Critical);
    }

    #[test]
    fn descending_iteration_matches_report_order() {
        let order: Vec<Severity> = Severity::descending().collect();
        assert_eq!(
            order,
            vec![
                Severity::Critical,
                Severity::High,
                Severity::Medium,
                Severity::Low,
                Severity::Info
            ]
        );
    }

    #[test]
    fn labels_are_uppercase() {
        assert_eq!(Severity::Critical.label(), "CRITICAL");
        assert_eq!(Severity::Info.label(), "INFO");
    }

    #[test]
    fn observation_stamps_capture_time() {
        let before = Utc::now();
        let obs = Observation::new("probe", "/api", serde_json::json!({"status": 200}));
        assert!(obs.timestamp >= before);
        assert!(obs.timestamp <= Utc::now());
    }
}
