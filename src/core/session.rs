// src/core/session.rs

use crate::core::classifier;
use crate::core::models::{Observation, ProbeOutcome, Severity, Verdict};
use crate::core::report;
use crate::core::store::FindingStore;
use chrono::{DateTime, Utc};
use tracing::info;

/// One end-to-end invocation against one target.
///
/// The session is the aggregate root: it owns the target identity, the scan
/// start timestamp, and the finding store, and it wires the pipeline
/// together (observation source -> classifier -> store -> live console
/// line). Probes receive a shared reference and report everything through
/// `submit` or its convenience wrappers.
pub struct ScanSession {
    target: String,
    started_at: DateTime<Utc>,
    store: FindingStore,
}

impl ScanSession {
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        info!(target = %target, "Scan session created.");
        Self {
            target,
            started_at: Utc::now(),
            store: FindingStore::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn store(&self) -> &FindingStore {
        &self.store
    }

    /// Classifies a probe outcome and, when it yields a finding, appends it
    /// and echoes a live console line. The live line is best-effort; the
    /// persisted report depends only on the store.
    pub fn submit(&self, outcome: ProbeOutcome) {
        if let Some(finding) = classifier::classify(outcome) {
            println!("{}", report::live_line(&finding));
            self.store.append(finding);
        }
    }

    /// Shorthand for submitting a suspicious observation with its verdict.
    pub fn record(
        &self,
        severity: Severity,
        message: impl Into<String>,
        observation: Observation,
    ) {
        self.submit(ProbeOutcome::Signal {
            verdict: Verdict::new(severity, message),
            observation,
        });
    }

    /// Shorthand for reporting that a probe routine could not complete.
    pub fn probe_failed(&self, probe_name: &str, error: impl Into<String>) {
        self.submit(ProbeOutcome::Failed {
            probe_name: probe_name.to_string(),
            error: error.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submitted_signals_accumulate_in_the_store() {
        let session = ScanSession::new("https://example.test");
        session.record(
            Severity::Critical,
            "Admin panel accessible without authentication",
            Observation::new("admin_access", "/admin", json!({"status": 200})),
        );
        session.submit(ProbeOutcome::Clear);
        session.record(
            Severity::High,
            "Missing Content-Security-Policy",
            Observation::new("headers", "/", json!(null)),
        );

        assert_eq!(session.store().total(), 2);
        let counts = session.store().count_by_severity();
        assert_eq!(counts[&Severity::Critical], 1);
        assert_eq!(counts[&Severity::High], 1);
    }

    #[test]
    fn probe_failures_land_in_the_info_bucket() {
        let session = ScanSession::new("https://example.test");
        session.probe_failed("endpoint_methods", "client build failed");
        assert_eq!(session.store().count_by_severity()[&Severity::Info], 1);
    }
}
