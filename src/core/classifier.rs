// src/core/classifier.rs

use tracing::{debug, warn};

use crate::core::models::{Finding, ProbeOutcome, Severity};
use serde_json::Value;
use std::collections::BTreeMap;

/// Turns a probe's outcome into zero or one well-formed `Finding`.
///
/// The probe has already decided severity and message; this step is purely
/// mechanical: it stamps the capture timestamp and normalizes the evidence
/// mapping so the renderer can format it uniformly. A `Clear` outcome is a
/// void result, not an error. A `Failed` outcome surfaces as an `Info`
/// finding carrying the probe's error text, so a failed probe is visible in
/// the report instead of silently indistinguishable from a clean one.
///
/// Classification performs no I/O and never fails on malformed evidence.
pub fn classify(outcome: ProbeOutcome) -> Option<Finding> {
    match outcome {
        ProbeOutcome::Signal {
            verdict,
            observation,
        } => {
            debug!(
                probe = %observation.probe_name,
                resource = %observation.target_resource,
                severity = %verdict.severity,
                "Classifying observation."
            );
            Some(Finding {
                severity: verdict.severity,
                message: verdict.message,
                details: normalize_signal(observation.signal),
                timestamp: observation.timestamp,
            })
        }
        ProbeOutcome::Clear => None,
        ProbeOutcome::Failed { probe_name, error } => {
            warn!(probe = %probe_name, error = %error, "Probe routine failed.");
            let mut details = BTreeMap::new();
            details.insert("probe".to_string(), probe_name.clone());
            details.insert("error".to_string(), error);
            Some(Finding {
                severity: Severity::Info,
                message: format!("Probe did not complete: {}", probe_name),
                details,
                timestamp: chrono::Utc::now(),
            })
        }
    }
}

/// Flattens an open-ended JSON evidence bag into string key/value pairs.
///
/// Strings are taken verbatim; every other value shape (numbers, bools,
/// arrays, nested objects, null) is coerced to its compact JSON text. A
/// signal that is not an object at all is preserved under a single
/// `"signal"` key. Unknown shapes are never rejected: evidence capture must
/// not be the reason a finding is lost.
fn normalize_signal(signal: Value) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    match signal {
        Value::Object(map) => {
            for (key, value) in map {
                details.insert(key, stringify(value));
            }
        }
        Value::Null => {}
        other => {
            details.insert("signal".to_string(), stringify(other));
        }
    }
    details
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Observation, Verdict};
    use serde_json::json;

    fn signal_outcome(signal: Value) -> ProbeOutcome {
        ProbeOutcome::Signal {
            verdict: Verdict::new(Severity::High, "Missing Content-Security-Policy"),
            observation: Observation::new("headers", "/", signal),
        }
    }

    #[test]
    fn signal_becomes_finding_with_verdict_and_timestamp() {
        let outcome = signal_outcome(json!({"status": 200}));
        let finding = classify(outcome).expect("signal yields a finding");
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.message, "Missing Content-Security-Policy");
        assert_eq!(finding.details.get("status").unwrap(), "200");
    }

    #[test]
    fn clear_outcome_yields_nothing() {
        assert!(classify(ProbeOutcome::Clear).is_none());
    }

    #[test]
    fn failed_probe_surfaces_as_info_finding() {
        let finding = classify(ProbeOutcome::Failed {
            probe_name: "upload".to_string(),
            error: "could not build multipart body".to_string(),
        })
        .expect("failure yields a finding");
        assert_eq!(finding.severity, Severity::Info);
        assert!(finding.message.contains("upload"));
        assert_eq!(
            finding.details.get("error").unwrap(),
            "could not build multipart body"
        );
    }

    #[test]
    fn evidence_values_of_any_shape_are_coerced_to_strings() {
        let finding = classify(signal_outcome(json!({
            "payload": "' OR '1'='1' --",
            "status": 500,
            "reflected": true,
            "headers": ["x-admin", "x-auth"],
            "nested": {"delay": 5.2},
            "missing": null
        })))
        .unwrap();
        assert_eq!(finding.details.get("payload").unwrap(), "' OR '1'='1' --");
        assert_eq!(finding.details.get("status").unwrap(), "500");
        assert_eq!(finding.details.get("reflected").unwrap(), "true");
        assert_eq!(
            finding.details.get("headers").unwrap(),
            r#"["x-admin","x-auth"]"#
        );
        assert_eq!(finding.details.get("nested").unwrap(), r#"{"delay":5.2}"#);
        assert_eq!(finding.details.get("missing").unwrap(), "null");
    }

    #[test]
    fn non_object_signal_is_kept_under_a_signal_key() {
        let finding = classify(signal_outcome(json!("raw trace output"))).unwrap();
        assert_eq!(finding.details.get("signal").unwrap(), "raw trace output");

        let empty = classify(signal_outcome(Value::Null)).unwrap();
        assert!(empty.details.is_empty());
    }
}
