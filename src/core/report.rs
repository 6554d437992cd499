// src/core/report.rs

use crate::core::advisories;
use crate::core::models::{Finding, Severity};
use crate::core::session::ScanSession;
use crate::core::store::FindingStore;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Failure to produce or persist the report document. This is the only
/// error the core surfaces to the caller; a report with zero findings is a
/// successful outcome, not an error.
#[derive(Debug)]
pub struct RenderError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not write report to {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// The console line echoed for a finding at append time.
pub fn live_line(finding: &Finding) -> String {
    format!("[{}] {}", finding.severity.label(), finding.message)
}

/// File name for the persisted document, derived from the scan start time
/// so consecutive runs never collide.
pub fn report_file_name(started_at: DateTime<Utc>) -> String {
    format!("scan_report_{}.md", started_at.format("%Y%m%d_%H%M%S"))
}

/// Renders the full report document from the store's current contents.
///
/// This is a pure function of its inputs: it takes read-only snapshots of
/// the buckets, mutates nothing, and produces byte-identical output for
/// identical store state. It accepts a store in any state, including one
/// cut short by an interrupted scan or one with no findings at all.
pub fn render_document(
    target: &str,
    started_at: DateTime<Utc>,
    store: &FindingStore,
) -> String {
    let counts = store.count_by_severity();
    let total: usize = counts.values().sum();
    let findings = store.all(Severity::descending());

    let mut doc = String::new();
    let _ = writeln!(doc, "# Web Application Vulnerability Assessment Report");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "**Target:** {}", target);
    let _ = writeln!(doc, "**Scan Date:** {}", started_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(doc, "**Total Findings:** {}", total);
    let _ = writeln!(doc);
    let _ = writeln!(doc, "## Executive Summary");
    let _ = writeln!(doc);
    let _ = writeln!(
        doc,
        "This report contains the results of an automated black-box security assessment of the target application."
    );
    let _ = writeln!(doc);
    let _ = writeln!(doc, "### Severity Distribution");
    let _ = writeln!(doc);
    for severity in Severity::descending() {
        let count = counts.get(&severity).copied().unwrap_or(0);
        if count > 0 {
            let _ = writeln!(doc, "- **{}:** {} findings", severity, count);
        }
    }

    if total > 0 {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## Detailed Findings");
        for severity in Severity::descending() {
            let bucket: Vec<&Finding> = findings
                .iter()
                .filter(|(s, _)| *s == severity)
                .map(|(_, f)| f)
                .collect();
            if bucket.is_empty() {
                continue;
            }
            let _ = writeln!(doc);
            let _ = writeln!(doc, "### {} Findings", severity.label());
            // Numbering restarts per bucket: 1-based, contiguous.
            for (index, finding) in bucket.iter().enumerate() {
                let _ = writeln!(doc);
                let _ = writeln!(
                    doc,
                    "#### {}-{:02}: {}",
                    severity.label(),
                    index + 1,
                    finding.message
                );
                let _ = writeln!(doc);
                let _ = writeln!(
                    doc,
                    "**Timestamp:** {}",
                    finding.timestamp.format(TIMESTAMP_FORMAT)
                );
                if !finding.details.is_empty() {
                    let _ = writeln!(doc);
                    let _ = writeln!(doc, "**Details:**");
                    for (key, value) in &finding.details {
                        let _ = writeln!(doc, "- {}: {}", key, value);
                    }
                }
            }
        }
    }

    let _ = writeln!(doc);
    let _ = writeln!(doc, "## Recommendations");
    let actions = advisories::immediate_actions(&counts);
    if !actions.is_empty() {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "### Immediate Actions Required");
        for (index, action) in actions.iter().enumerate() {
            let _ = writeln!(doc, "{}. {}", index + 1, action);
        }
    }
    let practices =
        advisories::best_practices(findings.iter().map(|(_, f)| f.message.as_str()));
    if !practices.is_empty() {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "### Security Best Practices");
        for (index, practice) in practices.iter().enumerate() {
            let _ = writeln!(doc, "{}. {}", index + 1, practice);
        }
    }

    let _ = writeln!(doc);
    let _ = writeln!(doc, "## Conclusion");
    let _ = writeln!(doc);
    if total > 0 {
        let _ = writeln!(
            doc,
            "This assessment identified {} finding(s) that should be reviewed and addressed promptly.",
            total
        );
    } else {
        let _ = writeln!(
            doc,
            "This assessment did not identify any findings against the probed surface."
        );
    }

    doc
}

/// Renders and persists the session's report next to the working directory.
///
/// The document reflects whatever the store holds at call time, so a scan
/// interrupted mid-flight still produces a complete, well-formed report of
/// the findings accumulated so far.
pub fn write_report(session: &ScanSession) -> Result<PathBuf, RenderError> {
    let path = PathBuf::from(report_file_name(session.started_at()));
    write_report_to(session, &path)?;
    Ok(path)
}

fn write_report_to(session: &ScanSession, path: &Path) -> Result<(), RenderError> {
    let document = render_document(session.target(), session.started_at(), session.store());
    std::fs::write(path, &document).map_err(|source| RenderError {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = document.len(), "Report persisted.");
    Ok(())
}

/// Prints the closing console summary mirroring the document's
/// distribution block.
pub fn print_summary(session: &ScanSession, report_path: Option<&Path>) {
    let counts = session.store().count_by_severity();
    let total: usize = counts.values().sum();

    println!();
    println!("{}", "=".repeat(60));
    println!("VULNERABILITY SCAN COMPLETED");
    println!("Target: {}", session.target());
    println!("Total Findings: {}", total);
    for severity in Severity::descending() {
        let count = counts.get(&severity).copied().unwrap_or(0);
        if count > 0 {
            println!("  {}: {}", severity, count);
        }
    }
    match report_path {
        Some(path) => println!("Report: {}", path.display()),
        None => println!("Report: not written"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn frozen_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 10, 15, 0).unwrap()
    }

    fn finding(severity: Severity, message: &str, details: &[(&str, &str)]) -> Finding {
        Finding {
            severity,
            message: message.to_string(),
            details: details
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timestamp: frozen_time(),
        }
    }

    #[test]
    fn example_scenario_renders_expected_sections() {
        let store = FindingStore::new();
        store.append(finding(
            Severity::Critical,
            "Admin panel accessible without authentication",
            &[("status", "200")],
        ));
        store.append(finding(Severity::High, "Missing Content-Security-Policy", &[]));

        let doc = render_document("https://example.test", frozen_time(), &store);
        assert!(doc.contains("**Total Findings:** 2"));
        assert!(doc.contains("- **Critical:** 1 findings"));
        assert!(doc.contains("- **High:** 1 findings"));
        assert!(doc.contains("#### CRITICAL-01: Admin panel accessible without authentication"));
        assert!(doc.contains("#### HIGH-01: Missing Content-Security-Policy"));
        assert!(doc.contains("- status: 200"));
        // Critical section precedes High section.
        let critical_at = doc.find("### CRITICAL Findings").unwrap();
        let high_at = doc.find("### HIGH Findings").unwrap();
        assert!(critical_at < high_at);
    }

    #[test]
    fn empty_store_renders_a_valid_document() {
        let store = FindingStore::new();
        let doc = render_document("https://example.test", frozen_time(), &store);
        assert!(doc.contains("**Total Findings:** 0"));
        assert!(!doc.contains("## Detailed Findings"));
        assert!(!doc.contains("Findings\n\n####"));
        assert!(doc.contains("did not identify any findings"));
    }

    #[test]
    fn rendering_is_idempotent_and_non_mutating() {
        let store = FindingStore::new();
        store.append(finding(Severity::Medium, "Directory listing enabled: /uploads", &[]));
        let first = render_document("https://example.test", frozen_time(), &store);
        let second = render_document("https://example.test", frozen_time(), &store);
        assert_eq!(first, second);
        assert_eq!(store.total(), 1);
    }

    #[test]
    fn numbering_is_contiguous_per_bucket_across_interleaved_severities() {
        let store = FindingStore::new();
        store.append(finding(Severity::High, "SQL injection error detected: /api/a", &[]));
        store.append(finding(Severity::Low, "File exposed: /robots.txt", &[]));
        store.append(finding(Severity::High, "SQL injection error detected: /api/a", &[]));
        store.append(finding(Severity::High, "Reflected XSS vulnerability: /api/b", &[]));
        store.append(finding(Severity::Low, "File exposed: /sitemap.xml", &[]));

        let doc = render_document("https://example.test", frozen_time(), &store);
        // Duplicate messages are kept and numbered separately.
        assert!(doc.contains("#### HIGH-01: SQL injection error detected: /api/a"));
        assert!(doc.contains("#### HIGH-02: SQL injection error detected: /api/a"));
        assert!(doc.contains("#### HIGH-03: Reflected XSS vulnerability: /api/b"));
        assert!(doc.contains("#### LOW-01: File exposed: /robots.txt"));
        assert!(doc.contains("#### LOW-02: File exposed: /sitemap.xml"));
        assert!(!doc.contains("HIGH-04"));
        assert!(!doc.contains("LOW-03"));
    }

    #[test]
    fn partial_scan_still_renders_every_accumulated_finding() {
        // Simulates an interrupted run: three findings made it in, nothing
        // else will. Rendering must succeed and report exactly those three.
        let store = FindingStore::new();
        store.append(finding(Severity::Critical, "Command injection detected: /api/upload", &[]));
        store.append(finding(Severity::Medium, "No rate limiting detected: /api/auth", &[]));
        store.append(finding(Severity::Info, "Rate limiting detected: /admin/login", &[]));

        let doc = render_document("https://example.test", frozen_time(), &store);
        assert!(doc.contains("**Total Findings:** 3"));
        assert!(doc.contains("CRITICAL-01"));
        assert!(doc.contains("MEDIUM-01"));
        assert!(doc.contains("INFO-01"));
    }

    #[test]
    fn recommendations_follow_present_severities_and_keywords() {
        let store = FindingStore::new();
        store.append(finding(
            Severity::Critical,
            "Admin panel accessible without authentication: /admin",
            &[],
        ));
        let doc = render_document("https://example.test", frozen_time(), &store);
        assert!(doc.contains("### Immediate Actions Required"));
        assert!(doc.contains("1. Fix all CRITICAL vulnerabilities immediately"));
        assert!(!doc.contains("Address HIGH severity issues"));
        assert!(doc.contains("authorization checks in front of all administrative functions"));
        assert!(!doc.contains("parameterized queries"));
    }

    #[test]
    fn details_render_in_deterministic_key_order() {
        let mut details = BTreeMap::new();
        details.insert("zeta".to_string(), "2".to_string());
        details.insert("alpha".to_string(), "1".to_string());
        let store = FindingStore::new();
        store.append(Finding {
            severity: Severity::Low,
            message: "File exposed: /package.json".to_string(),
            details,
            timestamp: frozen_time(),
        });
        let doc = render_document("https://example.test", frozen_time(), &store);
        let alpha_at = doc.find("- alpha: 1").unwrap();
        let zeta_at = doc.find("- zeta: 2").unwrap();
        assert!(alpha_at < zeta_at);
    }

    #[test]
    fn live_line_is_tagged_with_severity() {
        let f = finding(Severity::Critical, "Stored XSS vulnerability: /api/contact", &[]);
        assert_eq!(
            live_line(&f),
            "[CRITICAL] Stored XSS vulnerability: /api/contact"
        );
    }

    #[test]
    fn report_file_name_embeds_the_start_time() {
        assert_eq!(
            report_file_name(frozen_time()),
            "scan_report_20260806_101500.md"
        );
    }

    #[test]
    fn write_failure_surfaces_as_render_error() {
        let session = ScanSession::new("https://example.test");
        let missing_dir = Path::new("definitely-missing-dir-for-test/report.md");
        let err = write_report_to(&session, missing_dir).unwrap_err();
        assert!(err.to_string().contains("could not write report"));
    }
}
