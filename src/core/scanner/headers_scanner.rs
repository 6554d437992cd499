// src/core/scanner/headers_scanner.rs

use crate::core::models::{Observation, ProbeResult, Severity};
use crate::core::scanner::target_url;
use crate::core::session::ScanSession;
use reqwest::header::HeaderMap;
use serde_json::json;
use tracing::{debug, error, info};

const PROBE: &str = "security_headers";

/// One security header the response is expected to carry, with the
/// severity its absence warrants.
struct HeaderCheck {
    name: &'static str,
    display: &'static str,
    missing_severity: Severity,
}

static HEADER_CHECKS: &[HeaderCheck] = &[
    HeaderCheck {
        name: "content-security-policy",
        display: "Content-Security-Policy",
        missing_severity: Severity::High,
    },
    HeaderCheck {
        name: "strict-transport-security",
        display: "Strict-Transport-Security",
        missing_severity: Severity::Medium,
    },
    HeaderCheck {
        name: "x-frame-options",
        display: "X-Frame-Options",
        missing_severity: Severity::Medium,
    },
    HeaderCheck {
        name: "x-content-type-options",
        display: "X-Content-Type-Options",
        missing_severity: Severity::Low,
    },
    HeaderCheck {
        name: "referrer-policy",
        display: "Referrer-Policy",
        missing_severity: Severity::Low,
    },
];

/// Reads a header value, tolerating non-UTF-8 bytes.
///
/// # Returns
/// `Some(value)` when the header is present, with a placeholder when the
/// value is not valid UTF-8, or `None` when the header is absent.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).map(|value| match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => "[Invalid UTF-8]".to_string(),
    })
}

async fn fetch_root(client: &reqwest::Client, url: &str) -> ProbeResult<reqwest::Response> {
    client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("HTTP request failed: {}", e))
}

/// Probes the base URL for the recommended security response headers.
///
/// A missing header yields one finding at the severity the check table
/// assigns. A transport failure here means the whole family could not run,
/// so it is surfaced through `probe_failed` rather than silently skipped.
pub async fn run_headers_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting security headers scan.");
    let url = target_url(session, "/");

    let response = match fetch_root(client, &url).await {
        Ok(response) => response,
        Err(e) => {
            error!(url = %url, error = %e, "HTTP request failed for headers scan.");
            session.probe_failed(PROBE, e);
            return;
        }
    };

    let status = response.status().as_u16();
    let headers = response.headers().clone();
    debug!(status, "Received response for headers scan.");

    for check in HEADER_CHECKS {
        match header_value(&headers, check.name) {
            Some(value) => {
                debug!(header = check.name, value = %value, "Header present.");
            }
            None => {
                session.record(
                    check.missing_severity,
                    format!("Missing {} header", check.display),
                    Observation::new(
                        PROBE,
                        "/",
                        json!({
                            "header": check.display,
                            "status": status,
                        }),
                    ),
                );
            }
        }
    }

    // A Server header that advertises its version is an information leak.
    if let Some(server) = header_value(&headers, "server") {
        if server.chars().any(|c| c.is_ascii_digit()) {
            session.record(
                Severity::Low,
                "Server header discloses software version",
                Observation::new(PROBE, "/", json!({ "server": server })),
            );
        }
    }

    info!("Security headers scan finished.");
}
