// src/core/scanner/admin_scanner.rs

use crate::core::models::{Observation, Severity};
use crate::core::scanner::target_url;
use crate::core::session::ScanSession;
use serde_json::json;
use tracing::{debug, info};

const PROBE: &str = "admin_functions";

static ADMIN_ENDPOINTS: &[&str] = &[
    "/admin",
    "/admin/login",
    "/admin/dashboard",
    "/admin/users",
    "/admin/projects",
    "/admin/contact",
    "/admin/messages",
    "/admin/media",
    "/admin/upload",
    "/admin/settings",
    "/admin/analytics",
    "/admin/backup",
];

// Content markers: what an admin page looks like, and what a login wall
// looks like.
static ADMIN_KEYWORDS: &[&str] = &["admin", "dashboard", "management", "control panel"];
static AUTH_KEYWORDS: &[&str] = &["login", "sign in", "authenticate", "unauthorized"];
static LOGIN_SUCCESS_KEYWORDS: &[&str] = &["welcome", "dashboard", "success", "token", "jwt"];

// Credential-less bypass attempts against the login endpoint.
static LOGIN_BYPASS_PAYLOADS: &[(&str, &str)] = &[
    ("admin' OR '1'='1' --", "test"),
    ("admin'/* */OR 1=1--", "test"),
    ("admin\" OR \"1\"=\"1", "test"),
];

// Headers some reverse proxies treat as a trusted-client marker.
static BYPASS_HEADERS: &[(&str, &str)] = &[
    ("X-Forwarded-For", "127.0.0.1"),
    ("X-Real-IP", "127.0.0.1"),
    ("X-Originating-IP", "127.0.0.1"),
    ("Client-IP", "127.0.0.1"),
    ("X-Admin", "true"),
    ("X-Auth", "admin"),
];

fn contains_any(content: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| content.contains(keyword))
}

/// Probes the administrative surface: direct access without credentials,
/// login bypass, privilege escalation, and cross-origin acceptance.
pub async fn run_admin_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting admin function scan.");

    probe_direct_access(client, session).await;
    probe_login_bypass(client, session).await;
    probe_privilege_escalation(client, session).await;
    probe_cross_origin_acceptance(client, session).await;

    info!("Admin function scan finished.");
}

/// Fetches every admin endpoint anonymously and grades what came back.
async fn probe_direct_access(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in ADMIN_ENDPOINTS {
        let url = target_url(session, endpoint);
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Request failed, skipping.");
                continue;
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default().to_lowercase();

        if status == 200 {
            let has_admin_content = contains_any(&body, ADMIN_KEYWORDS);
            let has_auth_protection = contains_any(&body, AUTH_KEYWORDS);

            if has_admin_content && !has_auth_protection {
                session.record(
                    Severity::Critical,
                    format!("Admin panel accessible without authentication: {}", endpoint),
                    Observation::new(
                        PROBE,
                        endpoint,
                        json!({ "status": status, "size": body.len() }),
                    ),
                );
            } else if has_admin_content {
                session.record(
                    Severity::Info,
                    format!("Admin panel found with protection: {}", endpoint),
                    Observation::new(PROBE, endpoint, json!({ "status": status })),
                );
            }
        } else if status == 401 || status == 403 {
            session.record(
                Severity::Info,
                format!("Admin panel properly protected: {}", endpoint),
                Observation::new(PROBE, endpoint, json!({ "status": status })),
            );
        }
    }
}

/// Tries classic injection strings and trust-header spoofing against the
/// login endpoint.
async fn probe_login_bypass(client: &reqwest::Client, session: &ScanSession) {
    let endpoint = "/admin/login";
    let url = target_url(session, endpoint);

    for (email, password) in LOGIN_BYPASS_PAYLOADS {
        let response = match client
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
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
        let body = response.text().await.unwrap_or_default().to_lowercase();
        if contains_any(&body, LOGIN_SUCCESS_KEYWORDS) {
            session.record(
                Severity::Critical,
                format!("SQL injection bypass successful: {}", endpoint),
                Observation::new(
                    PROBE,
                    endpoint,
                    json!({ "payload": email, "status": status }),
                ),
            );
        }
    }

    for (header, value) in BYPASS_HEADERS {
        let response = match client
            .post(&url)
            .header(*header, *value)
            .json(&json!({ "email": "admin", "password": "admin" }))
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
        if status != 401 && status != 403 {
            session.record(
                Severity::High,
                format!("Authentication bypass with headers: {}", endpoint),
                Observation::new(
                    PROBE,
                    endpoint,
                    json!({ "header": format!("{}: {}", header, value), "status": status }),
                ),
            );
        }
    }
}

/// Posts role-elevation payloads to the user-facing profile endpoints.
async fn probe_privilege_escalation(client: &reqwest::Client, session: &ScanSession) {
    let escalation_payloads = [
        json!({ "role": "admin" }),
        json!({ "is_admin": true }),
        json!({ "permissions": ["admin", "read", "write", "delete"] }),
        json!({ "access_level": 9999 }),
    ];

    for endpoint in ["/api/users", "/api/admin/users", "/api/profile"] {
        for payload in &escalation_payloads {
            let url = target_url(session, endpoint);
            let response = match client.post(&url).json(payload).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!(%url, error = %e, "Request failed, skipping.");
                    continue;
                }
            };

            let status = response.status().as_u16();
            if status == 200 || status == 201 {
                session.record(
                    Severity::High,
                    format!("Potential privilege escalation: {}", endpoint),
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

/// Replays admin writes from a foreign origin with no CSRF token.
async fn probe_cross_origin_acceptance(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in ADMIN_ENDPOINTS {
        let url = target_url(session, endpoint);
        let response = match client
            .post(&url)
            .header("Origin", "https://evil.example")
            .json(&json!({ "test": "csrf" }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Request failed, skipping.");
                continue;
            }
        };

        if response.status().as_u16() == 200 {
            session.record(
                Severity::Medium,
                format!("Potential CSRF vulnerability: {}", endpoint),
                Observation::new(PROBE, endpoint, json!({ "origin_bypass": true })),
            );
        }
    }
}
