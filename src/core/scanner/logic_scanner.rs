// src/core/scanner/logic_scanner.rs

use crate::core::models::{Observation, Severity};
use crate::core::scanner::target_url;
use crate::core::session::ScanSession;
use serde_json::json;
use tokio::task::JoinSet;
use tracing::{debug, info};

const PROBE: &str = "business_logic";

// Endpoints that should throttle repeated anonymous writes.
static RATE_LIMITED_ENDPOINTS: &[&str] = &["/admin/login", "/api/contact", "/api/auth"];

const RATE_LIMIT_BURST: usize = 50;
const RACE_WORKERS: usize = 10;

/// Probes behavioral weaknesses: missing rate limiting, race-condition
/// windows on concurrent writes, validation bypass, and workflow bypass.
pub async fn run_logic_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting business logic scan.");

    probe_rate_limiting(client, session).await;
    probe_race_conditions(client, session).await;
    probe_validation_bypass(client, session).await;
    probe_workflow_bypass(client, session).await;

    info!("Business logic scan finished.");
}

/// Fires a rapid sequential burst and watches for a 429.
async fn probe_rate_limiting(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in RATE_LIMITED_ENDPOINTS {
        let url = target_url(session, endpoint);
        let mut statuses = Vec::with_capacity(RATE_LIMIT_BURST);
        let mut limited = false;

        for i in 0..RATE_LIMIT_BURST {
            let response = match client
                .post(&url)
                .json(&json!({ "test": format!("rate_limit_{}", i) }))
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
            statuses.push(status);
            if status == 429 {
                session.record(
                    Severity::Info,
                    format!("Rate limiting detected: {}", endpoint),
                    Observation::new(
                        PROBE,
                        endpoint,
                        json!({ "requests_before_limit": i + 1 }),
                    ),
                );
                limited = true;
                break;
            }
        }

        if !limited && statuses.len() > 30 {
            session.record(
                Severity::Medium,
                format!("No rate limiting detected: {}", endpoint),
                Observation::new(
                    PROBE,
                    endpoint,
                    json!({ "total_requests": statuses.len() }),
                ),
            );
        }
    }
}

/// Fires identical writes concurrently; more than one acceptance means the
/// endpoint has no concurrency guard.
async fn probe_race_conditions(client: &reqwest::Client, session: &ScanSession) {
    let endpoint = "/admin/projects";
    let url = target_url(session, endpoint);

    let mut workers = JoinSet::new();
    for _ in 0..RACE_WORKERS {
        let client = client.clone();
        let url = url.clone();
        workers.spawn(async move {
            client
                .post(&url)
                .json(&json!({ "name": "Race Test", "description": "concurrent write" }))
                .send()
                .await
                .map(|response| response.status().as_u16())
        });
    }

    let mut success_count = 0usize;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(status)) if status == 200 || status == 201 => success_count += 1,
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!(%url, error = %e, "Request failed, skipping."),
            Err(e) => debug!(error = %e, "Race worker join failed."),
        }
    }

    if success_count > 1 {
        session.record(
            Severity::Medium,
            format!("Potential race condition: {}", endpoint),
            Observation::new(
                PROBE,
                endpoint,
                json!({ "successful_concurrent_operations": success_count }),
            ),
        );
    }
}

/// Sends structurally invalid bodies that validation should reject.
async fn probe_validation_bypass(client: &reqwest::Client, session: &ScanSession) {
    let bypass_payloads = [
        json!({ "name": null, "email": "test@test.com" }),
        json!({ "name": "", "email": "test@test.com" }),
        json!({ "name": "A".repeat(10000), "email": "test@test.com" }),
        json!({ "name": 123, "email": "test@test.com" }),
        json!({ "name": [], "email": "test@test.com" }),
        json!({ "name": "test", "email": "invalid-email" }),
    ];

    for endpoint in ["/api/contact", "/admin/projects"] {
        for payload in &bypass_payloads {
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
                    Severity::Medium,
                    format!("Input validation bypass: {}", endpoint),
                    Observation::new(
                        PROBE,
                        endpoint,
                        json!({ "payload": payload.to_string(), "status": status }),
                    ),
                );
            }
        }
    }
}

/// Requests post-login admin pages directly, skipping the login step.
async fn probe_workflow_bypass(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in ["/admin/dashboard", "/admin/settings"] {
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
        if status == 200
            && ["admin", "dashboard", "manage"]
                .iter()
                .any(|keyword| body.contains(keyword))
        {
            session.record(
                Severity::Critical,
                format!("Workflow bypass - admin access without auth: {}", endpoint),
                Observation::new(PROBE, endpoint, json!({ "status": status })),
            );
        }
    }
}
