// src/core/scanner/endpoint_scanner.rs

use crate::core::models::{Observation, Severity};
use crate::core::scanner::target_url;
use crate::core::session::ScanSession;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

const PROBE: &str = "api_endpoints";

// The standard API surface worth knocking on, whatever the backend.
static API_ENDPOINTS: &[&str] = &[
    "/api",
    "/api/auth",
    "/api/login",
    "/api/admin",
    "/api/contact",
    "/api/projects",
    "/api/users",
    "/api/profile",
    "/api/upload",
    "/api/settings",
    "/api/messages",
    "/api/analytics",
    "/api/health",
    "/api/status",
    "/graphql",
    "/api/graphql",
];

static API_VERSIONS: &[&str] = &["v1", "v2", "v3", "beta", "test", "dev", "staging"];

static DANGEROUS_METHODS: &[&str] = &["DELETE", "PUT", "PATCH"];

const GRAPHQL_INTROSPECTION: &str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    types { kind name description }
  }
}"#;

/// Probes the API surface: per-method behavior on each endpoint, version
/// discovery, and GraphQL introspection exposure.
pub async fn run_endpoint_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting API endpoint scan.");

    for endpoint in API_ENDPOINTS {
        probe_endpoint_methods(client, session, endpoint).await;
    }
    probe_api_versions(client, session).await;
    probe_graphql_introspection(client, session).await;

    info!("API endpoint scan finished.");
}

/// Exercises every HTTP method on one endpoint and flags the responses
/// that should not happen on a locked-down surface.
async fn probe_endpoint_methods(
    client: &reqwest::Client,
    session: &ScanSession,
    endpoint: &str,
) {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::TRACE,
    ];

    for method in methods {
        let url = target_url(session, endpoint);
        let response = match client.request(method.clone(), &url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, method = %method, error = %e, "Request failed, skipping.");
                continue;
            }
        };

        let status = response.status().as_u16();
        let allow_header = response
            .headers()
            .get("allow")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let cors_headers: Vec<String> = response
            .headers()
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("access-control"))
            .map(|(name, value)| {
                format!("{}: {}", name, value.to_str().unwrap_or("[Invalid UTF-8]"))
            })
            .collect();
        let body = response.text().await.unwrap_or_default();

        if status == 200 && DANGEROUS_METHODS.contains(&method.as_str()) {
            session.record(
                Severity::High,
                format!("Dangerous HTTP method allowed: {} {}", method, endpoint),
                Observation::new(
                    PROBE,
                    endpoint,
                    json!({ "method": method.as_str(), "status": status, "size": body.len() }),
                ),
            );
        } else if status == 405 {
            if let Some(allowed) = allow_header {
                if DANGEROUS_METHODS.iter().any(|danger| allowed.contains(danger)) {
                    session.record(
                        Severity::Medium,
                        format!("Dangerous methods exposed: {}", endpoint),
                        Observation::new(
                            PROBE,
                            endpoint,
                            json!({ "allowed_methods": allowed }),
                        ),
                    );
                }
            }
        } else if method == Method::TRACE && status == 200 {
            session.record(
                Severity::Medium,
                format!("HTTP TRACE method enabled: {}", endpoint),
                Observation::new(
                    PROBE,
                    endpoint,
                    json!({ "trace_response": excerpt(&body, 200) }),
                ),
            );
        } else if method == Method::OPTIONS && status == 200 && !cors_headers.is_empty() {
            session.record(
                Severity::Info,
                format!("CORS headers found: {}", endpoint),
                Observation::new(PROBE, endpoint, json!({ "cors": cors_headers })),
            );
        }
    }
}

/// Looks for alternate API versions, flagging development builds left
/// reachable in production.
async fn probe_api_versions(client: &reqwest::Client, session: &ScanSession) {
    for version in API_VERSIONS {
        let endpoint = format!("/api/{}", version);
        let url = target_url(session, &endpoint);
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Request failed, skipping.");
                continue;
            }
        };

        let status = response.status().as_u16();
        if status == 200 {
            session.record(
                Severity::Info,
                format!("API version discovered: {}", endpoint),
                Observation::new(PROBE, &endpoint, json!({ "status": status })),
            );
            if matches!(*version, "dev" | "test" | "staging") {
                session.record(
                    Severity::Medium,
                    format!("Development API version exposed: {}", endpoint),
                    Observation::new(
                        PROBE,
                        &endpoint,
                        json!({ "warning": "May contain debug features" }),
                    ),
                );
            }
        }
    }
}

/// Sends a schema introspection query to the usual GraphQL mounts.
async fn probe_graphql_introspection(client: &reqwest::Client, session: &ScanSession) {
    for endpoint in ["/graphql", "/api/graphql", "/v1/graphql"] {
        let url = target_url(session, endpoint);
        let response = match client
            .post(&url)
            .json(&json!({ "query": GRAPHQL_INTROSPECTION }))
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
        if status == 200 && body.contains("data") {
            session.record(
                Severity::High,
                format!("GraphQL introspection enabled: {}", endpoint),
                Observation::new(PROBE, endpoint, json!({ "schema_exposed": true })),
            );
        }
    }
}

pub(crate) fn excerpt(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
