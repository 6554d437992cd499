// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module: the
// observation source. Each sub-module is one probe family; all of them
// report through the shared `ScanSession` handle they are given.
pub mod admin_scanner;
pub mod disclosure_scanner;
pub mod endpoint_scanner;
pub mod headers_scanner;
pub mod injection_scanner;
pub mod logic_scanner;
pub mod upload_scanner;

use crate::core::session::ScanSession;
use std::time::Duration;
use tracing::info;

pub const USER_AGENT: &str = "PalisadeProbe/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the single HTTP client every probe family shares. Per-request
/// timeouts live here, not in the core: a probe that times out is a void
/// result, never a lost report.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Joins a probe path onto the session's base URL.
pub(crate) fn target_url(session: &ScanSession, path: &str) -> String {
    format!("{}{}", session.target(), path)
}

/// Executes the whole probe battery against the session's target.
///
/// All probe families run concurrently; the finding store is the only
/// shared mutation surface and every family appends through the session,
/// so the battery can be cancelled at any point and the store stays
/// renderable.
pub async fn run_full_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting full scan.");
    tokio::join!(
        headers_scanner::run_headers_scan(client, session),
        endpoint_scanner::run_endpoint_scan(client, session),
        admin_scanner::run_admin_scan(client, session),
        injection_scanner::run_injection_scan(client, session),
        upload_scanner::run_upload_scan(client, session),
        logic_scanner::run_logic_scan(client, session),
        disclosure_scanner::run_disclosure_scan(client, session),
    );
    info!(total = session.store().total(), "Full scan finished.");
}
