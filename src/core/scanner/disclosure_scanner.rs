// src/core/scanner/disclosure_scanner.rs

use crate::core::models::{Observation, Severity};
use crate::core::scanner::target_url;
use crate::core::session::ScanSession;
use serde_json::json;
use tracing::{debug, info};

const PROBE: &str = "information_disclosure";

static SENSITIVE_FILES: &[&str] = &[
    "/.env",
    "/.env.local",
    "/.env.production",
    "/package.json",
    "/package-lock.json",
    "/yarn.lock",
    "/.git/config",
    "/.git/HEAD",
    "/webpack.config.js",
    "/vite.config.js",
    "/tsconfig.json",
    "/vercel.json",
    "/config.json",
    "/backup.zip",
    "/database.sql",
    "/.htaccess",
    "/robots.txt",
    "/sitemap.xml",
    "/crossdomain.xml",
];

// What separates an exposed config file from a merely public one.
static SECRET_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "api_key",
    "token",
    "database_url",
    "connection_string",
    "private_key",
];

static LISTING_DIRECTORIES: &[&str] = &["/", "/admin", "/api", "/assets", "/static", "/uploads"];

static LISTING_MARKERS: &[&str] = &["index of", "directory listing"];

// Bodies shorter than this are error stubs, not content.
const MIN_CONTENT_LENGTH: usize = 10;

/// Fetches well-known sensitive paths and checks directories for listing
/// pages.
pub async fn run_disclosure_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting information disclosure scan.");

    probe_sensitive_files(client, session).await;
    probe_directory_listing(client, session).await;

    info!("Information disclosure scan finished.");
}

async fn probe_sensitive_files(client: &reqwest::Client, session: &ScanSession) {
    for file_path in SENSITIVE_FILES {
        let url = target_url(session, file_path);
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Request failed, skipping.");
                continue;
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 || body.len() <= MIN_CONTENT_LENGTH {
            continue;
        }

        let content = body.to_lowercase();
        if SECRET_KEYWORDS.iter().any(|keyword| content.contains(keyword)) {
            session.record(
                Severity::Critical,
                format!("Sensitive information exposed: {}", file_path),
                Observation::new(PROBE, file_path, json!({ "size": body.len() })),
            );
        } else {
            session.record(
                Severity::Info,
                format!("File exposed: {}", file_path),
                Observation::new(PROBE, file_path, json!({ "size": body.len() })),
            );
        }
    }
}

async fn probe_directory_listing(client: &reqwest::Client, session: &ScanSession) {
    for directory in LISTING_DIRECTORIES {
        let url = target_url(session, directory);
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Request failed, skipping.");
                continue;
            }
        };

        let body = response.text().await.unwrap_or_default().to_lowercase();
        if LISTING_MARKERS.iter().any(|marker| body.contains(marker)) {
            session.record(
                Severity::Medium,
                format!("Directory listing enabled: {}", directory),
                Observation::new(PROBE, directory, json!({})),
            );
        }
    }
}
