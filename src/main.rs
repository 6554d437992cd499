// src/main.rs

use color_eyre::eyre::{bail, Result};
use tracing::{info, warn};
use url::Url;

mod core;
mod logging;

use crate::core::report;
use crate::core::scanner;
use crate::core::session::ScanSession;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let Some(raw_target) = std::env::args().nth(1) else {
        bail!("usage: {} <target-base-url>", env!("CARGO_PKG_NAME"));
    };
    let target = normalize_target(&raw_target)?;

    let session = ScanSession::new(&target);
    println!("WEB APPLICATION VULNERABILITY SCANNER");
    println!("Target: {}", session.target());
    println!(
        "Started: {}",
        session.started_at().format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}", "=".repeat(60));

    let client = scanner::build_client()?;

    // An operator interrupt stops probing but never the report: whatever
    // accumulated so far still gets rendered.
    tokio::select! {
        _ = scanner::run_full_scan(&client, &session) => {
            info!("Scan completed normally.");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Scan interrupted by user.");
            println!("\nScan interrupted - rendering partial results.");
        }
    }

    let report_path = report::write_report(&session)?;
    report::print_summary(&session, Some(report_path.as_path()));

    Ok(())
}

/// Normalizes operator input into the base URL probes prepend to paths:
/// scheme defaulted to https, validated as a URL, trailing slash trimmed.
fn normalize_target(raw: &str) -> Result<String> {
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&with_scheme)?;
    if url.host_str().is_none() {
        bail!("target has no host: {raw}");
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize_target;

    #[test]
    fn scheme_is_defaulted_and_trailing_slash_trimmed() {
        assert_eq!(
            normalize_target("example.com/").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            normalize_target("http://example.com/app/").unwrap(),
            "http://example.com/app"
        );
    }

    #[test]
    fn hostless_input_is_rejected() {
        assert!(normalize_target("https:///nope").is_err());
    }
}
