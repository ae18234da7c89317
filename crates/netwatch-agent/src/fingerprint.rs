//! OS fingerprint probe and vendor classification.

use std::time::Duration;

use netwatch_core::Vendor;

use crate::config::ToolCommand;
use crate::runner::{ToolOutcome, ToolRunner};

/// Keyword table in match priority order. The first entry with any keyword
/// present in the lower-cased probe output wins.
const VENDOR_KEYWORDS: &[(&[&str], Vendor)] = &[
    (&["windows"], Vendor::Windows),
    (&["linux"], Vendor::Linux),
    (&["apple", "mac os", "macos"], Vendor::MacOS),
    (&["freebsd"], Vendor::FreeBSD),
    (&["openbsd"], Vendor::OpenBSD),
    (&["android"], Vendor::Android),
];

/// Classify free-text fingerprint output into an OS family.
pub fn classify_vendor(output: &str) -> Vendor {
    let text = output.to_lowercase();
    VENDOR_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, vendor)| *vendor)
        .unwrap_or(Vendor::Unknown)
}

/// Run the fingerprint tool against one address and classify the result.
/// Launch failure, timeout and empty output all yield `Unknown`.
pub async fn probe_vendor<R: ToolRunner + ?Sized>(
    runner: &R,
    command: &ToolCommand,
    address: &str,
    timeout: Duration,
) -> Vendor {
    match runner.run(command, address, timeout).await {
        ToolOutcome::Completed(output) => {
            let text = output.lines.join("\n");
            tracing::debug!("Nmap output for OS detection: {}", text.to_lowercase());
            if !output.stderr.is_empty() {
                tracing::debug!(address = %address, stderr = %output.stderr, "Nmap stderr");
            }
            let vendor = classify_vendor(&text);
            tracing::info!(address = %address, vendor = %vendor, "OS vendor classified");
            vendor
        }
        ToolOutcome::Degraded(reason) => {
            tracing::warn!(address = %address, "Error running nmap for OS detection: {reason}");
            Vendor::Unknown
        }
    }
}
