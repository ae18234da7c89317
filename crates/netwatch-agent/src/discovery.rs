//! Passive subnet discovery.
//!
//! Every failure mode (timeout, missing binary, permission denied) collapses
//! to an empty line list. An empty list means "nothing observed".

use std::time::Duration;

use crate::config::ToolCommand;
use crate::runner::{ToolOutcome, ToolRunner};

/// Run the discovery tool against `range` and return its stdout lines.
pub async fn discover<R: ToolRunner + ?Sized>(
    runner: &R,
    command: &ToolCommand,
    range: &str,
    timeout: Duration,
) -> Vec<String> {
    tracing::info!("Running netdiscover for range: {range}");

    match runner.run(command, range, timeout).await {
        ToolOutcome::Completed(output) => {
            if !output.stderr.is_empty() {
                tracing::warn!("Netdiscover stderr: {}", output.stderr);
            }
            match output.exit_code {
                Some(0) => {}
                Some(code) => tracing::warn!("Netdiscover exited with code {code}"),
                None => tracing::warn!("Netdiscover terminated by signal"),
            }
            output.lines
        }
        ToolOutcome::Degraded(reason) => {
            tracing::warn!(range = %range, "Netdiscover {reason}");
            Vec::new()
        }
    }
}
