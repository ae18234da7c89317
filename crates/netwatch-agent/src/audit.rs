//! Audit log sink.
//!
//! Every event is appended to the active-response log as
//! `YYYY/MM/DD HH:MM:SS - <message> [field=value ...]` in local time.
//! A second, quieter layer mirrors events to stderr under `RUST_LOG`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{AgentError, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Line format of the audit log.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditFormat;

impl<S, N> FormatEvent<S, N> for AuditFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(writer, "{} - ", Local::now().format(TIMESTAMP_FORMAT))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. Failing to open the audit log is fatal.
pub fn init_logging(log_path: &Path, log_level: &str) -> Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let file_filter = EnvFilter::try_new(log_level)
        .map_err(|e| AgentError::Config(format!("invalid log_level {log_level:?}: {e}")))?;
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let audit = fmt::layer()
        .with_ansi(false)
        .event_format(AuditFormat)
        .with_writer(Mutex::new(file))
        .with_filter(file_filter);
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(audit)
        .with(console)
        .try_init()
        .map_err(|e| AgentError::Config(e.to_string()))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::capture;
    use super::*;

    #[test]
    fn test_audit_line_format() {
        let (buf, subscriber) = capture();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Running netdiscover for range: 10.0.0.0/24");
            tracing::warn!(address = "10.0.0.5", "Netdiscover timed out");
        });

        let out = buf.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        // "2026/10/16 09:15:02 - ..." is 19 chars of timestamp then the separator.
        let (stamp, rest) = lines[0].split_at(19);
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(rest, " - Running netdiscover for range: 10.0.0.0/24");
        assert!(lines[1].ends_with(" - Netdiscover timed out address=\"10.0.0.5\""));
    }
}
