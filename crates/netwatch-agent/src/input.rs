//! Target resolution from hook alerts and interactive address lists.

use std::io::BufRead;

use serde::Deserialize;

use netwatch_core::network_range;

use crate::engine::{Decision, PresenceEngine};
use crate::error::{AgentError, Result};
use crate::runner::ToolRunner;

/// Active-response payload: `{"parameters":{"alert":{"data":{"srcip":"..."}}}}`.
/// Every level is optional so a partial alert reads as "no srcip".
#[derive(Debug, Default, Deserialize)]
struct Alert {
    #[serde(default)]
    parameters: Parameters,
}

#[derive(Debug, Default, Deserialize)]
struct Parameters {
    #[serde(default)]
    alert: AlertBody,
}

#[derive(Debug, Default, Deserialize)]
struct AlertBody {
    #[serde(default)]
    data: AlertData,
}

#[derive(Debug, Default, Deserialize)]
struct AlertData {
    srcip: Option<String>,
}

/// Extract `parameters.alert.data.srcip` from one alert line.
pub fn parse_alert(line: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    tracing::debug!("Parsed JSON: {value}");
    let srcip = serde_json::from_value::<Alert>(value)?
        .parameters
        .alert
        .data
        .srcip
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());
    tracing::debug!(
        path = "parameters.alert.data.srcip",
        srcip = ?srcip,
        "Alert source ip"
    );
    srcip.ok_or(AgentError::MissingSourceIp)
}

/// Read exactly one line from `reader` and extract the alert's source ip.
pub fn read_alert<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    tracing::info!("Received alert: {}", line.trim_end());

    parse_alert(&line).map_err(|e| {
        match &e {
            AgentError::InvalidAlert(_) => {
                tracing::error!("Decoding JSON has failed, invalid input format")
            }
            other => tracing::error!("{other}"),
        }
        e
    })
}

/// Split a comma-separated address list, trimming and dropping empties.
pub fn parse_address_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Check one address against its /24.
pub async fn check_address<R: ToolRunner + ?Sized>(
    engine: &PresenceEngine<'_, R>,
    address: &str,
) -> Result<Decision> {
    let range = network_range(address)?;
    tracing::info!("Determined network range: {range}");
    engine.decide(address, &range).await
}

/// Check every address in order. A failure on one address is logged and
/// does not stop the rest. Returns the number of addresses that completed.
pub async fn process_address_list<R: ToolRunner + ?Sized>(
    engine: &PresenceEngine<'_, R>,
    addresses: &[String],
) -> usize {
    let mut completed = 0;
    for address in addresses {
        tracing::info!("Processing user-provided ip: {address}");
        match check_address(engine, address).await {
            Ok(_) => completed += 1,
            Err(e) => tracing::error!("Error processing ip {address}: {e}"),
        }
    }
    completed
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_parse_alert_extracts_srcip() {
        let line = r#"{"version":1,"command":"add","parameters":{"alert":{"rule":{"id":"5710"},"data":{"srcip":"192.168.1.50","srcport":"22"}}}}"#;
        assert_eq!(parse_alert(line).unwrap(), "192.168.1.50");
    }

    #[test]
    fn test_parse_alert_missing_field() {
        assert!(matches!(
            parse_alert(r#"{"parameters":{"alert":{"data":{}}}}"#),
            Err(AgentError::MissingSourceIp)
        ));
        assert!(matches!(
            parse_alert(r#"{"parameters":{}}"#),
            Err(AgentError::MissingSourceIp)
        ));
        assert!(matches!(
            parse_alert(r#"{"parameters":{"alert":{"data":{"srcip":"  "}}}}"#),
            Err(AgentError::MissingSourceIp)
        ));
    }

    #[test]
    fn test_parse_alert_invalid_json() {
        assert!(matches!(
            parse_alert("not json"),
            Err(AgentError::InvalidAlert(_))
        ));
        assert!(matches!(parse_alert(""), Err(AgentError::InvalidAlert(_))));
    }

    #[test]
    fn test_read_alert_consumes_first_line_only() {
        let input = "{\"parameters\":{\"alert\":{\"data\":{\"srcip\":\"10.1.1.7\"}}}}\ngarbage\n";
        assert_eq!(read_alert(Cursor::new(input)).unwrap(), "10.1.1.7");
    }

    #[test]
    fn test_read_alert_logs_parsed_json() {
        let (logs, subscriber) = crate::audit::testing::capture();
        let input = r#"{"parameters":{"alert":{"data":{"srcip":"10.1.1.7"}}}}"#;

        let ip = tracing::subscriber::with_default(subscriber, || {
            read_alert(Cursor::new(input)).unwrap()
        });

        assert_eq!(ip, "10.1.1.7");
        let logs = logs.contents();
        assert!(logs.contains(&format!("Received alert: {input}")));
        assert!(logs.contains("Parsed JSON: {\"parameters\""));
        assert!(logs.contains(
            "Alert source ip path=\"parameters.alert.data.srcip\" srcip=Some(\"10.1.1.7\")"
        ));
    }

    #[test]
    fn test_read_alert_logs_decode_failure() {
        let (logs, subscriber) = crate::audit::testing::capture();

        let result = tracing::subscriber::with_default(subscriber, || {
            read_alert(Cursor::new("not json\n"))
        });

        assert!(matches!(result, Err(AgentError::InvalidAlert(_))));
        assert!(logs
            .contents()
            .contains("Decoding JSON has failed, invalid input format"));
    }

    #[test]
    fn test_parse_address_list() {
        assert_eq!(
            parse_address_list(" 10.0.0.5, ,10.0.0.9 ,,"),
            vec!["10.0.0.5", "10.0.0.9"]
        );
        assert!(parse_address_list("  , , ").is_empty());
        assert!(parse_address_list("").is_empty());
    }
}
