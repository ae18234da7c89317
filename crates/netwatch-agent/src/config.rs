//! Configuration for the netwatch presence agent.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Placeholder argument replaced with the scan target at invocation time.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Top-level agent configuration.
///
/// Loaded from `netwatch.toml` `[agent]` section or
/// `NETWATCH_AGENT__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// SQLite file holding the `scan_results` table.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Append-only audit log.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// `EnvFilter` directive for the audit log (e.g. "info", "debug").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Group granted read access to the store directory.
    #[serde(default = "default_group_name")]
    pub group_name: String,

    /// Hard wall-clock limit for the subnet discovery process.
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,

    /// Hard wall-clock limit for the OS fingerprint process.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Passive subnet discovery command.
    #[serde(default = "default_discovery_command")]
    pub discovery_command: ToolCommand,

    /// OS fingerprint command run against a single host.
    #[serde(default = "default_fingerprint_command")]
    pub fingerprint_command: ToolCommand,
}

/// An external program and its argument template.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Arguments with every `{target}` placeholder substituted.
    pub fn args_for(&self, target: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(TARGET_PLACEHOLDER, target))
            .collect()
    }
}

impl AgentConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/var/ossec/active-response/bin/network_scan.db")
}

fn default_log_path() -> PathBuf {
    PathBuf::from("/var/ossec/logs/active-responses.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_group_name() -> String {
    "wazuh".to_string()
}

fn default_discovery_timeout() -> u64 {
    40
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_discovery_command() -> ToolCommand {
    ToolCommand::new("sudo", &["netdiscover", "-r", TARGET_PLACEHOLDER, "-P", "-N"])
}

fn default_fingerprint_command() -> ToolCommand {
    ToolCommand::new("nmap", &["-O", "-T4", "-Pn", TARGET_PLACEHOLDER])
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_path: default_log_path(),
            log_level: default_log_level(),
            group_name: default_group_name(),
            discovery_timeout_secs: default_discovery_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            discovery_command: default_discovery_command(),
            fingerprint_command: default_fingerprint_command(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(
            config.store_path,
            PathBuf::from("/var/ossec/active-response/bin/network_scan.db")
        );
        assert_eq!(config.group_name, "wazuh");
        assert_eq!(config.discovery_timeout(), Duration::from_secs(40));
        assert_eq!(config.probe_timeout(), Duration::from_secs(30));
        assert!(config.probe_timeout() < config.discovery_timeout());
    }

    #[test]
    fn test_target_substitution() {
        let config = AgentConfig::default();
        assert_eq!(
            config.discovery_command.args_for("10.0.0.0/24"),
            vec!["netdiscover", "-r", "10.0.0.0/24", "-P", "-N"]
        );
        assert_eq!(
            config.fingerprint_command.args_for("10.0.0.5"),
            vec!["-O", "-T4", "-Pn", "10.0.0.5"]
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                "[agent]\nstore_path = \"/tmp/x.db\"\nprobe_timeout_secs = 5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let agent: AgentConfig = cfg.get("agent").unwrap();
        assert_eq!(agent.store_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(agent.probe_timeout_secs, 5);
        assert_eq!(agent.discovery_timeout_secs, 40);
        assert_eq!(agent.fingerprint_command.program, "nmap");
    }
}
