//! External tool process wrapper.
//!
//! Executes discovery and fingerprint tools as child processes via
//! `tokio::process::Command` under a hard wall-clock timeout. Failures never
//! surface as errors: they come back as [`ToolOutcome::Degraded`] so callers
//! can log the reason and carry on with an empty result.

use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ToolCommand;

/// Captured output of a tool that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Standard output split into lines.
    pub lines: Vec<String>,
    /// Standard error, trimmed.
    pub stderr: String,
    /// Exit code, `None` if terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    pub fn from_stdout(stdout: &str) -> Self {
        Self {
            lines: stdout.lines().map(String::from).collect(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }
}

/// Why a tool produced no usable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// The process outlived its timeout and was killed.
    Timeout(Duration),
    /// The process could not be spawned or its output could not be read.
    Launch(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(d) => write!(f, "timed out after {} seconds", d.as_secs()),
            Self::Launch(e) => write!(f, "launch failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Completed(ToolOutput),
    Degraded(DegradedReason),
}

/// Seam between the parsing logic and real process execution.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand, target: &str, timeout: Duration) -> ToolOutcome;
}

/// Runs tools as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand, target: &str, timeout: Duration) -> ToolOutcome {
        let args = command.args_for(target);
        let start = Instant::now();

        tracing::debug!(program = %command.program, args = ?args, "Launching tool");

        let mut cmd = Command::new(&command.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so a timeout also reaches grandchildren (sudo → netdiscover).
        #[cfg(unix)]
        cmd.process_group(0);
        let child = cmd.spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) => {
                return ToolOutcome::Degraded(DegradedReason::Launch(format!(
                    "{}: {e}",
                    command.program
                )))
            }
        };

        let pid = child.id();

        // Dropping the pending future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ToolOutcome::Degraded(DegradedReason::Launch(e.to_string())),
            Err(_) => {
                kill_process_group(pid);
                return ToolOutcome::Degraded(DegradedReason::Timeout(timeout));
            }
        };

        tracing::debug!(
            program = %command.program,
            duration_ms = start.elapsed().as_millis(),
            "Tool finished"
        );

        ToolOutcome::Completed(ToolOutput {
            lines: String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(String::from)
                .collect(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
        })
    }
}

/// SIGKILL every process left in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid = pid, "Failed to kill tool process group: {e}"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_degrades() {
        let cmd = ToolCommand::new("/nonexistent/netwatch-tool", &["{target}"]);
        let outcome = ProcessRunner.run(&cmd, "10.0.0.0/24", Duration::from_secs(1)).await;
        assert!(matches!(
            outcome,
            ToolOutcome::Degraded(DegradedReason::Launch(_))
        ));
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let cmd = ToolCommand::new("sh", &["-c", "echo {target}; echo oops >&2; exit 3"]);
        let outcome = ProcessRunner.run(&cmd, "10.0.0.5", Duration::from_secs(5)).await;
        match outcome {
            ToolOutcome::Completed(out) => {
                assert_eq!(out.lines, vec!["10.0.0.5"]);
                assert_eq!(out.stderr, "oops");
                assert_eq!(out.exit_code, Some(3));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let cmd = ToolCommand::new("sleep", &["5"]);
        let start = Instant::now();
        let outcome = ProcessRunner.run(&cmd, "", Duration::from_millis(200)).await;
        assert_eq!(
            outcome,
            ToolOutcome::Degraded(DegradedReason::Timeout(Duration::from_millis(200)))
        );
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    /// True once `pid` has exited (gone, or a zombie awaiting its reaper).
    #[cfg(target_os = "linux")]
    fn has_exited(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("grandchild.pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());
        let cmd = ToolCommand::new("sh", &["-c", &script]);

        let outcome = ProcessRunner.run(&cmd, "", Duration::from_millis(500)).await;
        assert!(matches!(
            outcome,
            ToolOutcome::Degraded(DegradedReason::Timeout(_))
        ));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(3);
        while !has_exited(pid) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(has_exited(pid), "sleep {pid} outlived the timeout");
    }
}
