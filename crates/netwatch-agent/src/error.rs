//! Error types for the netwatch-agent crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Invalid alert JSON: {0}")]
    InvalidAlert(#[from] serde_json::Error),

    #[error("No source ip (srcip) found in the alert")]
    MissingSourceIp,

    #[error(transparent)]
    Core(#[from] netwatch_core::NetwatchError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
