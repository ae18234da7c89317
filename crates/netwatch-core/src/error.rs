use thiserror::Error;

/// Top-level error type for netwatch domain values.
#[derive(Error, Debug)]
pub enum NetwatchError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown scan status: {0}")]
    UnknownStatus(String),
}

pub type Result<T> = std::result::Result<T, NetwatchError>;
