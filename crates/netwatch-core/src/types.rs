//! Core domain types for the netwatch presence agent.
//!
//! A [`ScanRecord`] is the last-known presence status and OS guess for one
//! host address. Status and vendor are persisted as their display strings so
//! the table stays readable by other tooling.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NetwatchError, Result};

// ── Status ────────────────────────────────────────────────────────

/// Outcome of the most recent presence check for an address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScanStatus {
    Found,
    #[serde(rename = "Not Found")]
    NotFound,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "Found",
            Self::NotFound => "Not Found",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = NetwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Found" => Ok(Self::Found),
            "Not Found" => Ok(Self::NotFound),
            other => Err(NetwatchError::UnknownStatus(other.to_string())),
        }
    }
}

// ── Vendor ────────────────────────────────────────────────────────

/// Detected OS family of a host. Named "vendor" for historical reasons;
/// this is not the hardware manufacturer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Vendor {
    Windows,
    Linux,
    MacOS,
    FreeBSD,
    OpenBSD,
    Android,
    #[default]
    Unknown,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::MacOS => "MacOS",
            Self::FreeBSD => "FreeBSD",
            Self::OpenBSD => "OpenBSD",
            Self::Android => "Android",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse a stored vendor string. Anything unrecognised, including a
    /// missing value, reads back as `Unknown`.
    pub fn from_stored(s: Option<&str>) -> Self {
        match s {
            Some("Windows") => Self::Windows,
            Some("Linux") => Self::Linux,
            Some("MacOS") => Self::MacOS,
            Some("FreeBSD") => Self::FreeBSD,
            Some("OpenBSD") => Self::OpenBSD,
            Some("Android") => Self::Android,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Record ────────────────────────────────────────────────────────

/// One row of the status store, keyed by `address`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanRecord {
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ScanStatus,
    pub vendor: Vendor,
}

// ── Network range ─────────────────────────────────────────────────

/// Derive the /24 range containing `address` by replacing its last dotted
/// component with `0`, e.g. `192.168.1.50` → `192.168.1.0/24`. The octets
/// are not validated; `192.168.1.050` maps to `192.168.1.0/24` as well.
pub fn network_range(address: &str) -> Result<String> {
    let trimmed = address.trim();
    match trimmed.rsplit_once('.') {
        Some((prefix, _)) if !prefix.is_empty() && !prefix.contains(char::is_whitespace) => {
            Ok(format!("{prefix}.0/24"))
        }
        _ => Err(NetwatchError::InvalidAddress(address.to_string())),
    }
}
