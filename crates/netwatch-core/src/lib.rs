//! netwatch-core: Shared types and error handling for the netwatch presence agent.
//!
//! This crate provides the foundational types used by the agent:
//! - Presence status and OS vendor classifications
//! - The persisted scan record
//! - /24 network range derivation
//! - Common error types

pub mod error;
pub mod types;

pub use error::NetwatchError;
pub use types::{network_range, ScanRecord, ScanStatus, Vendor};
