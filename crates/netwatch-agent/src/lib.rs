//! netwatch-agent: Active-response presence agent.
//!
//! Checks whether an alerting address is a known device on its /24 by
//! running a passive discovery tool, classifies its OS with a fingerprint
//! tool, and records the outcome in a SQLite status table.

pub mod audit;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod input;
pub mod runner;
pub mod store;
