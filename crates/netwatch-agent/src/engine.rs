//! Presence decision engine.
//!
//! Execute one check: discover → extract → decide → fingerprint → upsert.
//! An empty discovery result is "no signal" and leaves the store untouched.

use netwatch_core::{ScanStatus, Vendor};

use crate::config::AgentConfig;
use crate::discovery::discover;
use crate::error::Result;
use crate::extract::extract_addresses;
use crate::fingerprint::probe_vendor;
use crate::runner::ToolRunner;
use crate::store::ScanStore;

/// What a single decision pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Discovery returned nothing; no record was written.
    NoSignal,
    /// A record was written with this status and vendor.
    Recorded { status: ScanStatus, vendor: Vendor },
}

pub struct PresenceEngine<'a, R: ToolRunner + ?Sized> {
    config: &'a AgentConfig,
    runner: &'a R,
    store: &'a ScanStore,
}

impl<'a, R: ToolRunner + ?Sized> PresenceEngine<'a, R> {
    pub fn new(config: &'a AgentConfig, runner: &'a R, store: &'a ScanStore) -> Self {
        Self {
            config,
            runner,
            store,
        }
    }

    /// Decide whether `target` is present on `range` and record the result.
    ///
    /// Only storage failures are returned as errors.
    pub async fn decide(&self, target: &str, range: &str) -> Result<Decision> {
        let lines = discover(
            self.runner,
            &self.config.discovery_command,
            range,
            self.config.discovery_timeout(),
        )
        .await;

        if lines.is_empty() {
            tracing::warn!(
                address = %target,
                range = %range,
                "No output from netdiscover. Exiting ip check."
            );
            return Ok(Decision::NoSignal);
        }

        let discovered = extract_addresses(&lines);
        let mut sorted: Vec<&String> = discovered.iter().collect();
        sorted.sort();
        tracing::info!("Netdiscover Discovered IPs: {sorted:?}");

        let status = if discovered.contains(target) {
            println!("ip {target} is recognized and already exists on the network.");
            ScanStatus::Found
        } else {
            // Zero extracted addresses from non-empty output also lands here.
            println!("ip {target} is not recognized! Triggering active response.");
            ScanStatus::NotFound
        };

        let vendor = probe_vendor(
            self.runner,
            &self.config.fingerprint_command,
            target,
            self.config.probe_timeout(),
        )
        .await;

        self.store.upsert(target, status, vendor)?;
        Ok(Decision::Recorded { status, vendor })
    }
}
