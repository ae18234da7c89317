//! Persistent status store backed by SQLite.
//!
//! One row per host address in `scan_results`. Writes are upserts: the first
//! write for an address fixes `created_at`, later writes only move
//! `updated_at`, `status` and `vendor`. Concurrent agent processes share the
//! file and rely on SQLite's own locking.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use netwatch_core::{ScanRecord, ScanStatus, Vendor};

use crate::error::Result;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS scan_results (
        ip TEXT PRIMARY KEY,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        status TEXT NOT NULL,
        vendor TEXT
    )";

/// Wait this long on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ScanStore {
    conn: Connection,
}

impl ScanStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn };
        store.ensure_schema()?;
        tracing::debug!(path = %path.display(), "Scan store opened");
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the `scan_results` table if absent. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA, [])?;
        tracing::info!("Database initialized with table scan_results.");
        Ok(())
    }

    /// Write the current status of `address`, stamped with the current time.
    pub fn upsert(&self, address: &str, status: ScanStatus, vendor: Vendor) -> Result<()> {
        self.upsert_at(address, status, vendor, Utc::now())
    }

    /// Write the current status of `address` as observed at `now`.
    pub fn upsert_at(
        &self,
        address: &str,
        status: ScanStatus,
        vendor: Vendor,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO scan_results (ip, created_at, updated_at, status, vendor) \
             VALUES (?1, ?2, ?2, ?3, ?4) \
             ON CONFLICT(ip) DO UPDATE SET \
             updated_at = excluded.updated_at, \
             status = excluded.status, \
             vendor = excluded.vendor",
            params![address, now, status.as_str(), vendor.as_str()],
        )?;
        tracing::info!("Database updated: ip={address}, Status={status}, Vendor={vendor}");
        Ok(())
    }

    /// Look up the record for `address`.
    pub fn get(&self, address: &str) -> Result<Option<ScanRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT ip, created_at, updated_at, status, vendor \
                 FROM scan_results WHERE ip = ?1",
                params![address],
                |row| {
                    let status: String = row.get(3)?;
                    let status = status.parse::<ScanStatus>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
                    })?;
                    let vendor: Option<String> = row.get(4)?;
                    Ok(ScanRecord {
                        address: row.get(0)?,
                        created_at: row.get(1)?,
                        updated_at: row.get(2)?,
                        status,
                        vendor: Vendor::from_stored(vendor.as_deref()),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

/// Restrict the directory containing the store to `root:<group_name>` with
/// mode `0750`. Every failure is logged and swallowed.
#[cfg(unix)]
pub fn harden_store_dir(store_path: &Path, group_name: &str) {
    use std::os::unix::fs::PermissionsExt;

    use nix::unistd::{chown, Group, Uid};

    let Some(dir) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        tracing::warn!(path = %store_path.display(), "Store path has no parent directory");
        return;
    };

    match Group::from_name(group_name) {
        Ok(Some(group)) => {
            if let Err(e) = chown(dir, Some(Uid::from_raw(0)), Some(group.gid)) {
                tracing::warn!("Error changing DB Folder ownership: {e}");
            }
        }
        Ok(None) => tracing::warn!("Error changing DB Folder ownership: no group {group_name}"),
        Err(e) => tracing::warn!("Error changing DB Folder ownership: {e}"),
    }

    if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o750)) {
        tracing::warn!("Error changing DB Folder permissions: {e}");
    }
}

#[cfg(not(unix))]
pub fn harden_store_dir(store_path: &Path, _group_name: &str) {
    tracing::warn!(
        path = %store_path.display(),
        "Store directory hardening is only supported on Unix"
    );
}
