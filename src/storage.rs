//! Persistence layer.
//!
//! Saves and loads the exchange snapshot to/from a JSON file so the demo
//! binary can resume with the same rate and event history. Balances are
//! not persisted here; the ledger and host own them.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::ExchangeSnapshot;

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "swapdesk_state.json";

/// Save an exchange snapshot to a JSON file.
pub fn save_snapshot(snapshot: &ExchangeSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json =
        serde_json::to_string_pretty(snapshot).context("Failed to serialise exchange snapshot")?;

    std::fs::write(path, &json).context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, rate = %snapshot.rate, events = snapshot.events.len(), "Snapshot saved");
    Ok(())
}

/// Load an exchange snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<ExchangeSnapshot>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json =
        std::fs::read_to_string(path).context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: ExchangeSnapshot =
        serde_json::from_str(&json).context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        owner = %snapshot.owner,
        rate = %snapshot.rate,
        events = snapshot.events.len(),
        "Snapshot loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
