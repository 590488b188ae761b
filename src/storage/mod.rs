//! Persistence layer.
//!
//! Saves and loads the run snapshot (the complete symbol → records table)
//! to/from a JSON file named after the feature dictionary, for offline
//! inspection after the sweep.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::aggregate::AggregateTable;
use crate::types::SweepError;

/// Suffix appended to the dictionary name to form the snapshot file name.
const SNAPSHOT_SUFFIX: &str = "_automation_results.json";

/// Snapshot location for a run using `dictionary_path`.
///
/// `dictionaries/feature_dict.npy` in `automation_data` becomes
/// `automation_data/feature_dict_automation_results.json`.
pub fn snapshot_path(output_dir: &Path, dictionary_path: &str) -> PathBuf {
    let file_name = dictionary_path.rsplit(['/', '\\']).next().unwrap_or(dictionary_path);
    let stem = file_name.split('.').next().unwrap_or(file_name);
    output_dir.join(format!("{stem}{SNAPSHOT_SUFFIX}"))
}

/// Save the table, creating the parent directory and overwriting any
/// earlier snapshot.
pub fn save_snapshot(table: &AggregateTable, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(table)
        .map_err(|e| SweepError::Snapshot(format!("failed to serialise table: {e}")))?;

    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;

    debug!(path = %path.display(), symbols = table.len(), "Snapshot saved");
    Ok(())
}

/// Load a snapshot. Returns None if the file doesn't exist.
pub fn load_snapshot(path: &Path) -> Result<Option<AggregateTable>> {
    if !path.exists() {
        info!(path = %path.display(), "No snapshot found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot from {}", path.display()))?;

    let table: AggregateTable = serde_json::from_str(&json).map_err(|e| {
        SweepError::Snapshot(format!("failed to parse {}: {e}", path.display()))
    })?;

    info!(
        path = %path.display(),
        symbols = table.len(),
        records = table.total_records(),
        "Snapshot loaded from disk"
    );

    Ok(Some(table))
}

/// Delete a snapshot (for testing or reset).
pub fn delete_snapshot(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete snapshot {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
