//! Result extraction from a pass transcript.
//!
//! The legacy routine writes its records to a single-line JSON file and
//! prints `Results stored successfully in <path>`. This module finds that
//! announcement, reads and parses the file, and deletes it.

use anyhow::Result;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::types::{PassResult, SweepError};

/// Literal phrase that precedes the result file path.
pub const ANNOUNCEMENT: &str = "Results stored successfully in ";

fn announcement_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Results stored successfully in (.+?)\r?\n")
            .expect("announcement pattern is a valid regex")
    })
}

/// Locate the announced result file path in `captured`, if any.
///
/// Only the first announcement counts, and it must be terminated by a line
/// break.
pub fn find_result_path(captured: &str) -> Option<&str> {
    announcement_regex()
        .captures(captured)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extract the pass result announced in `captured`.
///
/// Returns `Ok(None)` when there is no announcement; that pass simply
/// contributes nothing. A missing or unparsable file is fatal.
pub fn extract(captured: &str) -> Result<Option<PassResult>> {
    extract_in(captured, None)
}

/// Like [`extract`], resolving a relative announced path against `base_dir`
/// (the directory the routine ran in) instead of our own working directory.
pub fn extract_in(captured: &str, base_dir: Option<&Path>) -> Result<Option<PassResult>> {
    let Some(announced) = find_result_path(captured) else {
        debug!(bytes = captured.len(), "No result announcement in pass output");
        return Ok(None);
    };

    let path = resolve_result_path(announced, base_dir);
    let records = consume_result_file(&path)?;

    info!(path = %path.display(), records = records.len(), "Pass results extracted");
    Ok(Some(records))
}

/// Where an announced path lives on disk.
pub fn resolve_result_path(announced: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(announced);
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// Read the records from a result file, then delete it.
pub fn consume_result_file(path: &Path) -> Result<PassResult> {
    let records = read_result_file(path)?;
    std::fs::remove_file(path).map_err(|e| SweepError::ArtifactCorrupt {
        path: path.display().to_string(),
        message: format!("failed to delete after reading: {e}"),
    })?;
    Ok(records)
}

/// Parse the first line of a result file as a JSON record array.
fn read_result_file(path: &Path) -> Result<PassResult> {
    let display = path.display().to_string();

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SweepError::ArtifactMissing { path: display.clone() },
        _ => SweepError::ArtifactCorrupt {
            path: display.clone(),
            message: e.to_string(),
        },
    })?;

    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| SweepError::ArtifactCorrupt {
            path: display.clone(),
            message: e.to_string(),
        })?;

    let records: PassResult =
        serde_json::from_str(line.trim()).map_err(|e| SweepError::ArtifactCorrupt {
            path: display,
            message: e.to_string(),
        })?;

    Ok(records)
}
