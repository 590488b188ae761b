//! Shared types for the anomaly sweep.
//!
//! These types form the data model used across all modules: the
//! per-instrument records emitted by the detection routine, the mode
//! flag that governs the feature-dictionary cache, ranked output rows,
//! and the domain error taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Detection records
// ---------------------------------------------------------------------------

/// One instrument's result from one detection pass.
///
/// Only `Symbol` and `Anomaly Score` are interpreted. Every other field the
/// routine emits (volume, volatility, ...) is kept in `extra` and written
/// back verbatim when the run snapshot is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// Lower is more anomalous.
    #[serde(rename = "Anomaly Score")]
    pub anomaly_score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DetectionRecord {
    pub fn new(symbol: impl Into<String>, anomaly_score: f64) -> Self {
        Self {
            symbol: symbol.into(),
            anomaly_score,
            extra: Map::new(),
        }
    }

    /// Attach a pass-specific field that the sweep carries but never reads.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DetectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3})", self.symbol, self.anomaly_score)
    }
}

/// The ordered records produced by exactly one invocation of the routine.
pub type PassResult = Vec<DetectionRecord>;

// ---------------------------------------------------------------------------
// Dictionary mode
// ---------------------------------------------------------------------------

/// Whether a pass builds the feature dictionary or reuses the cached one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DictionaryMode {
    /// Download data, build the feature dictionary and persist it.
    Build,
    /// Load the feature dictionary persisted by an earlier `Build` pass.
    Load,
}

impl DictionaryMode {
    /// The `(is_save_dictionary, is_load_from_dictionary)` flag pair the
    /// legacy routine expects on its command line.
    pub fn flags(self) -> (u8, u8) {
        match self {
            DictionaryMode::Build => (1, 0),
            DictionaryMode::Load => (0, 1),
        }
    }

    /// Mode for the 1-based pass number within a run.
    pub fn for_pass(pass: u32) -> Self {
        if pass <= 1 {
            DictionaryMode::Build
        } else {
            DictionaryMode::Load
        }
    }
}

impl fmt::Display for DictionaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictionaryMode::Build => write!(f, "build"),
            DictionaryMode::Load => write!(f, "load"),
        }
    }
}

// ---------------------------------------------------------------------------
// Ranked output
// ---------------------------------------------------------------------------

/// A symbol's mean anomaly score across the passes it appeared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub symbol: String,
    pub mean_score: f64,
    /// Number of records the mean was taken over.
    pub passes: usize,
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Symbol: {}", self.symbol)?;
        write!(f, "Avg. Anomaly Score: {:.3}", self.mean_score)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the sweep.
///
/// A pass whose output carries no result announcement is not an error; the
/// extractor reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Announced result file does not exist: {path}")]
    ArtifactMissing { path: String },

    #[error("Result file {path} is not a valid record list: {message}")]
    ArtifactCorrupt { path: String, message: String },

    #[error("Detection engine failed ({engine}): {message}")]
    EngineFailed { engine: String, message: String },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
