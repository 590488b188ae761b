//! Configuration loading from TOML.
//!
//! Reads `sweep.toml` and deserializes into strongly-typed structs. Every
//! field has a default so the sweep can run from CLI flags alone. The
//! `[detection]` section is forwarded verbatim to the external routine;
//! this crate validates it once at startup and never inspects it again.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{DictionaryMode, SweepError};

/// Bar sizes (minutes) the detection routine supports.
pub const SUPPORTED_GRANULARITIES: [u32; 6] = [1, 5, 10, 15, 30, 60];

/// Market-data providers the detection routine supports.
pub const SUPPORTED_DATA_SOURCES: [&str; 2] = ["binance", "yahoo_finance"];

/// Top-level application configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub run: RunConfig,
    pub detection: DetectionSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    /// Number of detection passes.
    pub iterations: u32,
    /// How many ranked symbols to print.
    pub top_n: usize,
    /// Directory the run snapshot is written to.
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            top_n: 10,
            output_dir: PathBuf::from("automation_data"),
        }
    }
}

/// Settings forwarded to the detection routine on every pass.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DetectionSettings {
    /// Program and leading arguments used to launch the routine,
    /// e.g. `["python", "detection_engine.py"]`.
    pub command: Vec<String>,
    pub min_volume: u64,
    pub history_to_use: u32,
    pub data_dictionary_path: String,
    pub data_granularity_minutes: u32,
    pub volatility_filter: f64,
    /// File name of the instrument list inside `stocks_dir`.
    pub stock_list: String,
    pub stocks_dir: PathBuf,
    pub data_source: String,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            command: vec!["python".to_string(), "detection_engine.py".to_string()],
            min_volume: 5000,
            history_to_use: 7,
            data_dictionary_path: "dictionaries/data_dictionary.npy".to_string(),
            data_granularity_minutes: 15,
            volatility_filter: 0.05,
            stock_list: "stocks.txt".to_string(),
            stocks_dir: PathBuf::from("stocks"),
            data_source: "yahoo_finance".to_string(),
        }
    }
}

impl DetectionSettings {
    /// Full path of the instrument list file.
    pub fn stock_list_path(&self) -> PathBuf {
        self.stocks_dir.join(&self.stock_list)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Startup checks. Any failure here aborts before the first pass.
    pub fn validate(&self) -> std::result::Result<(), SweepError> {
        if self.run.iterations == 0 {
            return Err(SweepError::InvalidConfig(
                "'iterations' must be at least 1".to_string(),
            ));
        }

        let det = &self.detection;
        if !SUPPORTED_GRANULARITIES.contains(&det.data_granularity_minutes) {
            let allowed = SUPPORTED_GRANULARITIES
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(",");
            return Err(SweepError::InvalidConfig(format!(
                "You can only choose the following values for 'data_granularity_minutes' -> {allowed}"
            )));
        }

        if !det.stock_list_path().is_file() {
            return Err(SweepError::InvalidConfig(format!(
                "The stocks list file must exist in the stocks directory: {}",
                det.stock_list_path().display()
            )));
        }

        if !SUPPORTED_DATA_SOURCES.contains(&det.data_source.as_str()) {
            return Err(SweepError::InvalidConfig(format!(
                "Data source must be a valid and supported service, got '{}'",
                det.data_source
            )));
        }

        if det.command.is_empty() {
            return Err(SweepError::InvalidConfig(
                "Detection command must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Count the instruments in a list file (one symbol per non-empty line).
pub fn count_instruments(path: &Path) -> Result<usize> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read instrument list: {}", path.display()))?;
    Ok(contents.lines().filter(|l| !l.trim().is_empty()).count())
}

// ---------------------------------------------------------------------------
// Per-invocation configuration
// ---------------------------------------------------------------------------

/// Immutable configuration handed to the detection routine for one pass.
///
/// The run driver derives one value per pass with [`DetectionConfig::with_mode`];
/// nothing is mutated between passes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionConfig {
    pub mode: DictionaryMode,
    /// Number of results the routine should emit; set to the size of the
    /// instrument list so every instrument is scored.
    pub top_n: usize,
    pub min_volume: u64,
    pub history_to_use: u32,
    pub data_dictionary_path: String,
    pub data_granularity_minutes: u32,
    pub volatility_filter: f64,
    pub stock_list: String,
    pub data_source: String,
}

impl DetectionConfig {
    pub fn from_settings(settings: &DetectionSettings, top_n: usize) -> Self {
        Self {
            mode: DictionaryMode::Build,
            top_n,
            min_volume: settings.min_volume,
            history_to_use: settings.history_to_use,
            data_dictionary_path: settings.data_dictionary_path.clone(),
            data_granularity_minutes: settings.data_granularity_minutes,
            volatility_filter: settings.volatility_filter,
            stock_list: settings.stock_list.clone(),
            data_source: settings.data_source.clone(),
        }
    }

    pub fn with_mode(&self, mode: DictionaryMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Command-line flags understood by the legacy detection routine.
    pub fn to_args(&self) -> Vec<String> {
        let (save, load) = self.mode.flags();
        vec![
            "--top_n".into(),
            self.top_n.to_string(),
            "--min_volume".into(),
            self.min_volume.to_string(),
            "--history_to_use".into(),
            self.history_to_use.to_string(),
            "--is_load_from_dictionary".into(),
            load.to_string(),
            "--data_dictionary_path".into(),
            self.data_dictionary_path.clone(),
            "--is_save_dictionary".into(),
            save.to_string(),
            "--data_granularity_minutes".into(),
            self.data_granularity_minutes.to_string(),
            "--is_test".into(),
            "0".into(),
            "--future_bars".into(),
            "0".into(),
            "--volatility_filter".into(),
            self.volatility_filter.to_string(),
            "--output_format".into(),
            "JSON".into(),
            "--stock_list".into(),
            self.stock_list.clone(),
            "--data_source".into(),
            self.data_source.clone(),
        ]
    }
}
