//! CLI argument parsing.
//!
//! Flags override the matching `sweep.toml` values; anything left unset
//! keeps the file's (or the built-in) default.

use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "anomaly-sweep")]
#[command(version)]
#[command(about = "Run the anomaly detection routine repeatedly and rank symbols by mean score", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(long, value_name = "PATH", default_value = "sweep.toml", env = "SWEEP_CONFIG")]
    pub config: String,

    /// Number of detection passes
    #[arg(long = "num_iterations", alias = "num-iterations", value_name = "N")]
    pub num_iterations: Option<u32>,

    /// How many ranked symbols to print
    #[arg(long = "top_n", alias = "top-n", value_name = "K")]
    pub top_n: Option<usize>,

    /// Ignore instruments whose average volume is below this value
    #[arg(long = "min_volume", value_name = "VOLUME")]
    pub min_volume: Option<u64>,

    /// Number of bars fed to the anomaly model
    #[arg(long = "history_to_use", value_name = "BARS")]
    pub history_to_use: Option<u32>,

    /// Feature dictionary built on the first pass and reused afterwards
    #[arg(long = "data_dictionary_path", value_name = "PATH")]
    pub data_dictionary_path: Option<String>,

    /// Bar size in minutes (1, 5, 10, 15, 30 or 60)
    #[arg(long = "data_granularity_minutes", value_name = "MINUTES")]
    pub data_granularity_minutes: Option<u32>,

    /// Ignore instruments with volatility below this value
    #[arg(long = "volatility_filter", value_name = "VOL")]
    pub volatility_filter: Option<f64>,

    /// Instrument list file inside the stocks directory
    #[arg(long = "stock_list", value_name = "FILE")]
    pub stock_list: Option<String>,

    /// Market-data provider (binance or yahoo_finance)
    #[arg(long = "data_source", value_name = "SOURCE")]
    pub data_source: Option<String>,

    /// Directory the run snapshot is written to
    #[arg(long = "output_dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// Fold the flags that were given into `cfg`.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(n) = self.num_iterations {
            cfg.run.iterations = n;
        }
        if let Some(k) = self.top_n {
            cfg.run.top_n = k;
        }
        if let Some(dir) = &self.output_dir {
            cfg.run.output_dir = dir.clone();
        }

        let det = &mut cfg.detection;
        if let Some(v) = self.min_volume {
            det.min_volume = v;
        }
        if let Some(v) = self.history_to_use {
            det.history_to_use = v;
        }
        if let Some(v) = &self.data_dictionary_path {
            det.data_dictionary_path = v.clone();
        }
        if let Some(v) = self.data_granularity_minutes {
            det.data_granularity_minutes = v;
        }
        if let Some(v) = self.volatility_filter {
            det.volatility_filter = v;
        }
        if let Some(v) = &self.stock_list {
            det.stock_list = v.clone();
        }
        if let Some(v) = &self.data_source {
            det.data_source = v.clone();
        }
    }
}
