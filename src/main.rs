//! anomaly-sweep — multi-pass anomaly ranking
//!
//! Entry point. Loads configuration, initialises structured logging,
//! validates the detection settings, runs the pass loop against the
//! external detection routine and prints the ranked report.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info};

use anomaly_sweep::cli::Cli;
use anomaly_sweep::config::{self, DetectionConfig};
use anomaly_sweep::engine::command::CommandEngine;
use anomaly_sweep::report;
use anomaly_sweep::runner::RunDriver;
use anomaly_sweep::storage;
use anomaly_sweep::types::SweepError;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Configuration problems get a plain message, like a usage error.
            if let Some(SweepError::InvalidConfig(msg)) = e.downcast_ref::<SweepError>() {
                eprintln!("{msg}\nExiting now...");
            } else {
                error!(error = format!("{e:#}"), "Sweep failed");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::AppConfig::load_or_default(&cli.config)?;
    cli.apply(&mut cfg);
    cfg.validate()?;

    let instruments = config::count_instruments(&cfg.detection.stock_list_path())?;
    info!(
        iterations = cfg.run.iterations,
        top_n = cfg.run.top_n,
        instruments,
        dictionary = %cfg.detection.data_dictionary_path,
        data_source = %cfg.detection.data_source,
        "anomaly-sweep starting up"
    );

    let engine = CommandEngine::new(&cfg.detection.command)?;
    let base = DetectionConfig::from_settings(&cfg.detection, instruments);
    let driver = RunDriver::new(&engine, base);

    let mut stdout = std::io::stdout();
    let outcome = driver.run(cfg.run.iterations, &mut stdout).await?;

    let snapshot = storage::snapshot_path(&cfg.run.output_dir, &cfg.detection.data_dictionary_path);
    report::report(&outcome.table, cfg.run.top_n, &snapshot, &mut stdout)?;
    stdout.flush()?;

    info!(
        passes = outcome.passes,
        empty_passes = outcome.empty_passes,
        symbols = outcome.table.len(),
        snapshot = %snapshot.display(),
        "anomaly-sweep finished"
    );
    Ok(())
}

/// Initialise the `tracing` subscriber.
///
/// Logs go to stderr; stdout carries the progress lines and the report.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("anomaly_sweep=info"));

    let json_logging = std::env::var("SWEEP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
