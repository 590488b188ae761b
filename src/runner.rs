//! Run driver — the multi-pass detection loop.
//!
//! Runs the detection engine N times, strictly one pass after another.
//! Pass 1 builds and persists the feature dictionary; every later pass
//! loads it. Each pass's records are merged into one `AggregateTable`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::AggregateTable;
use crate::config::DetectionConfig;
use crate::engine::DetectionEngine;
use crate::types::{DictionaryMode, SweepError};

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub table: AggregateTable,
    pub passes: u32,
    /// Passes that finished without announcing a result set.
    pub empty_passes: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct RunDriver<'a> {
    engine: &'a dyn DetectionEngine,
    base: DetectionConfig,
}

impl<'a> RunDriver<'a> {
    /// `base` supplies every setting except the dictionary mode, which the
    /// driver picks per pass.
    pub fn new(engine: &'a dyn DetectionEngine, base: DetectionConfig) -> Self {
        Self { engine, base }
    }

    /// Run exactly `num_passes` passes and return the merged table.
    ///
    /// Progress lines go to `progress`. Any engine or extraction failure
    /// aborts the run; records of earlier passes are discarded with it.
    pub async fn run<W: Write + Send>(
        &self,
        num_passes: u32,
        progress: &mut W,
    ) -> Result<RunOutcome> {
        if num_passes == 0 {
            return Err(SweepError::InvalidConfig(
                "number of passes must be at least 1".to_string(),
            )
            .into());
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, passes = num_passes, engine = self.engine.name(), "Starting sweep");

        let mut table = AggregateTable::new();
        let mut empty_passes = 0u32;

        // Build once, then reuse the cached dictionary.
        let build = self.base.with_mode(DictionaryMode::Build);
        let load = self.base.with_mode(DictionaryMode::Load);

        for pass in 1..=num_passes {
            let config = match DictionaryMode::for_pass(pass) {
                DictionaryMode::Build => &build,
                DictionaryMode::Load => &load,
            };

            if pass == 1 {
                write!(progress, "Iteration 1:\nDownloading...\n")?;
            } else {
                write!(progress, "Iteration {pass}: ")?;
            }
            progress.flush()?;

            debug!(%run_id, pass, mode = %config.mode, "Running pass");
            let result = self
                .engine
                .find_anomalies(config)
                .await
                .with_context(|| format!("Detection pass {pass} of {num_passes} failed"))?;

            match result {
                Some(records) => {
                    info!(%run_id, pass, records = records.len(), "Pass merged");
                    table.merge(records);
                }
                None => {
                    warn!(%run_id, pass, "Pass produced no result announcement");
                    empty_passes += 1;
                }
            }

            writeln!(progress, "Done")?;
            progress.flush()?;
        }

        let finished_at = Utc::now();
        info!(
            %run_id,
            symbols = table.len(),
            records = table.total_records(),
            empty_passes,
            elapsed_secs = (finished_at - started_at).num_seconds(),
            "Sweep complete"
        );

        Ok(RunOutcome {
            table,
            passes: num_passes,
            empty_passes,
            started_at,
            finished_at,
        })
    }
}
