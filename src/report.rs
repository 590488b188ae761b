//! Ranking and console report.
//!
//! Symbols seen in at least two passes are ranked by their mean anomaly
//! score, lowest (most anomalous) first. Symbols scored only once are left
//! out: a single pass is not enough to trust the score.

use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::aggregate::AggregateTable;
use crate::storage;
use crate::types::RankedEntry;

/// Fewest recorded passes a symbol needs before it is ranked.
pub const MIN_PASSES: usize = 2;

const SEPARATOR: &str = "----------------------";

/// Rank every eligible symbol by mean score, ascending.
///
/// The sort is stable, so equal means keep first-appearance order.
pub fn rank(table: &AggregateTable) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = table
        .iter()
        .filter(|(_, records)| records.len() >= MIN_PASSES)
        .map(|(symbol, records)| {
            let sum: f64 = records.iter().map(|r| r.anomaly_score).sum();
            RankedEntry {
                symbol: symbol.to_string(),
                mean_score: sum / records.len() as f64,
                passes: records.len(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| a.mean_score.total_cmp(&b.mean_score));
    ranked
}

/// First `k` entries, or all of them when fewer are available.
pub fn top(mut ranked: Vec<RankedEntry>, k: usize) -> Vec<RankedEntry> {
    ranked.truncate(k);
    ranked
}

/// Render entries as the console report block.
pub fn render(entries: &[RankedEntry]) -> String {
    let mut out = String::from("\n");
    for entry in entries {
        out.push_str(SEPARATOR);
        out.push('\n');
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out.push_str(SEPARATOR);
    out.push('\n');
    out
}

/// Persist the full table to `snapshot_path`, then print the top `top_k`.
///
/// The snapshot is written before anything is printed and regardless of how
/// many symbols are eligible for ranking.
pub fn report<W: Write>(
    table: &AggregateTable,
    top_k: usize,
    snapshot_path: &Path,
    out: &mut W,
) -> Result<Vec<RankedEntry>> {
    storage::save_snapshot(table, snapshot_path)?;

    let ranked = rank(table);
    let eligible = ranked.len();
    let shown = top(ranked, top_k);

    out.write_all(render(&shown).as_bytes())?;
    out.flush()?;

    info!(
        symbols = table.len(),
        eligible,
        shown = shown.len(),
        snapshot = %snapshot_path.display(),
        "Report written"
    );

    Ok(shown)
}
