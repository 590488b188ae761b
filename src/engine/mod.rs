//! Detection engine seam.
//!
//! Defines the `DetectionEngine` trait, one invocation of the external
//! anomaly-scoring routine returning its records, plus adapters for
//! legacy routines that only announce a result file on standard output:
//! - `CommandEngine` — launches the routine as a child process
//! - `InProcessEngine` — wraps a routine callable that writes to a writer

pub mod command;
pub mod in_process;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::DetectionConfig;
use crate::types::PassResult;

/// Abstraction over the anomaly-scoring routine.
///
/// An invocation runs to completion before returning. `Ok(None)` means the
/// routine finished without producing a result set; an `Err` aborts the run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetectionEngine: Send + Sync {
    /// Run one detection pass with the given configuration.
    async fn find_anomalies(&self, config: &DetectionConfig) -> Result<Option<PassResult>>;

    /// Engine name for logging.
    fn name(&self) -> &str;
}
