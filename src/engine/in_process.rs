//! In-process adapter for a legacy routine that prints its announcement.

use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;

use super::DetectionEngine;
use crate::capture::capture;
use crate::config::DetectionConfig;
use crate::extract::extract;
use crate::types::PassResult;

/// Wraps a routine callable. Its writes go to a per-pass buffer which is
/// then scraped for the result file announcement.
pub struct InProcessEngine<F> {
    name: String,
    routine: F,
}

impl<F> InProcessEngine<F>
where
    F: Fn(&DetectionConfig, &mut dyn Write) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, routine: F) -> Self {
        Self {
            name: name.into(),
            routine,
        }
    }
}

#[async_trait]
impl<F> DetectionEngine for InProcessEngine<F>
where
    F: Fn(&DetectionConfig, &mut dyn Write) -> Result<()> + Send + Sync,
{
    async fn find_anomalies(&self, config: &DetectionConfig) -> Result<Option<PassResult>> {
        let transcript = capture(|out| (self.routine)(config, out))?;
        extract(&transcript)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
