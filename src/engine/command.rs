//! Child-process adapter for the legacy detection routine.
//!
//! The routine is launched once per pass with the configuration rendered as
//! command-line flags. Its stdout is captured and scraped for the result
//! announcement.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

use super::DetectionEngine;
use crate::capture::capture_command;
use crate::config::DetectionConfig;
use crate::extract::extract_in;
use crate::types::{PassResult, SweepError};

pub struct CommandEngine {
    program: String,
    leading_args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandEngine {
    /// Build from a command line such as `["python", "detection_engine.py"]`.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, rest) = command.split_first().ok_or_else(|| {
            SweepError::InvalidConfig("Detection command must not be empty".to_string())
        })?;
        Ok(Self {
            program: program.clone(),
            leading_args: rest.to_vec(),
            working_dir: None,
        })
    }

    /// Run the routine from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full argument list for one pass.
    pub fn args_for(&self, config: &DetectionConfig) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend(config.to_args());
        args
    }

    fn build_command(&self, config: &DetectionConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(config));
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl DetectionEngine for CommandEngine {
    async fn find_anomalies(&self, config: &DetectionConfig) -> Result<Option<PassResult>> {
        info!(program = %self.program, mode = %config.mode, "Launching detection routine");
        let mut cmd = self.build_command(config);
        let transcript = capture_command(&mut cmd).await?;
        debug!(bytes = transcript.len(), "Captured routine output");
        extract_in(&transcript, self.working_dir.as_deref())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
