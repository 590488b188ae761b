//! Mock detection routine for integration testing.
//!
//! Behaves like the legacy routine: each pass writes a single-line JSON
//! result file into a scratch directory and announces its path on the
//! captured output. Pass outcomes are fully controllable from test code.

use anyhow::{anyhow, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anomaly_sweep::config::DetectionConfig;
use anomaly_sweep::engine::in_process::InProcessEngine;
use anomaly_sweep::engine::DetectionEngine;
use anomaly_sweep::types::DictionaryMode;

/// What the mock routine does on a given pass.
#[derive(Debug, Clone)]
pub enum PassScript {
    /// Write these `(symbol, score)` records and announce the file.
    Records(Vec<(&'static str, f64)>),
    /// Print some chatter but never announce a result file.
    Silent,
    /// Announce a file that was never written.
    Phantom,
    /// Fail the pass.
    Fail(&'static str),
}

/// Shared log of what the routine observed.
#[derive(Debug, Default)]
pub struct RoutineLog {
    pub modes: Vec<DictionaryMode>,
    pub announced: Vec<PathBuf>,
}

pub struct MockRoutine {
    dir: PathBuf,
    script: Vec<PassScript>,
    log: Arc<Mutex<RoutineLog>>,
}

impl MockRoutine {
    pub fn new(dir: &Path, script: Vec<PassScript>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            script,
            log: Arc::new(Mutex::new(RoutineLog::default())),
        }
    }

    pub fn log(&self) -> Arc<Mutex<RoutineLog>> {
        Arc::clone(&self.log)
    }

    /// Wrap the routine in the in-process adapter.
    pub fn into_engine(self) -> impl DetectionEngine {
        let MockRoutine { dir, script, log } = self;
        InProcessEngine::new("mock-routine", move |cfg: &DetectionConfig, out: &mut dyn Write| {
            let pass = {
                let mut log = log.lock().unwrap();
                log.modes.push(cfg.mode);
                log.modes.len()
            };
            let step = script.get(pass - 1).cloned().unwrap_or(PassScript::Silent);
            let path = dir.join(format!("results_{pass}.json"));

            writeln!(out, "Downloading {} instruments", cfg.top_n)?;
            match step {
                PassScript::Records(records) => {
                    let body: Vec<String> = records
                        .iter()
                        .map(|(s, v)| {
                            format!(r#"{{"Symbol":"{s}","Anomaly Score":{v:?},"Pass":{pass}}}"#)
                        })
                        .collect();
                    std::fs::write(&path, format!("[{}]\n", body.join(",")))?;
                    writeln!(out, "Results stored successfully in {}", path.display())?;
                    log.lock().unwrap().announced.push(path);
                    Ok(())
                }
                PassScript::Silent => {
                    writeln!(out, "No instruments passed the filters")?;
                    Ok(())
                }
                PassScript::Phantom => {
                    writeln!(out, "Results stored successfully in {}", path.display())?;
                    Ok(())
                }
                PassScript::Fail(msg) => Err(anyhow!(msg)),
            }
        })
    }
}
