//! Output capture for the detection routine.
//!
//! The legacy routine reports where it wrote its results by printing to
//! standard output. Each pass gets its own private buffer: an in-process
//! routine writes into a scoped `Vec<u8>`, a child process gets a piped
//! stdout. Nothing in this process ever swaps its own global stdout, so a
//! pass cannot clobber another pass's transcript or the console.

use anyhow::{Context, Result};
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::types::SweepError;

/// How much of a failed child's stderr is kept in the error message.
const STDERR_TAIL_BYTES: usize = 2048;

/// Run `action` against a private buffer and return everything it wrote.
///
/// The buffer lives only for this call, so the "channel" is released on
/// every exit path. Errors raised by `action` propagate unchanged.
pub fn capture<F>(action: F) -> Result<String>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let mut buffer: Vec<u8> = Vec::new();
    action(&mut buffer)?;
    decode_transcript(buffer)
}

/// Captured bytes as text. Invalid UTF-8 is rejected rather than replaced,
/// so an announced path is never silently altered.
fn decode_transcript(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).context("Captured output is not valid UTF-8")
}

/// Run `command` to completion with its stdout captured.
///
/// A non-zero exit is reported as [`SweepError::EngineFailed`] with the tail
/// of the child's stderr attached.
pub async fn capture_command(command: &mut Command) -> Result<String> {
    let program = command.as_std().get_program().to_string_lossy().to_string();

    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SweepError::EngineFailed {
            engine: program.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("Failed to collect output of {program}"))?;

    debug!(program = %program, bytes = output.stdout.len(), status = %output.status, "Routine finished");

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = tail(&stderr, STDERR_TAIL_BYTES);
        warn!(program = %program, status = %output.status, "Detection routine exited with failure");
        return Err(SweepError::EngineFailed {
            engine: program,
            message: format!("{}: {}", output.status, tail.trim()),
        }
        .into());
    }

    decode_transcript(output.stdout)
}

/// Last `max` bytes of `text`, cut on a char boundary.
fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
