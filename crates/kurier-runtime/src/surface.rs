// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The execution surface: the embedded capability that actually performs a
// command.  The runtime never interprets commands or payloads itself; it
// only schedules calls into this trait and routes the results back to the
// callers' sinks.

use thiserror::Error;

/// Failure reported by the embedded execution engine.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The engine understood the command but refused it.
    #[error("command rejected: {0}")]
    Rejected(String),

    /// The engine failed while performing the command.
    #[error("engine failure: {0}")]
    Engine(String),
}

/// The capability that performs commands against the embedded native state.
///
/// `execute` runs on a blocking worker thread and may block on native I/O or
/// computation.  The dispatcher bounds how many executions run concurrently
/// and wraps each in the configured deadline; implementations need no
/// scheduling awareness of their own.  Access to shared engine state must be
/// synchronized inside the implementation: workers call `execute`
/// concurrently up to the dispatch width.
pub trait ExecutionSurface: Send + Sync + 'static {
    /// Whether this surface understands `command`.  Unknown commands are
    /// rejected at submission as `INVALID_COMMAND`, before a job is ever
    /// registered.
    fn recognizes(&self, command: &str) -> bool;

    /// Perform `command` against `payload`, producing the value delivered
    /// to the caller's sink.
    fn execute(&self, command: &str, payload: &[u8]) -> Result<String, SurfaceError>;
}

/// Reference surface used by embedding examples and tests: `echo` resolves
/// with the payload interpreted as UTF-8.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoSurface;

impl ExecutionSurface for EchoSurface {
    fn recognizes(&self, command: &str) -> bool {
        command == "echo"
    }

    fn execute(&self, command: &str, payload: &[u8]) -> Result<String, SurfaceError> {
        match command {
            "echo" => Ok(String::from_utf8_lossy(payload).into_owned()),
            other => Err(SurfaceError::Rejected(format!("unknown command `{other}`"))),
        }
    }
}
