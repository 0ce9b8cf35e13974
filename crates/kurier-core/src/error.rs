// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Kurier.

use thiserror::Error;

use crate::types::{JobHandle, JobStatus};

/// Top-level error type for all Kurier operations.
#[derive(Debug, Error)]
pub enum KurierError {
    // -- Submission validation --
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("job table full: {limit} jobs already outstanding")]
    CapacityExceeded { limit: usize },

    #[error("runtime is shutting down")]
    ShuttingDown,

    // -- Job table --
    #[error("unknown or already retired handle: {0}")]
    NotFound(JobHandle),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    // -- Execution --
    #[error("job exceeded its {0}s deadline")]
    TimedOut(u64),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("job cancelled: {0}")]
    Cancelled(String),

    #[error("internal fault during execution: {0}")]
    Internal(String),

    // -- Configuration / embedding --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KurierError>;
