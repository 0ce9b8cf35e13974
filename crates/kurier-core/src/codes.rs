// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary error codes for host-language shims.
//
// Results crossing to a host language are strings. Every `KurierError` maps
// to a stable machine-readable code plus a human-readable message, rendered
// as `CODE: message` through `sink.reject`, so caller code can branch on the
// prefix without parsing English.

use crate::error::KurierError;

/// Machine-readable error representation crossing the host boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryError {
    /// Stable code; never changes between releases.
    pub code: &'static str,
    /// Human-readable detail.
    pub message: String,
    /// Whether resubmitting the same job may succeed.
    pub retriable: bool,
}

impl From<&KurierError> for BoundaryError {
    fn from(err: &KurierError) -> Self {
        let (code, retriable) = match err {
            KurierError::InvalidCommand(_) => ("INVALID_COMMAND", false),
            KurierError::CapacityExceeded { .. } => ("CAPACITY_EXCEEDED", true),
            KurierError::ShuttingDown => ("SHUTTING_DOWN", false),
            KurierError::NotFound(_) => ("NOT_FOUND", false),
            KurierError::InvalidTransition { .. } => ("INVALID_TRANSITION", false),
            KurierError::TimedOut(_) => ("TIMED_OUT", true),
            KurierError::Execution(_) => ("EXECUTION_ERROR", false),
            KurierError::Cancelled(_) => ("CANCELLED", false),
            KurierError::Internal(_) => ("INTERNAL_ERROR", false),
            KurierError::Io(_) => ("IO_ERROR", true),
            KurierError::Serialization(_) => ("SERIALIZATION_ERROR", false),
        };
        Self {
            code,
            message: err.to_string(),
            retriable,
        }
    }
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
