// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Kurier job bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Opaque identifier for a registered job.
///
/// Handles are allocated from a monotonic counter and never reused for the
/// lifetime of the runtime, so a stale handle held by a host shim can never
/// alias a newer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(u64);

impl JobHandle {
    /// Wrap a raw handle value, typically one received back from a host shim
    /// across an FFI boundary.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value suitable for crossing an FFI boundary.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Lifecycle states of a job.
///
/// Transitions are monotonic: `Pending → Running → Completed` is the only
/// happy path; `Pending → Cancelled` and `Running → Cancelled` are the only
/// early exits. Terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Registered, waiting for a dispatch slot.
    Pending,
    /// Currently executing against the execution surface.
    Running,
    /// Reached a terminal result; the sink has been resolved or rejected.
    Completed,
    /// Cancelled before reaching a result; the sink has been rejected.
    Cancelled,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// One unit of submitted work.
///
/// Immutable once constructed; owned by the job table from registration
/// until terminal resolution. The payload is opaque to the runtime; logs
/// identify it by SHA-256 digest, never by content.
#[derive(Debug, Clone)]
pub struct Job {
    pub handle: JobHandle,
    pub command: String,
    pub payload: Vec<u8>,
    /// Hex SHA-256 of the payload bytes.
    pub payload_digest: String,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(handle: JobHandle, command: impl Into<String>, payload: Vec<u8>) -> Self {
        let payload_digest = hex::encode(Sha256::digest(&payload));
        Self {
            handle,
            command: command.into(),
            payload,
            payload_digest,
            submitted_at: Utc::now(),
        }
    }
}

/// Lifecycle states of the runtime core itself.
///
/// `submit_job` succeeds only in `Running` (entered implicitly on first use
/// or explicitly via `start`). `shutdown` moves through `ShuttingDown` to
/// `Stopped` once all registered jobs have reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeState {
    Initialized,
    Running,
    ShuttingDown,
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_round_trips_raw_value() {
        let handle = JobHandle::from_raw(42);
        assert_eq!(handle.as_raw(), 42);
        assert_eq!(handle.to_string(), "job-42");
    }

    #[test]
    fn only_lifecycle_transitions_are_allowed() {
        use JobStatus::*;

        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Running.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn job_digest_identifies_payload() {
        let a = Job::new(JobHandle::from_raw(1), "echo", b"hi".to_vec());
        let b = Job::new(JobHandle::from_raw(2), "echo", b"hi".to_vec());
        let c = Job::new(JobHandle::from_raw(3), "echo", b"ho".to_vec());

        assert_eq!(a.payload_digest, b.payload_digest);
        assert_ne!(a.payload_digest, c.payload_digest);
        // SHA-256 hex is 64 chars.
        assert_eq!(a.payload_digest.len(), 64);
    }
}
