// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic totals for one runtime instance.
#[derive(Debug, Default)]
pub struct RuntimeCounters {
    accepted: AtomicU64,
    refused: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    timed_out: AtomicU64,
}

impl RuntimeCounters {
    pub fn note_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_refused(&self) {
        self.refused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_cancelled(&self) {
        self.add_cancelled(1);
    }

    pub fn add_cancelled(&self, n: usize) {
        self.cancelled.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn note_timed_out(&self) {
        self.add_timed_out(1);
    }

    pub fn add_timed_out(&self, n: usize) {
        self.timed_out.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, outstanding: usize) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            refused: self.refused.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            outstanding,
        }
    }
}

/// Point-in-time view of a runtime's counters, serialisable for host shims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Submissions that were registered and enqueued.
    pub accepted: u64,
    /// Submissions rejected before registration.
    pub refused: u64,
    /// Jobs resolved successfully.
    pub completed: u64,
    /// Jobs that failed in execution (including internal faults).
    pub failed: u64,
    /// Jobs cancelled by the caller or swept at shutdown.
    pub cancelled: u64,
    /// Jobs forcibly resolved by a deadline.
    pub timed_out: u64,
    /// Jobs currently registered and non-terminal.
    pub outstanding: usize,
}
