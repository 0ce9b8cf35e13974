// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Tuning knobs for a runtime instance.
///
/// Missing fields in a config file fall back to the defaults below.
/// `normalized` clamps out-of-range values with a warning instead of
/// failing, so a bad config file degrades rather than bricks the embedding
/// application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of jobs executing concurrently (the dispatcher's
    /// worker width). Default 4.
    pub dispatch_width: usize,
    /// Maximum number of jobs registered but not yet terminal. Submissions
    /// beyond this bound are rejected with `CAPACITY_EXCEEDED`. Default 256.
    pub max_outstanding_jobs: usize,
    /// Per-job execution deadline in seconds; a job that exceeds it is
    /// forcibly resolved as `TIMED_OUT`. `0` disables the deadline.
    /// Default 120.
    pub job_timeout_secs: u64,
    /// Upper bound on how long `shutdown` waits for running jobs to finish
    /// before force-retiring them. Default 10.
    pub drain_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatch_width: 4,
            max_outstanding_jobs: 256,
            job_timeout_secs: 120,
            drain_timeout_secs: 10,
        }
    }
}

impl RuntimeConfig {
    /// Clamp nonsense values to workable minimums.
    pub fn normalized(mut self) -> Self {
        if self.dispatch_width == 0 {
            warn!("dispatch_width 0 clamped to 1");
            self.dispatch_width = 1;
        }
        if self.max_outstanding_jobs == 0 {
            warn!("max_outstanding_jobs 0 clamped to 1");
            self.max_outstanding_jobs = 1;
        }
        self
    }

    /// The per-job deadline, or `None` when disabled.
    pub fn job_timeout(&self) -> Option<Duration> {
        (self.job_timeout_secs > 0).then(|| Duration::from_secs(self.job_timeout_secs))
    }

    /// The shutdown drain bound.
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Load a config from a JSON file, applying `normalized`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config.normalized())
    }
}
