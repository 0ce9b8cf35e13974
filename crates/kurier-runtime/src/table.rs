// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Concurrent job registry: handle → (sink, status).
//
// The table is the rendezvous point between the thread that submitted a job
// and the worker that executes it.  Entries exist only while a job is
// non-terminal; `complete` and `cancel` remove the entry under the lock and
// invoke the sink after releasing it, so concurrent terminal attempts race
// to the removal and the sink fires exactly once no matter who wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, instrument};

use kurier_core::codes::BoundaryError;
use kurier_core::error::{KurierError, Result};
use kurier_core::sink::CallbackSink;
use kurier_core::types::{Job, JobHandle, JobStatus};

/// A live table entry.
struct Entry {
    job: Arc<Job>,
    sink: Arc<dyn CallbackSink>,
    status: JobStatus,
}

/// Concurrency-safe registry mapping handles to sinks and statuses.
///
/// Every registered handle has exactly one sink for its entire lifetime.
/// Capacity is the backpressure boundary: `register` fails with
/// `CapacityExceeded` once `capacity` jobs are outstanding.
pub struct JobTable {
    entries: Mutex<HashMap<JobHandle, Entry>>,
    next_handle: AtomicU64,
    capacity: usize,
    drained: Notify,
}

impl JobTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            capacity,
            drained: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobHandle, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new job bound to `sink`, allocating a fresh handle.
    ///
    /// Handles come from a monotonic counter and are never reused, so a
    /// retired handle can never alias a later job.
    #[instrument(skip_all, fields(command = %command))]
    pub fn register(
        &self,
        command: &str,
        payload: Vec<u8>,
        sink: Arc<dyn CallbackSink>,
    ) -> Result<Arc<Job>> {
        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            return Err(KurierError::CapacityExceeded {
                limit: self.capacity,
            });
        }
        let handle = JobHandle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let job = Arc::new(Job::new(handle, command, payload));
        entries.insert(
            handle,
            Entry {
                job: Arc::clone(&job),
                sink,
                status: JobStatus::Pending,
            },
        );
        debug!(handle = %handle, digest = %job.payload_digest, "job registered");
        Ok(job)
    }

    /// Move a Pending job to Running, returning it for execution.
    ///
    /// Fails with `NotFound` if the handle was cancelled or retired while
    /// queued, and with `InvalidTransition` on a double dispatch.
    pub fn mark_running(&self, handle: JobHandle) -> Result<Arc<Job>> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&handle)
            .ok_or(KurierError::NotFound(handle))?;
        if entry.status != JobStatus::Pending {
            return Err(KurierError::InvalidTransition {
                from: entry.status,
                to: JobStatus::Running,
            });
        }
        entry.status = JobStatus::Running;
        Ok(Arc::clone(&entry.job))
    }

    /// Remove the entry for `handle` if its status allows a transition to
    /// `to`; otherwise leave it in place and report why not.
    fn take_for_transition(&self, handle: JobHandle, to: JobStatus) -> Result<Entry> {
        let mut entries = self.lock();
        let Some(entry) = entries.remove(&handle) else {
            return Err(KurierError::NotFound(handle));
        };
        if !entry.status.can_transition_to(to) {
            let from = entry.status;
            entries.insert(handle, entry);
            return Err(KurierError::InvalidTransition { from, to });
        }
        if entries.is_empty() {
            self.drained.notify_waiters();
        }
        Ok(entry)
    }

    /// Resolve a Running job and retire its handle.
    ///
    /// The sink is invoked exactly once, after the entry has been removed: a
    /// concurrent `cancel` either wins the removal (and this call returns
    /// `NotFound`) or loses it and observes `NotFound` itself.
    #[instrument(skip(self, outcome), fields(handle = %handle))]
    pub fn complete(&self, handle: JobHandle, outcome: Result<String>) -> Result<()> {
        let entry = self.take_for_transition(handle, JobStatus::Completed)?;
        match outcome {
            Ok(value) => {
                debug!(handle = %handle, "job completed");
                entry.sink.resolve(value);
            }
            Err(err) => {
                debug!(handle = %handle, error = %err, "job failed");
                entry.sink.reject(BoundaryError::from(&err).to_string());
            }
        }
        Ok(())
    }

    /// Cancel a Pending or Running job, rejecting its sink with `reason`.
    ///
    /// Returns the status the job was in when cancelled.
    #[instrument(skip(self, reason), fields(handle = %handle))]
    pub fn cancel(&self, handle: JobHandle, reason: &KurierError) -> Result<JobStatus> {
        let entry = self.take_for_transition(handle, JobStatus::Cancelled)?;
        let from = entry.status;
        debug!(handle = %handle, was = %from, "job cancelled");
        entry.sink.reject(BoundaryError::from(reason).to_string());
        Ok(from)
    }

    /// Cancel every Pending job, rejecting each sink with `reason`.
    /// Running jobs are left to finish.  Returns how many were cancelled.
    pub fn cancel_all_pending(&self, reason: &KurierError) -> usize {
        self.cancel_where(reason, |status| status == JobStatus::Pending)
    }

    /// Forcibly retire every remaining job regardless of status.  Used once
    /// the shutdown drain deadline has expired.
    pub fn cancel_all(&self, reason: &KurierError) -> usize {
        self.cancel_where(reason, |_| true)
    }

    fn cancel_where(&self, reason: &KurierError, selects: impl Fn(JobStatus) -> bool) -> usize {
        let removed: Vec<Entry> = {
            let mut entries = self.lock();
            let handles: Vec<JobHandle> = entries
                .iter()
                .filter(|(_, entry)| selects(entry.status))
                .map(|(handle, _)| *handle)
                .collect();
            let removed = handles
                .iter()
                .filter_map(|handle| entries.remove(handle))
                .collect();
            if entries.is_empty() {
                self.drained.notify_waiters();
            }
            removed
        };
        let rendered = BoundaryError::from(reason).to_string();
        let count = removed.len();
        for entry in removed {
            debug!(handle = %entry.job.handle, "job swept");
            entry.sink.reject(rendered.clone());
        }
        count
    }

    /// Number of non-terminal jobs currently registered.
    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    /// Current status of a handle; `None` once the handle is retired.
    pub fn status(&self, handle: JobHandle) -> Option<JobStatus> {
        self.lock().get(&handle).map(|entry| entry.status)
    }

    /// Wait until the table holds no jobs.
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.lock().is_empty() {
                return;
            }
            notified.await;
        }
    }
}
