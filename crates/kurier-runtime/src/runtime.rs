// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The runtime core: the single entry point foreign callers use.
//
// One instance owns the job table, the dispatcher, and the embedded
// execution surface.  `submit_job` never fails toward the caller: every
// submission gets exactly one callback outcome, so pre-registration
// failures are delivered through `sink.reject` rather than as return
// errors.
//
// Lifecycle: `Initialized → Running → ShuttingDown → Stopped`.  Submissions
// are accepted only in `Running` (entered implicitly on first use).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use kurier_core::codes::BoundaryError;
use kurier_core::config::RuntimeConfig;
use kurier_core::error::KurierError;
use kurier_core::sink::CallbackSink;
use kurier_core::types::{JobHandle, JobStatus, RuntimeState};

use crate::dispatcher::Dispatcher;
use crate::events::{EventHook, RuntimeEvent};
use crate::stats::{RuntimeCounters, StatsSnapshot};
use crate::surface::ExecutionSurface;
use crate::table::JobTable;

pub struct RuntimeCore {
    id: Uuid,
    state: Mutex<RuntimeState>,
    table: Arc<JobTable>,
    dispatcher: Dispatcher,
    surface: Arc<dyn ExecutionSurface>,
    config: RuntimeConfig,
    counters: Arc<RuntimeCounters>,
    hook: Option<EventHook>,
    created_at: DateTime<Utc>,
}

impl RuntimeCore {
    /// Create a runtime instance.  Must be called within a tokio runtime
    /// context; the dispatcher is spawned onto it.
    pub fn new(config: RuntimeConfig, surface: Arc<dyn ExecutionSurface>) -> Arc<Self> {
        Self::with_event_hook(config, surface, None)
    }

    /// Create a runtime instance with an event hook observing its lifecycle.
    pub fn with_event_hook(
        config: RuntimeConfig,
        surface: Arc<dyn ExecutionSurface>,
        hook: Option<EventHook>,
    ) -> Arc<Self> {
        let config = config.normalized();
        let table = Arc::new(JobTable::new(config.max_outstanding_jobs));
        let counters = Arc::new(RuntimeCounters::default());
        let dispatcher = Dispatcher::spawn(
            Arc::clone(&table),
            Arc::clone(&surface),
            config.dispatch_width,
            config.job_timeout(),
            Arc::clone(&counters),
            hook.clone(),
        );

        let core = Arc::new(Self {
            id: Uuid::new_v4(),
            state: Mutex::new(RuntimeState::Initialized),
            table,
            dispatcher,
            surface,
            config,
            counters,
            hook,
            created_at: Utc::now(),
        });
        info!(
            runtime = %core.id,
            width = core.config.dispatch_width,
            capacity = core.config.max_outstanding_jobs,
            "runtime core created"
        );
        core
    }

    fn state_guard(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RuntimeState {
        *self.state_guard()
    }

    /// Explicitly move `Initialized → Running`.  Submitting a job does this
    /// implicitly; calling twice is a no-op.
    pub fn start(&self) {
        self.enter_running();
    }

    fn enter_running(&self) -> bool {
        let mut state = self.state_guard();
        match *state {
            RuntimeState::Initialized => {
                *state = RuntimeState::Running;
                drop(state);
                info!(runtime = %self.id, "runtime running");
                self.emit(&RuntimeEvent::StateChanged {
                    from: RuntimeState::Initialized,
                    to: RuntimeState::Running,
                });
                true
            }
            RuntimeState::Running => true,
            RuntimeState::ShuttingDown | RuntimeState::Stopped => false,
        }
    }

    fn emit(&self, event: &RuntimeEvent) {
        if let Some(hook) = &self.hook {
            hook(event);
        }
    }

    /// Submit one unit of work.
    ///
    /// Returns `Some(handle)` once the job is registered and enqueued; the
    /// handle's only use is `cancel_job`.  Returns `None` when the
    /// submission was refused; the refusal has already been delivered
    /// through `sink.reject`, so the caller still gets exactly one callback
    /// outcome either way.
    ///
    /// Callable from any thread.  Never blocks on job execution; the result
    /// arrives later through the sink, possibly on a different thread.
    #[instrument(skip(self, payload, sink), fields(runtime = %self.id, command = %command))]
    pub fn submit_job(
        &self,
        command: &str,
        payload: Vec<u8>,
        sink: Arc<dyn CallbackSink>,
    ) -> Option<JobHandle> {
        if !self.enter_running() {
            return self.refuse(command, &KurierError::ShuttingDown, sink);
        }
        if command.is_empty() {
            return self.refuse(
                command,
                &KurierError::InvalidCommand("empty command".into()),
                sink,
            );
        }
        if !self.surface.recognizes(command) {
            return self.refuse(
                command,
                &KurierError::InvalidCommand(format!("unknown command `{command}`")),
                sink,
            );
        }

        let job = match self.table.register(command, payload, Arc::clone(&sink)) {
            Ok(job) => job,
            Err(err) => return self.refuse(command, &err, sink),
        };
        let handle = job.handle;

        if let Err(err) = self.dispatcher.enqueue(handle) {
            // Shutdown closed the intake between registration and enqueue.
            let _ = self.table.cancel(handle, &err);
            self.counters.note_cancelled();
            return None;
        }

        self.counters.note_accepted();
        self.emit(&RuntimeEvent::JobAccepted {
            handle,
            command: command.to_string(),
        });
        info!(handle = %handle, digest = %job.payload_digest, "job submitted");
        Some(handle)
    }

    fn refuse(
        &self,
        command: &str,
        err: &KurierError,
        sink: Arc<dyn CallbackSink>,
    ) -> Option<JobHandle> {
        let boundary = BoundaryError::from(err);
        debug!(command, code = boundary.code, "submission refused");
        self.counters.note_refused();
        self.emit(&RuntimeEvent::JobRefused {
            command: command.to_string(),
            code: boundary.code,
        });
        sink.reject(boundary.to_string());
        None
    }

    /// Best-effort cancellation.  Returns `true` if it had effect: a
    /// Pending job is removed before dispatch, a Running job has its sink
    /// rejected immediately and its eventual result discarded.  Terminal or
    /// unknown handles return `false`.
    pub fn cancel_job(&self, handle: JobHandle) -> bool {
        match self
            .table
            .cancel(handle, &KurierError::Cancelled("cancelled by caller".into()))
        {
            Ok(was) => {
                self.counters.note_cancelled();
                self.emit(&RuntimeEvent::JobCancelled { handle });
                info!(handle = %handle, was = %was, "job cancelled");
                true
            }
            Err(_) => false,
        }
    }

    /// Current status of a registered job; `None` once the handle is
    /// retired.
    pub fn status_of(&self, handle: JobHandle) -> Option<JobStatus> {
        self.table.status(handle)
    }

    /// Point-in-time counters for this instance.
    pub fn stats(&self) -> StatsSnapshot {
        self.counters.snapshot(self.table.outstanding())
    }

    /// Stop intake, cancel Pending jobs, drain Running jobs bounded by the
    /// drain timeout, force-retire stragglers, and release state.
    ///
    /// A concurrent second call returns immediately without waiting.
    pub async fn shutdown(&self) {
        if !self.begin_shutdown() {
            return;
        }

        let swept = self.table.cancel_all_pending(&KurierError::ShuttingDown);
        if swept > 0 {
            self.counters.add_cancelled(swept);
            info!(runtime = %self.id, swept, "pending jobs cancelled");
        }

        let drain = self.config.drain_timeout();
        if tokio::time::timeout(drain, self.table.wait_drained())
            .await
            .is_err()
        {
            let forced = self.table.cancel_all(&KurierError::TimedOut(drain.as_secs()));
            self.counters.add_timed_out(forced);
            warn!(runtime = %self.id, forced, "drain deadline expired; running jobs force-retired");
        }

        self.dispatcher.stop();
        self.finish_shutdown();
        let uptime = (Utc::now() - self.created_at).num_seconds();
        info!(runtime = %self.id, uptime_s = uptime, "runtime stopped");
    }

    fn begin_shutdown(&self) -> bool {
        let mut state = self.state_guard();
        let from = *state;
        match from {
            RuntimeState::Initialized | RuntimeState::Running => {
                *state = RuntimeState::ShuttingDown;
                drop(state);
                info!(runtime = %self.id, "runtime shutting down");
                self.emit(&RuntimeEvent::StateChanged {
                    from,
                    to: RuntimeState::ShuttingDown,
                });
                true
            }
            RuntimeState::ShuttingDown | RuntimeState::Stopped => false,
        }
    }

    fn finish_shutdown(&self) {
        let mut state = self.state_guard();
        *state = RuntimeState::Stopped;
        drop(state);
        self.emit(&RuntimeEvent::StateChanged {
            from: RuntimeState::ShuttingDown,
            to: RuntimeState::Stopped,
        });
    }
}

impl std::fmt::Debug for RuntimeCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeCore")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("outstanding", &self.table.outstanding())
            .finish()
    }
}
