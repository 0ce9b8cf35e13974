// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The dispatcher: pulls registered jobs in FIFO submission order and runs
// them against the execution surface, at most `width` at a time.
//
// Start order is FIFO.  Completion order is NOT guaranteed to match
// submission order once the width exceeds one; callers that need ordering
// must sequence their own submissions.
//
// Executions run under `tokio::task::spawn_blocking`.  A blocking call
// cannot be interrupted, so when a job exceeds its deadline the dispatcher
// resolves it as `TIMED_OUT` and releases the width permit while the
// abandoned call runs on in the background; its late result is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use kurier_core::error::{KurierError, Result};
use kurier_core::types::{Job, JobHandle};

use crate::events::{EventHook, RuntimeEvent};
use crate::stats::RuntimeCounters;
use crate::surface::ExecutionSurface;
use crate::table::JobTable;

pub(crate) struct Dispatcher {
    tx: mpsc::UnboundedSender<JobHandle>,
    worker: JoinHandle<()>,
}

impl Dispatcher {
    /// Spawn the dispatch loop onto the current tokio runtime.
    pub(crate) fn spawn(
        table: Arc<JobTable>,
        surface: Arc<dyn ExecutionSurface>,
        width: usize,
        job_timeout: Option<Duration>,
        counters: Arc<RuntimeCounters>,
        hook: Option<EventHook>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(dispatch_loop(
            rx,
            table,
            surface,
            width,
            job_timeout,
            counters,
            hook,
        ));
        Self { tx, worker }
    }

    /// Enqueue a registered job for execution.
    pub(crate) fn enqueue(&self, handle: JobHandle) -> Result<()> {
        self.tx.send(handle).map_err(|_| KurierError::ShuttingDown)
    }

    /// Stop the intake loop.  In-flight supervisor tasks are unaffected;
    /// call only after the job table has drained.
    pub(crate) fn stop(&self) {
        self.worker.abort();
    }
}

async fn dispatch_loop(
    mut rx: mpsc::UnboundedReceiver<JobHandle>,
    table: Arc<JobTable>,
    surface: Arc<dyn ExecutionSurface>,
    width: usize,
    job_timeout: Option<Duration>,
    counters: Arc<RuntimeCounters>,
    hook: Option<EventHook>,
) {
    let permits = Arc::new(Semaphore::new(width));
    info!(width, "dispatcher started");

    while let Some(handle) = rx.recv().await {
        let permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        let job = match table.mark_running(handle) {
            Ok(job) => job,
            Err(KurierError::NotFound(_)) => {
                // Cancelled while queued.
                debug!(handle = %handle, "job retired before dispatch");
                continue;
            }
            Err(err) => {
                error!(handle = %handle, error = %err, "dispatch invariant violated");
                let _ = table.complete(handle, Err(KurierError::Internal(err.to_string())));
                continue;
            }
        };

        let table = Arc::clone(&table);
        let surface = Arc::clone(&surface);
        let counters = Arc::clone(&counters);
        let hook = hook.clone();
        tokio::spawn(async move {
            let outcome = run_job(Arc::clone(&job), surface, job_timeout).await;
            let success = outcome.is_ok();
            let timed_out = matches!(outcome, Err(KurierError::TimedOut(_)));

            match table.complete(handle, outcome) {
                Ok(()) => {
                    if success {
                        counters.note_completed();
                    } else if timed_out {
                        counters.note_timed_out();
                    } else {
                        counters.note_failed();
                    }
                    if let Some(hook) = &hook {
                        hook(&RuntimeEvent::JobResolved { handle, success });
                    }
                }
                Err(KurierError::NotFound(_)) => {
                    debug!(handle = %handle, "result dropped after cancellation");
                }
                Err(err) => {
                    warn!(handle = %handle, error = %err, "result delivery failed");
                }
            }
            drop(permit);
        });
    }
    debug!("dispatcher intake closed");
}

/// Run one job to an outcome.  Never panics: surface panics are caught and
/// converted to `InternalError`, deadline overruns to `TimedOut`.
async fn run_job(
    job: Arc<Job>,
    surface: Arc<dyn ExecutionSurface>,
    job_timeout: Option<Duration>,
) -> Result<String> {
    let execution = {
        let job = Arc::clone(&job);
        tokio::task::spawn_blocking(move || surface.execute(&job.command, &job.payload))
    };

    let joined = match job_timeout {
        Some(deadline) => match tokio::time::timeout(deadline, execution).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(handle = %job.handle, timeout_s = deadline.as_secs(), "job deadline exceeded");
                return Err(KurierError::TimedOut(deadline.as_secs()));
            }
        },
        None => execution.await,
    };

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(KurierError::Execution(err.to_string())),
        Err(join_err) if join_err.is_panic() => {
            error!(handle = %job.handle, "execution panicked");
            Err(KurierError::Internal("execution panicked".into()))
        }
        Err(join_err) => Err(KurierError::Internal(format!(
            "execution task failed: {join_err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use kurier_core::sink::CallbackSink;
    use tokio::sync::oneshot;

    use crate::surface::SurfaceError;

    /// Sink delivering its single result to an awaiting test.
    struct OneshotSink {
        tx: Mutex<Option<oneshot::Sender<std::result::Result<String, String>>>>,
    }

    impl OneshotSink {
        fn new() -> (Arc<Self>, oneshot::Receiver<std::result::Result<String, String>>) {
            let (tx, rx) = oneshot::channel();
            (
                Arc::new(Self {
                    tx: Mutex::new(Some(tx)),
                }),
                rx,
            )
        }

        fn take(&self) -> Option<oneshot::Sender<std::result::Result<String, String>>> {
            self.tx.lock().unwrap().take()
        }
    }

    impl CallbackSink for OneshotSink {
        fn resolve(&self, value: String) {
            if let Some(tx) = self.take() {
                let _ = tx.send(Ok(value));
            }
        }
        fn reject(&self, error: String) {
            if let Some(tx) = self.take() {
                let _ = tx.send(Err(error));
            }
        }
    }

    /// Surface that records the order commands start in.
    struct RecordingSurface {
        seen: Mutex<Vec<String>>,
    }

    impl ExecutionSurface for RecordingSurface {
        fn recognizes(&self, _command: &str) -> bool {
            true
        }
        fn execute(&self, command: &str, _payload: &[u8]) -> std::result::Result<String, SurfaceError> {
            self.seen.lock().unwrap().push(command.to_string());
            Ok(command.to_string())
        }
    }

    fn spawn_dispatcher(
        table: &Arc<JobTable>,
        surface: Arc<dyn ExecutionSurface>,
        width: usize,
    ) -> Dispatcher {
        Dispatcher::spawn(
            Arc::clone(table),
            surface,
            width,
            None,
            Arc::new(RuntimeCounters::default()),
            None,
        )
    }

    #[tokio::test]
    async fn jobs_start_in_submission_order_at_width_one() {
        let table = Arc::new(JobTable::new(16));
        let surface = Arc::new(RecordingSurface {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = spawn_dispatcher(&table, surface.clone(), 1);

        let mut receivers = Vec::new();
        for i in 0..5 {
            let (sink, rx) = OneshotSink::new();
            let job = table
                .register(&format!("cmd-{i}"), vec![], sink)
                .expect("register");
            dispatcher.enqueue(job.handle).expect("enqueue");
            receivers.push(rx);
        }
        for rx in receivers {
            rx.await.expect("delivery").expect("resolved");
        }

        let seen = surface.seen.lock().unwrap().clone();
        assert_eq!(seen, ["cmd-0", "cmd-1", "cmd-2", "cmd-3", "cmd-4"]);
        dispatcher.stop();
    }

    #[tokio::test]
    async fn cancelled_job_is_skipped_without_dispatch() {
        let table = Arc::new(JobTable::new(16));
        let surface = Arc::new(RecordingSurface {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = spawn_dispatcher(&table, surface.clone(), 1);

        let (sink, rx) = OneshotSink::new();
        let job = table.register("doomed", vec![], sink).expect("register");
        // Cancel before the dispatcher sees it.
        table
            .cancel(job.handle, &KurierError::Cancelled("test".into()))
            .expect("cancel");
        dispatcher.enqueue(job.handle).expect("enqueue");

        let delivery = rx.await.expect("delivery");
        assert!(delivery.expect_err("rejected").starts_with("CANCELLED"));

        // Prove the loop is still alive and never ran the doomed command.
        let (sink2, rx2) = OneshotSink::new();
        let job2 = table.register("alive", vec![], sink2).expect("register");
        dispatcher.enqueue(job2.handle).expect("enqueue");
        rx2.await.expect("delivery").expect("resolved");

        assert_eq!(surface.seen.lock().unwrap().clone(), ["alive"]);
        dispatcher.stop();
    }

    #[tokio::test]
    async fn panicking_execution_rejects_with_internal_error() {
        struct PanickingSurface;
        impl ExecutionSurface for PanickingSurface {
            fn recognizes(&self, _command: &str) -> bool {
                true
            }
            fn execute(&self, _command: &str, _payload: &[u8]) -> std::result::Result<String, SurfaceError> {
                panic!("engine blew up");
            }
        }

        let table = Arc::new(JobTable::new(16));
        let dispatcher = spawn_dispatcher(&table, Arc::new(PanickingSurface), 1);

        let (sink, rx) = OneshotSink::new();
        let job = table.register("boom", vec![], sink).expect("register");
        dispatcher.enqueue(job.handle).expect("enqueue");

        let error = rx.await.expect("delivery").expect_err("rejected");
        assert!(error.starts_with("INTERNAL_ERROR"));
        assert_eq!(table.outstanding(), 0);
        dispatcher.stop();
    }

    #[tokio::test]
    async fn slow_execution_times_out() {
        struct StallingSurface;
        impl ExecutionSurface for StallingSurface {
            fn recognizes(&self, _command: &str) -> bool {
                true
            }
            fn execute(&self, _command: &str, _payload: &[u8]) -> std::result::Result<String, SurfaceError> {
                std::thread::sleep(Duration::from_secs(2));
                Ok("too late".into())
            }
        }

        let table = Arc::new(JobTable::new(16));
        let dispatcher = Dispatcher::spawn(
            Arc::clone(&table),
            Arc::new(StallingSurface),
            1,
            Some(Duration::from_millis(100)),
            Arc::new(RuntimeCounters::default()),
            None,
        );

        let (sink, rx) = OneshotSink::new();
        let job = table.register("stall", vec![], sink).expect("register");
        dispatcher.enqueue(job.handle).expect("enqueue");

        let error = rx.await.expect("delivery").expect_err("rejected");
        assert!(error.starts_with("TIMED_OUT"));
        assert_eq!(table.outstanding(), 0);
        dispatcher.stop();
    }
}
