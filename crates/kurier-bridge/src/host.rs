// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The embedding facade host shims link against.
//
// One `HostBridge` per process lifetime: construct it from the host
// framework's plugin-load hook, submit jobs from any thread, and consume it
// with `shutdown` from the unload hook.  The bridge owns the tokio runtime
// the dispatcher runs on, so the embedding process needs no ambient async
// runtime of its own.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use kurier_core::config::RuntimeConfig;
use kurier_core::error::Result;
use kurier_core::sink::CallbackSink;
use kurier_core::types::{JobHandle, RuntimeState};
use kurier_runtime::events::EventHook;
use kurier_runtime::runtime::RuntimeCore;
use kurier_runtime::stats::StatsSnapshot;
use kurier_runtime::surface::ExecutionSurface;

/// How long `shutdown` waits for abandoned blocking executions after the
/// runtime core has drained.
const RUNTIME_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Install a default `tracing` subscriber reading `RUST_LOG`.
///
/// Embedders with their own subscriber skip this; calling it twice is a
/// no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

pub struct HostBridge {
    rt: tokio::runtime::Runtime,
    core: Arc<RuntimeCore>,
}

impl HostBridge {
    /// Bring the runtime up with an explicit config.
    pub fn initialize(config: RuntimeConfig, surface: Arc<dyn ExecutionSurface>) -> Result<Self> {
        Self::initialize_with_hook(config, surface, None)
    }

    /// Bring the runtime up with an event hook observing its lifecycle.
    pub fn initialize_with_hook(
        config: RuntimeConfig,
        surface: Arc<dyn ExecutionSurface>,
        hook: Option<EventHook>,
    ) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("kurier")
            .build()?;
        let core = {
            let _guard = rt.enter();
            RuntimeCore::with_event_hook(config, surface, hook)
        };
        info!("host bridge initialized");
        Ok(Self { rt, core })
    }

    /// Bring the runtime up from a JSON config file.
    pub fn initialize_from_file(
        path: impl AsRef<Path>,
        surface: Arc<dyn ExecutionSurface>,
    ) -> Result<Self> {
        let config = RuntimeConfig::from_json_file(path)?;
        Self::initialize(config, surface)
    }

    /// Submit a job on behalf of a host caller.
    ///
    /// Returns the raw handle for a registered job, or `None` when the
    /// submission was refused; the refusal has already been delivered
    /// through `sink.reject`.  Callable from any host thread; the sink may
    /// be invoked on a different thread than this one.
    pub fn submit(
        &self,
        command: &str,
        payload: Vec<u8>,
        sink: Arc<dyn CallbackSink>,
    ) -> Option<u64> {
        self.core
            .submit_job(command, payload, sink)
            .map(|handle| handle.as_raw())
    }

    /// Best-effort cancellation by raw handle.  `true` if it had effect.
    pub fn cancel(&self, raw_handle: u64) -> bool {
        self.core.cancel_job(JobHandle::from_raw(raw_handle))
    }

    /// Current lifecycle state of the underlying runtime.
    pub fn state(&self) -> RuntimeState {
        self.core.state()
    }

    /// Point-in-time counters of the underlying runtime.
    pub fn stats(&self) -> StatsSnapshot {
        self.core.stats()
    }

    /// Tear down: drain per the runtime core's shutdown contract, then stop
    /// the embedded tokio runtime.  Consumes the bridge: host shims call
    /// this exactly once, from the unload hook.
    pub fn shutdown(self) {
        self.rt.block_on(self.core.shutdown());
        self.rt.shutdown_timeout(RUNTIME_TEARDOWN_TIMEOUT);
        info!("host bridge shut down");
    }
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::sinks::ChannelSink;
    use kurier_runtime::surface::EchoSurface;

    fn bridge() -> HostBridge {
        HostBridge::initialize(RuntimeConfig::default(), Arc::new(EchoSurface)).expect("initialize")
    }

    #[test]
    fn echo_round_trip_from_a_host_thread() {
        let bridge = bridge();

        let (sink, rx) = ChannelSink::new();
        let handle = bridge.submit("echo", b"hi".to_vec(), sink);
        assert!(handle.is_some());

        // Host threads are not async; they block on the delivery.
        let delivery = rx.blocking_recv().expect("delivery");
        assert_eq!(delivery, Ok("hi".into()));

        bridge.shutdown();
    }

    #[test]
    fn refused_submission_returns_no_handle() {
        let bridge = bridge();

        let (sink, rx) = ChannelSink::new();
        assert!(bridge.submit("", vec![], sink).is_none());

        let delivery = rx.blocking_recv().expect("delivery");
        assert!(delivery.expect_err("rejected").starts_with("INVALID_COMMAND"));

        bridge.shutdown();
    }

    #[test]
    fn cancel_of_unknown_handle_is_false() {
        let bridge = bridge();
        assert!(!bridge.cancel(9999));
        bridge.shutdown();
    }

    #[test]
    fn submissions_from_many_threads_all_resolve() {
        let bridge = Arc::new(bridge());

        let mut workers = Vec::new();
        for i in 0..8 {
            let bridge = Arc::clone(&bridge);
            workers.push(std::thread::spawn(move || {
                let payload = format!("payload-{i}");
                let (sink, rx) = ChannelSink::new();
                bridge
                    .submit("echo", payload.clone().into_bytes(), sink)
                    .expect("submit");
                let delivery = rx.blocking_recv().expect("delivery");
                assert_eq!(delivery, Ok(payload));
            }));
        }
        for worker in workers {
            worker.join().expect("worker");
        }

        let bridge = Arc::into_inner(bridge).expect("sole owner");
        assert_eq!(bridge.stats().accepted, 8);
        bridge.shutdown();
    }

    #[test]
    fn initialize_from_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "dispatch_width": 2, "job_timeout_secs": 30 }}"#).expect("write");

        let bridge = HostBridge::initialize_from_file(file.path(), Arc::new(EchoSurface))
            .expect("initialize");
        assert_eq!(bridge.state(), RuntimeState::Initialized);

        let (sink, rx) = ChannelSink::new();
        bridge.submit("echo", b"configured".to_vec(), sink);
        assert_eq!(
            rx.blocking_recv().expect("delivery"),
            Ok("configured".into())
        );
        assert_eq!(bridge.state(), RuntimeState::Running);

        bridge.shutdown();
    }

    #[test]
    fn initialize_from_missing_file_fails() {
        let result =
            HostBridge::initialize_from_file("/nonexistent/kurier.json", Arc::new(EchoSurface));
        assert!(result.is_err());
    }
}
