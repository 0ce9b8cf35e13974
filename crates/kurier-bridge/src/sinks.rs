// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process sink adapters.
//
// Per-host-language adapters (a JNI callback wrapper, a JS promise
// resolver) live in their shim layers; these adapters cover in-process
// embedders and tests.  All of them latch internally: the runtime delivers
// at most once, and a second invocation is a logged no-op rather than a
// double delivery.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use kurier_core::sink::CallbackSink;

/// Sink calling a pair of closures.
pub struct FnSink {
    on_resolve: Box<dyn Fn(String) + Send + Sync>,
    on_reject: Box<dyn Fn(String) + Send + Sync>,
    fired: AtomicBool,
}

impl FnSink {
    pub fn new(
        on_resolve: impl Fn(String) + Send + Sync + 'static,
        on_reject: impl Fn(String) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_resolve: Box::new(on_resolve),
            on_reject: Box::new(on_reject),
            fired: AtomicBool::new(false),
        }
    }

    fn latch(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            warn!("sink already fired; delivery dropped");
            return false;
        }
        true
    }
}

impl CallbackSink for FnSink {
    fn resolve(&self, value: String) {
        if self.latch() {
            (self.on_resolve)(value);
        }
    }

    fn reject(&self, error: String) {
        if self.latch() {
            (self.on_reject)(error);
        }
    }
}

/// Terminal delivery as seen by an awaiting caller: the resolved value, or
/// the rejection string.
pub type Delivery = Result<String, String>;

/// Sink forwarding the result to an awaiting task through a oneshot
/// channel.  The `Option<Sender>` doubles as the at-most-once latch.
pub struct ChannelSink {
    tx: Mutex<Option<oneshot::Sender<Delivery>>>,
}

impl ChannelSink {
    /// Create the sink and the receiving half the caller awaits (or, from a
    /// non-async thread, `blocking_recv`s).
    pub fn new() -> (std::sync::Arc<Self>, oneshot::Receiver<Delivery>) {
        let (tx, rx) = oneshot::channel();
        (
            std::sync::Arc::new(Self {
                tx: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    fn take(&self) -> Option<oneshot::Sender<Delivery>> {
        self.tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

impl CallbackSink for ChannelSink {
    fn resolve(&self, value: String) {
        if let Some(tx) = self.take() {
            let _ = tx.send(Ok(value));
        } else {
            warn!("sink already fired; delivery dropped");
        }
    }

    fn reject(&self, error: String) {
        if let Some(tx) = self.take() {
            let _ = tx.send(Err(error));
        } else {
            warn!("sink already fired; delivery dropped");
        }
    }
}

/// Sink that discards its delivery.  For fire-and-forget submissions where
/// the caller does not care about the outcome.
pub struct NullSink;

impl CallbackSink for NullSink {
    fn resolve(&self, _value: String) {
        debug!("null sink resolved");
    }

    fn reject(&self, error: String) {
        debug!(error = %error, "null sink rejected");
    }
}
