// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime lifecycle events for embedders.

use std::sync::Arc;

use kurier_core::types::{JobHandle, RuntimeState};

/// Observable runtime lifecycle events.
///
/// Delivered best-effort, synchronously, on whatever thread produced them.
/// Hooks must be cheap and must not block.  Mass cancellation during
/// shutdown is reported through `StateChanged` rather than one event per
/// swept job.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A submission passed validation and was registered.
    JobAccepted { handle: JobHandle, command: String },
    /// A submission was rejected before registration; `code` is the
    /// boundary code delivered through the sink.
    JobRefused {
        command: String,
        code: &'static str,
    },
    /// A registered job reached a terminal result through execution.
    JobResolved { handle: JobHandle, success: bool },
    /// A registered job was cancelled by the caller.
    JobCancelled { handle: JobHandle },
    /// The runtime changed lifecycle state.
    StateChanged {
        from: RuntimeState,
        to: RuntimeState,
    },
}

/// Embedder-supplied event observer.
pub type EventHook = Arc<dyn Fn(&RuntimeEvent) + Send + Sync>;
