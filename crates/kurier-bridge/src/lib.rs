// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kurier Bridge — the surface host-language shims link against.
//
// A shim (Kotlin/Swift/JS glue, out of scope here) wraps its platform's
// callback object in a `CallbackSink` implementation, constructs one
// `HostBridge` from its plugin-load hook, and forwards submit/cancel calls
// with raw `u64` handles.  Everything underneath (scheduling, delivery,
// lifecycle) is `kurier-runtime`'s concern.

pub mod host;
pub mod sinks;

pub use host::{HostBridge, init_tracing};
pub use sinks::{ChannelSink, Delivery, FnSink, NullSink};

pub use kurier_core::{BoundaryError, CallbackSink, KurierError, RuntimeConfig, RuntimeState};
pub use kurier_runtime::{
    EchoSurface, EventHook, ExecutionSurface, RuntimeEvent, StatsSnapshot, SurfaceError,
};
