// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The callback sink: where exactly one terminal result goes.

/// Destination for exactly one terminal result.
///
/// A sink is supplied by the caller at submission time and wraps whatever
/// callback mechanism the host language uses (a JS promise, a Kotlin
/// callback object, a Swift closure). The runtime invokes `resolve` or
/// `reject` at most once total per sink, on an arbitrary thread;
/// re-marshalling onto a specific host thread is the shim layer's job.
///
/// Implementations are expected to latch internally so that a second
/// invocation (which the runtime never performs) is a no-op rather than a
/// double delivery to the caller.
pub trait CallbackSink: Send + Sync {
    /// Deliver the success value.
    fn resolve(&self, value: String);

    /// Deliver the failure, rendered as `CODE: message`
    /// (see [`crate::codes::BoundaryError`]).
    fn reject(&self, error: String);
}
