// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kurier Runtime — the engine behind the host bridge: a concurrency-safe job
// table, a width-bounded dispatcher, and the runtime core that foreign
// callers submit jobs to.  This crate bridges between the core domain types
// defined in `kurier-core` and the embedded execution surface.

mod dispatcher;
pub mod events;
pub mod runtime;
pub mod stats;
pub mod surface;
pub mod table;

pub use events::{EventHook, RuntimeEvent};
pub use runtime::RuntimeCore;
pub use stats::StatsSnapshot;
pub use surface::{EchoSurface, ExecutionSurface, SurfaceError};
pub use table::JobTable;
