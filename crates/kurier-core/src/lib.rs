// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Kurier — Core types and error definitions shared across all crates.

pub mod codes;
pub mod config;
pub mod error;
pub mod sink;
pub mod types;

pub use codes::BoundaryError;
pub use config::RuntimeConfig;
pub use error::KurierError;
pub use sink::CallbackSink;
pub use types::*;
