// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job table hot-path benchmarks.

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use kurier_core::sink::CallbackSink;
use kurier_runtime::table::JobTable;

/// Sink that discards deliveries; the bench measures the table, not the
/// callback.
struct DropSink;

impl CallbackSink for DropSink {
    fn resolve(&self, _value: String) {}
    fn reject(&self, _error: String) {}
}

fn bench_register_complete_cycle(c: &mut Criterion) {
    let table = JobTable::new(1024);
    let payload = vec![0u8; 256];

    c.bench_function("register_running_complete", |b| {
        b.iter(|| {
            let sink = Arc::new(DropSink);
            let job = table
                .register("echo", payload.clone(), sink)
                .expect("register");
            table.mark_running(job.handle).expect("mark running");
            table
                .complete(job.handle, Ok(String::from("ok")))
                .expect("complete");
        })
    });
}

fn bench_register_cancel(c: &mut Criterion) {
    let table = JobTable::new(1024);

    c.bench_function("register_cancel", |b| {
        b.iter(|| {
            let sink = Arc::new(DropSink);
            let job = table.register("echo", vec![], sink).expect("register");
            table
                .cancel(
                    job.handle,
                    &kurier_core::KurierError::Cancelled("bench".into()),
                )
                .expect("cancel");
        })
    });
}

criterion_group!(
    benches,
    bench_register_complete_cycle,
    bench_register_cancel
);
criterion_main!(benches);
