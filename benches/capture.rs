// SPDX-License-Identifier: MPL-2.0
use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use diaglog::config::{DiagnosticsConfig, StackTraceMode};
use diaglog::diagnostics::LogStore;
use diaglog::storage::MemoryStore;
use serde_json::json;

fn store_with(stack_traces: StackTraceMode) -> LogStore {
    let config = DiagnosticsConfig {
        stack_traces,
        ..DiagnosticsConfig::default()
    };
    LogStore::new(&config, Arc::new(MemoryStore::new()))
}

fn capture_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture");

    let plain = store_with(StackTraceMode::Off);
    group.bench_function("info_without_stack_trace", |b| {
        b.iter(|| plain.info(black_box("benchmark entry"), Some(json!({"n": 1}))));
    });

    let traced = store_with(StackTraceMode::All);
    group.bench_function("info_with_stack_trace", |b| {
        b.iter(|| traced.info(black_box("benchmark entry"), Some(json!({"n": 1}))));
    });

    let network = store_with(StackTraceMode::Off);
    group.bench_function("record_network", |b| {
        b.iter(|| network.record_network("GET", black_box("/api/items"), 200, 12, None));
    });

    let mirrored = store_with(StackTraceMode::Off);
    group.bench_function("error_with_mirror", |b| {
        b.iter(|| mirrored.error(black_box("benchmark error"), None, None));
    });

    group.finish();
}

criterion_group!(benches, capture_benchmark);
criterion_main!(benches);
