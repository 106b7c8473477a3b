//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use petcare::prelude::*;
use std::sync::Arc;

const INPUT: &str = "My dog has been vomiting and lethargic for 2 days";

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let driver = Arc::new(TriageDriver::with_defaults());

    c.bench_function("full_run_text_only", |b| {
        b.iter(|| {
            let mut session = TriageSession::start(Arc::clone(&driver), INPUT, Vec::new());
            black_box(runtime.block_on(session.run(INPUT)).ok())
        });
    });

    c.bench_function("full_run_with_image", |b| {
        b.iter(|| {
            let images = vec!["uploads/vomit-photo.jpg".to_string()];
            let mut session = TriageSession::start(Arc::clone(&driver), INPUT, images);
            black_box(runtime.block_on(session.run(INPUT)).ok())
        });
    });

    c.bench_function("single_intake_step", |b| {
        b.iter(|| {
            let mut ctx = AnalysisContext::new(INPUT, Vec::new());
            black_box(runtime.block_on(driver.advance(&mut ctx, INPUT)))
        });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
