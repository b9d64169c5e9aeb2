//! Dispatch-overhead benchmarks for the `anyfn` package.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use anyfn::Function;
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn entrypoint(c: &mut Criterion) {
    let mut construct = c.benchmark_group("fn_construct");

    construct.bench_function("inline", |b| {
        b.iter(|| {
            let offset = black_box(5_i32);
            Function::<fn(i32) -> i32>::new(move |x: i32| x + offset)
        });
    });

    construct.bench_function("boxed", |b| {
        b.iter(|| {
            let weights = black_box([5_i64; 8]);
            Function::<fn(i32) -> i32>::new(move |x: i32| {
                x + i32::try_from(weights[0]).unwrap()
            })
        });
    });

    construct.finish();

    let mut call = c.benchmark_group("fn_call");

    let offset = 5_i32;
    let mut direct = move |x: i32| x + offset;
    call.bench_function("direct_closure", |b| {
        b.iter(|| direct(black_box(10)));
    });

    let mut inline_fn: Function<fn(i32) -> i32> = Function::new(move |x: i32| x + offset);
    call.bench_function("inline", |b| {
        b.iter(|| inline_fn.call((black_box(10),)));
    });

    let weights = [5_i64; 8];
    let mut boxed_fn: Function<fn(i32) -> i32> = Function::new(move |x: i32| {
        x + i32::try_from(weights[0]).unwrap()
    });
    call.bench_function("boxed", |b| {
        b.iter(|| boxed_fn.call((black_box(10),)));
    });

    call.finish();
}
