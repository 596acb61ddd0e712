//! Benchmarks for hook dispatch.
//!
//! Measures the per-call cost of running a method's hook chain:
//! - Passthrough (only the original invocation in the chain)
//! - A single before/after handler
//! - Ten handlers at mixed priorities
//! - A replacement that skips the original
//! - Taking a chain snapshot

extern crate hookbridge;

use criterion::{criterion_group, criterion_main, Criterion};
use hookbridge::prelude::*;
use std::hint::black_box;

fn bridge() -> HookBridge {
    HookBridge::new(FnInterceptor::new(|_, _, args| {
        Ok(Value::from(args.len() as i32))
    }))
}

fn method() -> MethodId {
    MethodId::method("com.example.Bench", "run", "(II)I")
}

fn args() -> Vec<Value> {
    vec![Value::from(1), Value::from(2)]
}

fn noop_hook() -> ClosureHook {
    ClosureHook::new()
        .before(|param| {
            black_box(&param.args);
            Ok(())
        })
        .after(|param| {
            black_box(param.result());
            Ok(())
        })
}

/// Benchmark dispatch through a chain holding only the original.
fn bench_dispatch_passthrough(c: &mut Criterion) {
    let bridge = bridge();
    let method = method();
    let handler = Handler::method(Priority::DEFAULT, noop_hook());
    bridge.hook_method(&method, &handler).unwrap();
    bridge.unhook_method(&method, &handler);

    c.bench_function("dispatch_passthrough", |b| {
        b.iter(|| {
            let outcome = bridge.dispatch(black_box(&method), None, args()).unwrap();
            black_box(outcome)
        });
    });
}

/// Benchmark dispatch with one handler around the original.
fn bench_dispatch_single_handler(c: &mut Criterion) {
    let bridge = bridge();
    let method = method();
    bridge
        .hook_method(&method, &Handler::method(Priority::DEFAULT, noop_hook()))
        .unwrap();

    c.bench_function("dispatch_single_handler", |b| {
        b.iter(|| {
            let outcome = bridge.dispatch(black_box(&method), None, args()).unwrap();
            black_box(outcome)
        });
    });
}

/// Benchmark dispatch with ten handlers of mixed priority.
fn bench_dispatch_ten_handlers(c: &mut Criterion) {
    let bridge = bridge();
    let method = method();
    for i in 0..10 {
        bridge
            .hook_method(&method, &Handler::method(Priority(i % 3), noop_hook()))
            .unwrap();
    }

    c.bench_function("dispatch_ten_handlers", |b| {
        b.iter(|| {
            let outcome = bridge.dispatch(black_box(&method), None, args()).unwrap();
            black_box(outcome)
        });
    });
}

/// Benchmark a replacement, which resolves the call before the original runs.
fn bench_dispatch_replacement(c: &mut Criterion) {
    let bridge = bridge();
    let method = method();
    bridge
        .hook_method(&method, &Handler::returns_constant(Priority::DEFAULT, Value::from(7)))
        .unwrap();

    c.bench_function("dispatch_replacement", |b| {
        b.iter(|| {
            let outcome = bridge.dispatch(black_box(&method), None, args()).unwrap();
            black_box(outcome)
        });
    });
}

/// Benchmark taking a snapshot of a populated chain.
fn bench_chain_snapshot(c: &mut Criterion) {
    let bridge = bridge();
    let method = method();
    for _ in 0..10 {
        bridge
            .hook_method(&method, &Handler::method(Priority::DEFAULT, noop_hook()))
            .unwrap();
    }
    let chain = bridge.registry().get(&method).unwrap();

    c.bench_function("chain_snapshot", |b| {
        b.iter(|| black_box(chain.snapshot()));
    });
}

criterion_group!(
    benches,
    bench_dispatch_passthrough,
    bench_dispatch_single_handler,
    bench_dispatch_ten_handlers,
    bench_dispatch_replacement,
    bench_chain_snapshot,
);
criterion_main!(benches);
