//! Benchmarks for change-notification fan-out.
//!
//! Run with: cargo bench -p tether-bind

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tether_bind::{Bindable, Subscription};

/// Hub with `n` counting listeners attached.
fn make_hub(n: usize) -> (Bindable, Vec<Subscription>, Rc<Cell<u64>>) {
    let hub = Bindable::new();
    let hits = Rc::new(Cell::new(0u64));
    let subs = (0..n)
        .map(|_| {
            let hits = Rc::clone(&hits);
            hub.subscribe(move |_| hits.set(hits.get() + 1))
        })
        .collect();
    (hub, subs, hits)
}

fn bench_raise_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind/raise_fanout");

    for n in [1, 8, 64, 256] {
        let (hub, _subs, _hits) = make_hub(n);
        group.bench_with_input(BenchmarkId::new("listeners", n), &hub, |b, hub| {
            b.iter(|| black_box(hub.raise("value")))
        });
    }

    group.finish();
}

fn bench_dependent_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind/dependent_chain");
    const NAMES: [&str; 9] = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8"];

    for len in [2usize, 4, 8] {
        let (hub, _subs, _hits) = make_hub(4);
        for pair in NAMES[..len + 1].windows(2) {
            hub.register_dependent(pair[0], pair[1]).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("depth", len), &hub, |b, hub| {
            b.iter(|| black_box(hub.raise(NAMES[0])))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_raise_fanout, bench_dependent_chain);
criterion_main!(benches);
