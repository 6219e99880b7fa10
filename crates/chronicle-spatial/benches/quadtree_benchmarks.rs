//! Quadtree insert/query throughput at representative world population
//! sizes.
//!
//! Run with: `cargo bench --bench quadtree_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chronicle_spatial::quadtree::{Quadtree, Rect};

fn populated(n: usize) -> Quadtree<u64> {
    let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 4096.0, 4096.0), 8, 8);
    let mut seed = 1u64;
    for id in 0..n as u64 {
        // xorshift -- deterministic, cheap, no external dependency.
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let x = (seed % 4096) as f64;
        let y = ((seed >> 16) % 4096) as f64;
        tree.insert(x, y, id);
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_insert");
    for &n in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| populated(black_box(n)));
        });
    }
    group.finish();
}

fn bench_query_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_query_radius");
    for &n in &[100usize, 1_000, 10_000] {
        let tree = populated(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(tree.query_radius(2048.0, 2048.0, 200.0)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query_radius);
criterion_main!(benches);
