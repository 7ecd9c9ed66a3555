//! Benchmarks for fuzzy product-name resolution.
//!
//! Every product action scans the whole catalog, so resolution cost grows
//! linearly with catalog size. These benches track that cost for realistic
//! shop catalogs.

use std::time::Duration;

use chaton_core::matching::{similarity, ProductResolver};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const ADJECTIVES: &[&str] = &[
    "Classic", "Ceramic", "Wireless", "Organic", "Deluxe", "Compact", "Vintage", "Premium",
];
const NOUNS: &[&str] = &[
    "Mug", "Headphones", "Tea Blend", "Backpack", "Desk Lamp", "Notebook", "Water Bottle",
];

/// Build a catalog of `n` `(owner_id, name)` pairs with varied names.
fn make_catalog(n: usize) -> Vec<(i64, String)> {
    (0..n)
        .map(|i| {
            let adj = ADJECTIVES[i % ADJECTIVES.len()];
            let noun = NOUNS[(i / ADJECTIVES.len()) % NOUNS.len()];
            ((i % 25) as i64 + 1, format!("{} {} {}", adj, noun, i))
        })
        .collect()
}

fn bench_similarity(c: &mut Criterion) {
    c.bench_function("similarity_short_names", |b| {
        b.iter(|| similarity(black_box("wireless headphones"), black_box("Wireless Headphone 12")))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = ProductResolver::default();
    let mut group = c.benchmark_group("resolve_catalog");
    group.measurement_time(Duration::from_secs(5));

    for size in [50usize, 500, 5_000] {
        let catalog = make_catalog(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &catalog, |b, catalog| {
            b.iter(|| resolver.resolve(black_box("ceramic mug"), catalog).len())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_similarity, bench_resolve);
criterion_main!(benches);
