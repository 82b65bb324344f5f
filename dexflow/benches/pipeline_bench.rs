//! Benchmarks for source sanitation and dex listing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dexflow::execution::{DexClassInspector, DexFile};
use dexflow::sanitize::sanitize_source;
use dexflow::testing::dex_with_classes;

fn sanitize_benchmark(c: &mut Criterion) {
    let clean = "class Main { void f() { System.out.println(1); } }\n".repeat(200);
    let dirty = "class Main { void f() { System.exit(1); } }\n".repeat(200);

    c.bench_function("sanitize_unchanged", |b| {
        b.iter(|| sanitize_source(black_box(&clean)).len())
    });
    c.bench_function("sanitize_rewrite", |b| {
        b.iter(|| sanitize_source(black_box(&dirty)).len())
    });
}

fn dex_benchmark(c: &mut Criterion) {
    let names: Vec<String> = (0..500).map(|i| format!("Lcom/example/Class{i};")).collect();
    let descriptors: Vec<&str> = names.iter().map(String::as_str).collect();
    let bytes = dex_with_classes(&descriptors);

    c.bench_function("dex_parse", |b| {
        b.iter(|| DexFile::parse(black_box(&bytes)).map(|dex| dex.class_descriptors().len()))
    });
    c.bench_function("dex_listing", |b| {
        b.iter(|| DexClassInspector::listing(black_box(&bytes)).map(|listing| listing.entry_points.len()))
    });
}

criterion_group!(benches, sanitize_benchmark, dex_benchmark);
criterion_main!(benches);
