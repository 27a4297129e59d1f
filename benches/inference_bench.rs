//! Benchmarks for schema inference operations
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use docdb_schema::document::{Document, ValueKind};
use docdb_schema::inference::{IdentifierNamer, SchemaGenerator, SqlType, promote};

/// Generate sample order documents for benchmarking
fn generate_sample_records(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                r#"{{"_id": {{"$oid": "65a1b2c3d4e5f607{:08x}"}}, "customer": {{"name": "User {}", "email": "user{}@example.com", "address": {{"city": "City {}", "zip": "{:05}"}}}}, "total": {}, "paid": {}, "placed": {{"$date": "2024-01-15T10:30:00Z"}}, "items": [{{"sku": "SKU-{}", "qty": {}}}, {{"sku": "SKU-{}", "qty": 1}}], "tags": ["t{}", "t{}"], "grid": [[{}, {}], [{}]]}}"#,
                i,
                i,
                i,
                i % 100,
                i % 100000,
                10.0 + (i as f64 * 1.5),
                i % 2 == 0,
                i,
                1 + i % 5,
                i + 1,
                i % 7,
                i % 11,
                i,
                i + 1,
                i + 2
            )
        })
        .collect()
}

/// Benchmark schema generation with varying document counts
fn bench_schema_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_generation");

    for count in [10, 100, 500].iter() {
        let records = generate_sample_records(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(
            BenchmarkId::new("add_json", count),
            &records,
            |b, records| {
                b.iter(|| {
                    let mut generator = SchemaGenerator::new("orders");
                    for record in records {
                        let _ = generator.add_json(record);
                    }
                    black_box(generator.finalize())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark flattening pre-parsed documents
fn bench_flattening(c: &mut Criterion) {
    let mut group = c.benchmark_group("flattening");

    for count in [100, 1000].iter() {
        let documents: Vec<Document> = generate_sample_records(*count)
            .iter()
            .filter_map(|r| Document::from_json_str(r).ok())
            .collect();
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(
            BenchmarkId::new("add_document", count),
            &documents,
            |b, documents| {
                b.iter(|| {
                    let mut generator = SchemaGenerator::new("orders");
                    for document in documents {
                        let _ = generator.add_document(document);
                    }
                    black_box(generator.finalize())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark type promotion
fn bench_promotion(c: &mut Criterion) {
    let mut group = c.benchmark_group("promotion");

    group.bench_function("fold_all_kinds", |b| {
        b.iter(|| {
            black_box(
                ValueKind::ALL
                    .iter()
                    .fold(SqlType::Null, |t, k| promote(t, *k)),
            )
        });
    });

    group.bench_function("widen_numeric", |b| {
        b.iter(|| black_box(promote(SqlType::Integer, ValueKind::Double)));
    });

    group.finish();
}

/// Benchmark identifier shortening
fn bench_naming(c: &mut Criterion) {
    let mut group = c.benchmark_group("naming");

    let paths: Vec<String> = (0..100)
        .map(|i| format!("orders.customer_{}.shipping_address.lines.first_line", i))
        .collect();

    group.bench_function("shorten_colliding", |b| {
        b.iter(|| {
            let mut namer = IdentifierNamer::new();
            for path in &paths {
                let _ = black_box(namer.to_name(path, 24));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_schema_generation,
    bench_flattening,
    bench_promotion,
    bench_naming
);
criterion_main!(benches);
