//! Criterion microbenches for Darwin document building.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - Document building (build_json)
//! - Full string rendering (to_darwin_string)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use darex::export::darwin::{build_json, to_darwin_string};
use darex::model::{Annotation, AnnotationClass, AnnotationFile, DataMap, SubAnnotation};
use serde_json::json;

/// A synthetic annotation file with `count` polygon annotations.
fn synthetic_file(count: usize) -> AnnotationFile {
    let mut file = AnnotationFile::new("img.png")
        .with_seq(1)
        .with_dimensions(1920, 1080)
        .with_urls("https://example.com/img.png", "https://example.com/thumb");

    for index in 0..count {
        let mut data = DataMap::new();
        let offset = index as f64;
        data.insert(
            "points".to_string(),
            json!([
                {"x": offset, "y": 0.0},
                {"x": offset + 10.0, "y": 0.0},
                {"x": offset + 10.0, "y": 10.0},
                {"x": offset, "y": 10.0},
            ]),
        );
        file = file.with_annotation(
            Annotation::new(AnnotationClass::new("car", "polygon"), data)
                .with_sub(SubAnnotation::instance_id(index as u64)),
        );
    }
    file
}

/// Benchmark bare document building.
fn bench_build_json(c: &mut Criterion) {
    let file = synthetic_file(100);

    let mut group = c.benchmark_group("darwin_build");
    group.throughput(Throughput::Elements(file.annotations.len() as u64));

    group.bench_function("build_json", |b| {
        b.iter(|| {
            let document = build_json(black_box(&file)).unwrap();
            black_box(document)
        })
    });

    group.finish();
}

/// Benchmark document building plus pretty-printing.
fn bench_to_darwin_string(c: &mut Criterion) {
    let file = synthetic_file(100);

    let mut group = c.benchmark_group("darwin_write");
    group.throughput(Throughput::Elements(file.annotations.len() as u64));

    group.bench_function("to_darwin_string", |b| {
        b.iter(|| {
            let rendered = to_darwin_string(black_box(&file)).unwrap();
            black_box(rendered)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_build_json, bench_to_darwin_string);
criterion_main!(benches);
