use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use luga::{normalize_many, normalize_one, parse_prediction_line, BatchOptions};
use ndarray::{array, Array1};

const CODES: [&str; 8] = ["en", "de", "fr", "es", "ru", "zh", "ja", "pt"];

fn batch(size: usize) -> (Vec<String>, Vec<Array1<f32>>) {
    let labels = (0..size)
        .map(|i| format!("__label__{}", CODES[i % CODES.len()]))
        .collect();
    let confidences = (0..size)
        .map(|i| array![(i % 100) as f32 / 100.0])
        .collect();
    (labels, confidences)
}

fn bench_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("Single");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("accepted", |b| {
        let prediction = ("__label__en", array![0.9827f32]);
        b.iter(|| normalize_one(black_box(&prediction), 0.5).unwrap())
    });

    group.bench_function("rejected", |b| {
        let prediction = ("__label__xx", array![0.12f32]);
        b.iter(|| normalize_one(black_box(&prediction), 0.5).unwrap())
    });

    group.bench_function("parse_line", |b| {
        b.iter(|| parse_prediction_line(black_box("__label__en 0.98271")).unwrap())
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for size in [1usize, 10, 100, 1000] {
        let (labels, confidences) = batch(size);

        group.bench_with_input(BenchmarkId::new("languages", size), &size, |b, _| {
            b.iter(|| normalize_many(&labels, &confidences, BatchOptions::new()).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("name_array", size), &size, |b, _| {
            let options = BatchOptions::new()
                .with_only_language(true)
                .with_to_array(true);
            b.iter(|| normalize_many(&labels, &confidences, options).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single, bench_batch);
criterion_main!(benches);
