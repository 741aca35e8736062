use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noisefilters::{Column, Dataset, Filter, LabelColumn, Rnn};

fn two_clusters(n: usize) -> Dataset {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let half = n / 2;
    for i in 0..n {
        let offset = if i < half { 0.0 } else { 6.0 };
        x.push(offset + (i % 10) as f64 * 0.2);
        y.push(offset + (i / 10) as f64 * 0.1);
        labels.push(if i < half { "a" } else { "b" });
    }
    Dataset::new(vec![
        Column::numeric("x", x),
        Column::numeric("y", y),
        Column::categorical("class", &labels),
    ])
    .expect("valid dataset")
}

fn rnn_benchmark(c: &mut Criterion) {
    let ds = two_clusters(200);
    assert_eq!(200, ds.len(), "row count mismatch");
    c.bench_function("rnn", |b| {
        b.iter(|| Rnn.apply(black_box(&ds), LabelColumn::Last).expect("rnn failed"))
    });
}

criterion_group! {
    name = benchmarks;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = rnn_benchmark
}
criterion_main!(benchmarks);
