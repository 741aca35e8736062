use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noisefilters::{Column, Dataset, Filter, Inffc, InffcConfig, LabelColumn};

fn noisy_clusters(n: usize) -> Dataset {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let half = n / 2;
    for i in 0..n {
        let offset = if i < half { 0.0 } else { 6.0 };
        x.push(offset + (i % 10) as f64 * 0.2);
        y.push(offset + (i / 10) as f64 * 0.1);
        let clean = if i < half { "a" } else { "b" };
        let noisy = if i < half { "b" } else { "a" };
        labels.push(if i % 17 == 5 { noisy } else { clean });
    }
    Dataset::new(vec![
        Column::numeric("x", x),
        Column::numeric("y", y),
        Column::categorical("class", &labels),
    ])
    .expect("valid dataset")
}

fn inffc_benchmark(c: &mut Criterion) {
    let ds = noisy_clusters(200);
    let filter = Inffc::with_default_ensemble(InffcConfig::default()).expect("config");
    c.bench_function("inffc", |b| {
        b.iter(|| filter.apply(black_box(&ds), LabelColumn::Last).expect("inffc failed"))
    });
}

criterion_group! {
    name = benchmarks;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = inffc_benchmark
}
criterion_main!(benchmarks);
