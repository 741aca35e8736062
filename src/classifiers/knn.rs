use std::collections::BTreeMap;

use crate::classifier::{check_trainable, Classifier, Model, TrainingError};
use crate::dataset::{ClassId, ColumnData, Dataset};

/// Per-column value spans used to normalize numeric differences.
/// Categorical columns and the label column carry a zero span.
pub(crate) fn column_ranges(ds: &Dataset, label_col: usize) -> Vec<f64> {
    ds.columns()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == label_col {
                return 0.0;
            }
            match &c.data {
                ColumnData::Numeric(v) => {
                    let mut lo = f64::INFINITY;
                    let mut hi = f64::NEG_INFINITY;
                    for &x in v {
                        lo = lo.min(x);
                        hi = hi.max(x);
                    }
                    if hi > lo {
                        hi - lo
                    } else {
                        0.0
                    }
                }
                ColumnData::Categorical { .. } => 0.0,
            }
        })
        .collect()
}

/// Squared heterogeneous distance over the feature columns: numeric
/// differences normalized by the column span, categorical mismatch counts
/// as one. Ordering-equivalent to the usual HEOM metric.
pub(crate) fn distance(
    ds: &Dataset,
    ranges: &[f64],
    label_col: usize,
    a: usize,
    b: usize,
) -> f64 {
    let mut acc = 0.0;
    for (i, c) in ds.columns().iter().enumerate() {
        if i == label_col {
            continue;
        }
        let d = match &c.data {
            ColumnData::Numeric(v) => {
                if ranges[i] > 0.0 {
                    (v[a] - v[b]).abs() / ranges[i]
                } else {
                    0.0
                }
            }
            ColumnData::Categorical { codes, .. } => {
                if codes[a] == codes[b] {
                    0.0
                } else {
                    1.0
                }
            }
        };
        acc += d * d;
    }
    acc
}

/// Nearest candidate to `target`. Distance ties resolve to the lowest row
/// index.
pub(crate) fn nearest<I>(
    ds: &Dataset,
    ranges: &[f64],
    label_col: usize,
    candidates: I,
    target: usize,
) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut best: Option<(f64, usize)> = None;
    for r in candidates {
        let d = distance(ds, ranges, label_col, r, target);
        let better = match best {
            None => true,
            Some((bd, br)) => d < bd || (d == bd && r < br),
        };
        if better {
            best = Some((d, r));
        }
    }
    best.map(|(_, r)| r)
}

/// The `k` candidates nearest to `target`, ordered by distance then row
/// index.
pub(crate) fn k_nearest(
    ds: &Dataset,
    ranges: &[f64],
    label_col: usize,
    candidates: &[usize],
    target: usize,
    k: usize,
) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = candidates
        .iter()
        .map(|&r| (distance(ds, ranges, label_col, r, target), r))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    scored.into_iter().take(k).map(|(_, r)| r).collect()
}

/// Majority class among `rows`; count ties resolve to the lowest code.
pub(crate) fn majority_class(ds: &Dataset, rows: &[usize], label_col: usize) -> ClassId {
    let mut counts: BTreeMap<ClassId, usize> = BTreeMap::new();
    for &r in rows {
        *counts.entry(ds.class_of(r, label_col)).or_insert(0) += 1;
    }
    let mut winner = 0;
    let mut most = 0;
    for (code, n) in counts {
        if n > most {
            most = n;
            winner = code;
        }
    }
    winner
}

/// k-nearest-neighbor classifier over the heterogeneous distance above.
/// A queried row that is part of the training rows matches itself at
/// distance zero.
#[derive(Debug, Clone)]
pub struct KNearest {
    pub k: usize,
}

impl KNearest {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Classifier for KNearest {
    fn name(&self) -> &str {
        "knn"
    }

    fn train(
        &self,
        ds: &Dataset,
        rows: &[usize],
        label_col: usize,
    ) -> Result<Box<dyn Model>, TrainingError> {
        if self.k == 0 {
            return Err(TrainingError::new("knn", "k must be positive"));
        }
        check_trainable("knn", ds, rows, label_col)?;
        Ok(Box::new(KnnModel {
            k: self.k,
            label_col,
            rows: rows.to_vec(),
            ranges: column_ranges(ds, label_col),
        }))
    }
}

struct KnnModel {
    k: usize,
    label_col: usize,
    rows: Vec<usize>,
    ranges: Vec<f64>,
}

impl Model for KnnModel {
    fn predict(&self, ds: &Dataset, row: usize) -> ClassId {
        let hood = k_nearest(ds, &self.ranges, self.label_col, &self.rows, row, self.k);
        majority_class(ds, &hood, self.label_col)
    }
}
