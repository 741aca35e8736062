use std::collections::BTreeSet;

use crate::classifiers::knn::{column_ranges, nearest};
use crate::dataset::{Dataset, LabelColumn};
use crate::filter::{Filter, FilterResult};
use crate::Error;

/// Consistent-subset reduction in the style of Gates' reduced nearest
/// neighbor rule: grow a kept set until 1-NN over it reproduces every
/// label, then greedily shrink it. Everything outside the final kept set
/// is removed; labels are never rewritten.
///
/// The procedure is order-dependent by design: seeding and scanning follow
/// the input row order, and reordering the input changes the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rnn;

impl Filter for Rnn {
    fn name(&self) -> &str {
        "rnn"
    }

    fn apply(&self, ds: &Dataset, label: LabelColumn) -> Result<FilterResult, Error> {
        let label_col = ds.resolve_label(label)?;
        if ds.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "seed: dataset has {} rows, need at least 2",
                ds.len()
            )));
        }
        let ranges = column_ranges(ds, label_col);

        let (scanned, pending) = scan(ds, label_col, &ranges)?;
        let kept = minimize(ds, label_col, &ranges, scanned.clone());
        debug_assert!(kept.is_subset(&scanned));
        log::info!(
            "rnn: scan kept {} of {} rows, minimization kept {}",
            scanned.len(),
            ds.len(),
            kept.len()
        );

        let removed: BTreeSet<usize> =
            (0..ds.len()).filter(|r| !kept.contains(r)).map(|r| r + 1).collect();
        let notes = vec![
            format!("scan kept {} rows ({} deferred as redundant)", scanned.len(), pending),
            format!("minimization kept {} rows", kept.len()),
        ];
        FilterResult::new(
            ds,
            label_col,
            removed,
            Default::default(),
            serde_json::json!({ "label_column": label_col }),
            format!("rnn consistent-subset reduction over {} rows", ds.len()),
            notes,
        )
    }
}

fn class_by_1nn(
    ds: &Dataset,
    label_col: usize,
    ranges: &[f64],
    kept: &BTreeSet<usize>,
    row: usize,
) -> Option<usize> {
    nearest(ds, ranges, label_col, kept.iter().copied(), row)
        .map(|nn| ds.class_of(nn, label_col))
}

/// Seed with the first class-boundary pair, then admit every row the
/// current kept set misclassifies, re-checking the deferred rows until a
/// full pass changes nothing. Returns the kept set and how many rows
/// stayed deferred.
fn scan(
    ds: &Dataset,
    label_col: usize,
    ranges: &[f64],
) -> Result<(BTreeSet<usize>, usize), Error> {
    let first_class = ds.class_of(0, label_col);
    let boundary = (1..ds.len())
        .find(|&r| ds.class_of(r, label_col) != first_class)
        .ok_or_else(|| {
            Error::InvalidInput("seed: all instances share a single class".to_string())
        })?;

    let mut kept: BTreeSet<usize> = BTreeSet::new();
    kept.insert(0);
    kept.insert(boundary);
    let mut pending: Vec<usize> = Vec::new();
    for row in 1..ds.len() {
        if row == boundary {
            continue;
        }
        if class_by_1nn(ds, label_col, ranges, &kept, row) == Some(ds.class_of(row, label_col)) {
            pending.push(row);
        } else {
            kept.insert(row);
        }
    }
    loop {
        let mut changed = false;
        pending.retain(|&row| {
            let correct = class_by_1nn(ds, label_col, ranges, &kept, row)
                == Some(ds.class_of(row, label_col));
            if !correct {
                kept.insert(row);
                changed = true;
            }
            correct
        });
        if !changed {
            break;
        }
    }
    Ok((kept, pending.len()))
}

/// Greedy removal pass in ascending row order. A candidate is dropped for
/// good when its class stays represented in the kept set and the kept set
/// without it still classifies every row that has not been dropped so
/// far, the candidate's own label excepted: dropping it declares that
/// label noise. Each test sees the removals already committed in this
/// pass.
fn minimize(
    ds: &Dataset,
    label_col: usize,
    ranges: &[f64],
    mut kept: BTreeSet<usize>,
) -> BTreeSet<usize> {
    let mut dropped: BTreeSet<usize> = BTreeSet::new();
    for candidate in kept.clone() {
        let class = ds.class_of(candidate, label_col);
        kept.remove(&candidate);
        let covered = kept.iter().any(|&r| ds.class_of(r, label_col) == class);
        let consistent = covered
            && (0..ds.len())
                .filter(|r| *r != candidate && !dropped.contains(r))
                .all(|r| {
                    class_by_1nn(ds, label_col, ranges, &kept, r)
                        == Some(ds.class_of(r, label_col))
                });
        if consistent {
            dropped.insert(candidate);
        } else {
            kept.insert(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn boundary_pair() -> Dataset {
        Dataset::new(vec![
            Column::numeric("x", vec![0.0, 1.0]),
            Column::categorical("class", &["a", "b"]),
        ])
        .expect("valid dataset")
    }

    #[test]
    fn minimize_never_grows_the_kept_set() {
        let ds = Dataset::new(vec![
            Column::numeric("x", vec![0.0, 0.1, 0.2, 0.3, 5.0, 5.1, 5.2, 5.3]),
            Column::categorical("class", &["a", "a", "a", "a", "b", "b", "b", "b"]),
        ])
        .expect("valid dataset");
        let ranges = column_ranges(&ds, 1);
        let (scanned, _) = scan(&ds, 1, &ranges).expect("scan");
        let kept = minimize(&ds, 1, &ranges, scanned.clone());
        assert!(kept.is_subset(&scanned));
        assert!(!kept.is_empty());
    }

    #[test]
    fn boundary_pair_survives_minimization() {
        let ds = boundary_pair();
        let ranges = column_ranges(&ds, 1);
        let (scanned, _) = scan(&ds, 1, &ranges).expect("scan");
        let kept = minimize(&ds, 1, &ranges, scanned);
        assert_eq!(kept.len(), 2);
    }
}
