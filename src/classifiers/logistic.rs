use crate::classifier::{check_trainable, Classifier, Model, TrainingError};
use crate::dataset::{ClassId, ColumnData, Dataset};
use crate::quark::StringTable;

/// One-vs-rest logistic regression over one-hot encoded features,
/// trained by full-batch gradient descent from zero weights. Numeric
/// columns are range-normalized; every run on the same rows produces the
/// same model.
#[derive(Debug, Clone)]
pub struct Logistic {
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for Logistic {
    fn default() -> Self {
        Self { learning_rate: 0.3, epochs: 200 }
    }
}

enum Slot {
    Num { col: usize, min: f64, range: f64 },
    Cat { col: usize, code: ClassId },
}

fn feature_slots(ds: &Dataset, label_col: usize) -> Vec<Slot> {
    let mut slots = Vec::new();
    for (col, c) in ds.columns().iter().enumerate() {
        if col == label_col {
            continue;
        }
        match &c.data {
            ColumnData::Numeric(v) => {
                let mut lo = f64::INFINITY;
                let mut hi = f64::NEG_INFINITY;
                for &x in v {
                    lo = lo.min(x);
                    hi = hi.max(x);
                }
                let range = if hi > lo { hi - lo } else { 1.0 };
                slots.push(Slot::Num { col, min: lo, range });
            }
            ColumnData::Categorical { names, .. } => {
                for code in 0..names.len() {
                    slots.push(Slot::Cat { col, code });
                }
            }
        }
    }
    slots
}

fn encode(ds: &Dataset, slots: &[Slot], row: usize, out: &mut [f64]) {
    for (j, slot) in slots.iter().enumerate() {
        out[j] = match slot {
            Slot::Num { col, min, range } => {
                (ds.numeric_value(*col, row).unwrap_or(*min) - min) / range
            }
            Slot::Cat { col, code } => {
                if ds.category_code(*col, row) == Some(*code) {
                    1.0
                } else {
                    0.0
                }
            }
        };
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for Logistic {
    fn name(&self) -> &str {
        "logistic"
    }

    fn train(
        &self,
        ds: &Dataset,
        rows: &[usize],
        label_col: usize,
    ) -> Result<Box<dyn Model>, TrainingError> {
        check_trainable("logistic", ds, rows, label_col)?;
        let slots = feature_slots(ds, label_col);
        let mut classes: Vec<ClassId> =
            rows.iter().map(|&r| ds.class_of(r, label_col)).collect();
        classes.sort_unstable();
        classes.dedup();

        let mut x = vec![0.0; slots.len()];
        let mut encoded: Vec<Vec<f64>> = Vec::with_capacity(rows.len());
        for &r in rows {
            encode(ds, &slots, r, &mut x);
            encoded.push(x.clone());
        }

        let mut weights = vec![vec![0.0; slots.len()]; classes.len()];
        let mut bias = vec![0.0; classes.len()];
        let n = rows.len() as f64;
        for (ci, &class) in classes.iter().enumerate() {
            let w = &mut weights[ci];
            let b = &mut bias[ci];
            for _ in 0..self.epochs {
                let mut gw = vec![0.0; slots.len()];
                let mut gb = 0.0;
                for (ri, &r) in rows.iter().enumerate() {
                    let features = &encoded[ri];
                    let z = *b
                        + w.iter().zip(features).map(|(wj, xj)| wj * xj).sum::<f64>();
                    let y = if ds.class_of(r, label_col) == class { 1.0 } else { 0.0 };
                    let err = sigmoid(z) - y;
                    for (gj, xj) in gw.iter_mut().zip(features) {
                        *gj += err * xj;
                    }
                    gb += err;
                }
                for (wj, gj) in w.iter_mut().zip(&gw) {
                    *wj -= self.learning_rate * gj / n;
                }
                *b -= self.learning_rate * gb / n;
            }
        }

        Ok(Box::new(LogisticModel { slots, classes, weights, bias }))
    }
}

struct LogisticModel {
    slots: Vec<Slot>,
    classes: Vec<ClassId>,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl Model for LogisticModel {
    fn predict(&self, ds: &Dataset, row: usize) -> ClassId {
        let mut x = vec![0.0; self.slots.len()];
        encode(ds, &self.slots, row, &mut x);
        let mut winner = self.classes[0];
        let mut best = f64::NEG_INFINITY;
        for (ci, &class) in self.classes.iter().enumerate() {
            let z = self.bias[ci]
                + self.weights[ci].iter().zip(&x).map(|(w, xj)| w * xj).sum::<f64>();
            if z > best {
                best = z;
                winner = class;
            }
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn clusters() -> Dataset {
        Dataset::new(vec![
            Column::numeric("x", vec![0.0, 0.2, 0.4, 9.0, 9.2, 9.4]),
            Column::categorical("class", &["a", "a", "a", "b", "b", "b"]),
        ])
        .expect("valid dataset")
    }

    #[test]
    fn separates_clusters() {
        let ds = clusters();
        let rows: Vec<usize> = (0..6).collect();
        let model = Logistic::default().train(&ds, &rows, 1).expect("train");
        for &r in &rows {
            assert_eq!(model.predict(&ds, r), ds.class_of(r, 1), "row {}", r);
        }
    }

    #[test]
    fn deterministic() {
        let ds = clusters();
        let rows: Vec<usize> = (0..6).collect();
        let m1 = Logistic::default().train(&ds, &rows, 1).expect("train");
        let m2 = Logistic::default().train(&ds, &rows, 1).expect("train");
        for &r in &rows {
            assert_eq!(m1.predict(&ds, r), m2.predict(&ds, r));
        }
    }
}
