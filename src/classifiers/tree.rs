use std::collections::BTreeMap;

use crate::classifier::{check_trainable, Classifier, Model, TrainingError};
use crate::classifiers::knn::majority_class;
use crate::dataset::{ClassId, ColumnData, Dataset};

const MIN_GAIN: f64 = 1e-9;

/// CART-style decision tree: Gini impurity, axis splits on numeric
/// columns, equality splits on categorical ones. Depth and leaf-size
/// stops keep it from memorizing isolated rows.
#[derive(Debug, Clone)]
pub struct Cart {
    pub max_depth: usize,
    pub min_leaf: usize,
}

impl Default for Cart {
    fn default() -> Self {
        Self { max_depth: 8, min_leaf: 3 }
    }
}

impl Classifier for Cart {
    fn name(&self) -> &str {
        "cart"
    }

    fn train(
        &self,
        ds: &Dataset,
        rows: &[usize],
        label_col: usize,
    ) -> Result<Box<dyn Model>, TrainingError> {
        check_trainable("cart", ds, rows, label_col)?;
        let root = self.build(ds, rows, label_col, self.max_depth);
        Ok(Box::new(CartModel { root }))
    }
}

enum Node {
    Leaf(ClassId),
    /// `value <= threshold` goes left.
    NumSplit { col: usize, threshold: f64, left: Box<Node>, right: Box<Node> },
    /// `code == split code` goes left.
    CatSplit { col: usize, code: ClassId, eq: Box<Node>, ne: Box<Node> },
}

enum Split {
    Num { col: usize, threshold: f64 },
    Cat { col: usize, code: ClassId },
}

impl Cart {
    fn build(&self, ds: &Dataset, rows: &[usize], label_col: usize, depth: usize) -> Node {
        let leaf = Node::Leaf(majority_class(ds, rows, label_col));
        if depth == 0 || rows.len() < 2 * self.min_leaf || is_pure(ds, rows, label_col) {
            return leaf;
        }
        let split = match self.best_split(ds, rows, label_col) {
            Some(s) => s,
            None => return leaf,
        };
        match split {
            Split::Num { col, threshold } => {
                let (l, r) = partition(rows, |row| {
                    ds.numeric_value(col, row).map(|v| v <= threshold).unwrap_or(false)
                });
                Node::NumSplit {
                    col,
                    threshold,
                    left: Box::new(self.build(ds, &l, label_col, depth - 1)),
                    right: Box::new(self.build(ds, &r, label_col, depth - 1)),
                }
            }
            Split::Cat { col, code } => {
                let (l, r) =
                    partition(rows, |row| ds.category_code(col, row) == Some(code));
                Node::CatSplit {
                    col,
                    code,
                    eq: Box::new(self.build(ds, &l, label_col, depth - 1)),
                    ne: Box::new(self.build(ds, &r, label_col, depth - 1)),
                }
            }
        }
    }

    /// Best Gini-gain split over every feature column. Columns and
    /// candidate thresholds are visited in a fixed order and only a
    /// strictly better gain replaces the incumbent, so the choice is
    /// deterministic.
    fn best_split(&self, ds: &Dataset, rows: &[usize], label_col: usize) -> Option<Split> {
        let parent = gini(ds, rows, label_col);
        let mut best: Option<(f64, Split)> = None;
        let mut consider = |gain: f64, candidate: Split, sizes: (usize, usize)| {
            if sizes.0 < self.min_leaf || sizes.1 < self.min_leaf {
                return;
            }
            if gain > MIN_GAIN && best.as_ref().map(|(g, _)| gain > *g).unwrap_or(true) {
                best = Some((gain, candidate));
            }
        };
        for (col, c) in ds.columns().iter().enumerate() {
            if col == label_col {
                continue;
            }
            match &c.data {
                ColumnData::Numeric(values) => {
                    let mut seen: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
                    seen.sort_by(|a, b| a.total_cmp(b));
                    seen.dedup();
                    for pair in seen.windows(2) {
                        let threshold = (pair[0] + pair[1]) / 2.0;
                        let (l, r) = partition(rows, |row| values[row] <= threshold);
                        let gain = parent - weighted_gini(ds, &l, &r, label_col);
                        consider(gain, Split::Num { col, threshold }, (l.len(), r.len()));
                    }
                }
                ColumnData::Categorical { codes, .. } => {
                    let mut present: Vec<ClassId> = rows.iter().map(|&r| codes[r]).collect();
                    present.sort_unstable();
                    present.dedup();
                    for code in present {
                        let (l, r) = partition(rows, |row| codes[row] == code);
                        let gain = parent - weighted_gini(ds, &l, &r, label_col);
                        consider(gain, Split::Cat { col, code }, (l.len(), r.len()));
                    }
                }
            }
        }
        best.map(|(_, s)| s)
    }
}

fn partition<F: Fn(usize) -> bool>(rows: &[usize], goes_left: F) -> (Vec<usize>, Vec<usize>) {
    let mut l = Vec::new();
    let mut r = Vec::new();
    for &row in rows {
        if goes_left(row) {
            l.push(row);
        } else {
            r.push(row);
        }
    }
    (l, r)
}

fn is_pure(ds: &Dataset, rows: &[usize], label_col: usize) -> bool {
    let first = ds.class_of(rows[0], label_col);
    rows.iter().all(|&r| ds.class_of(r, label_col) == first)
}

fn gini(ds: &Dataset, rows: &[usize], label_col: usize) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mut counts: BTreeMap<ClassId, usize> = BTreeMap::new();
    for &r in rows {
        *counts.entry(ds.class_of(r, label_col)).or_insert(0) += 1;
    }
    let n = rows.len() as f64;
    1.0 - counts.values().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn weighted_gini(ds: &Dataset, l: &[usize], r: &[usize], label_col: usize) -> f64 {
    let n = (l.len() + r.len()) as f64;
    (l.len() as f64 / n) * gini(ds, l, label_col) + (r.len() as f64 / n) * gini(ds, r, label_col)
}

struct CartModel {
    root: Node,
}

impl Model for CartModel {
    fn predict(&self, ds: &Dataset, row: usize) -> ClassId {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(class) => return *class,
                Node::NumSplit { col, threshold, left, right } => {
                    let v = ds.numeric_value(*col, row).unwrap_or(f64::NAN);
                    node = if v <= *threshold { left } else { right };
                }
                Node::CatSplit { col, code, eq, ne } => {
                    node = if ds.category_code(*col, row) == Some(*code) { eq } else { ne };
                }
            }
        }
    }
}
