use crate::dataset::{ClassId, Dataset};

/// A trainable classification algorithm supplied by the host.
///
/// `train` receives the dataset, the row subset to learn from, and the
/// resolved label column. The returned model predicts rows of the same
/// dataset; training rows are referenced by index, never copied.
pub trait Classifier {
    fn name(&self) -> &str;

    fn train(
        &self,
        ds: &Dataset,
        rows: &[usize],
        label_col: usize,
    ) -> Result<Box<dyn Model>, TrainingError>;
}

/// A trained model. Predictions must be deterministic functions of the
/// training rows and the queried instance.
pub trait Model {
    fn predict(&self, ds: &Dataset, row: usize) -> ClassId;
}

/// Failure to train on degenerate input (too few rows, a single class,
/// an empty fold).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{classifier}: {reason}")]
pub struct TrainingError {
    pub classifier: String,
    pub reason: String,
}

impl TrainingError {
    pub fn new(classifier: &str, reason: impl Into<String>) -> Self {
        Self { classifier: classifier.to_string(), reason: reason.into() }
    }
}

/// Shared degeneracy check: a classifier needs at least two rows and two
/// distinct classes to fit a decision boundary.
pub(crate) fn check_trainable(
    name: &str,
    ds: &Dataset,
    rows: &[usize],
    label_col: usize,
) -> Result<(), TrainingError> {
    if rows.len() < 2 {
        return Err(TrainingError::new(name, format!("{} training rows", rows.len())));
    }
    if ds.class_distribution(label_col, rows).len() < 2 {
        return Err(TrainingError::new(name, "training rows share a single class"));
    }
    Ok(())
}
