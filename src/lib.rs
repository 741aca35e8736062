//! Label noise filters for classification datasets.
//!
//! A filter takes a [`Dataset`] plus a label-column designator and returns
//! a [`FilterResult`]: which original rows were removed, which were
//! relabeled, and enough provenance to reproduce the cleaned table. Two
//! filters are provided: [`Rnn`], a consistent-subset reduction in the
//! style of Gates' reduced nearest neighbor rule, and [`Inffc`], an
//! iterative ensemble filter fusing the votes of several classifiers.
//!
//! Classifiers enter through the [`Classifier`]/[`Model`] capability traits
//! and are injected by the host; `classifiers` ships small deterministic
//! reference implementations (k-NN, CART, logistic) so the ensemble filter
//! is usable stand-alone.

pub mod classifier;
pub mod classifiers;
pub mod dataset;
pub mod evaluation;
pub mod filter;
pub mod quark;

pub use crate::classifier::{Classifier, Model, TrainingError};
pub use crate::dataset::{ClassId, Column, ColumnData, Dataset, LabelColumn};
pub use crate::evaluation::Evaluation;
pub use crate::filter::inffc::{Inffc, InffcConfig, Termination};
pub use crate::filter::rnn::Rnn;
pub use crate::filter::{Filter, FilterResult, NullObserver, Observer, Voting};

/// Errors surfaced by dataset construction and the filters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed dataset, bad column designator, or an input shape the
    /// algorithm cannot proceed on. The message names the step that
    /// raised it where one applies (seed / scan / minimize).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A classifier collaborator failed to train. `stage` names the
    /// filtering phase that was running.
    #[error("training failed during {stage}: {source}")]
    Training {
        stage: &'static str,
        #[source]
        source: TrainingError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
