use std::collections::BTreeSet;
use std::fmt::Display;

use crate::filter::FilterResult;

/// Noise-detection performance of a filter run against a known-noise row
/// set: how many true noisy rows it removed, how many it missed, and how
/// many clean rows it flagged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Evaluation {
    /// Noisy rows the filter removed.
    pub hits: usize,
    /// Noisy rows the filter retained.
    pub misses: usize,
    /// Clean rows the filter removed.
    pub false_alarms: usize,
}

impl Evaluation {
    /// Scores `result` against the ground-truth noisy rows (1-based, like
    /// the result's own index sets).
    pub fn of(result: &FilterResult, truth: &BTreeSet<usize>) -> Self {
        let removed = result.removed();
        Self {
            hits: truth.intersection(removed).count(),
            misses: truth.difference(removed).count(),
            false_alarms: removed.difference(truth).count(),
        }
    }

    pub fn precision(&self) -> f64 {
        let flagged = self.hits + self.false_alarms;
        if flagged > 0 {
            self.hits as f64 / flagged as f64
        } else {
            0.0
        }
    }

    pub fn recall(&self) -> f64 {
        let noisy = self.hits + self.misses;
        if noisy > 0 {
            self.hits as f64 / noisy as f64
        } else {
            0.0
        }
    }

    pub fn fmeasure(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r > 0.0 {
            p * r * 2.0 / (p + r)
        } else {
            0.0
        }
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Noise detection (#hit, #miss, #false alarm): ({}, {}, {})",
            self.hits, self.misses, self.false_alarms
        )?;
        write!(
            f,
            "Precision, recall, F1: ({:.4}, {:.4}, {:.4})",
            self.precision(),
            self.recall(),
            self.fmeasure()
        )
    }
}
