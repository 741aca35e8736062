//! The shared filtering contract: every filter consumes a dataset plus a
//! label designator and produces a [`FilterResult`].

pub mod inffc;
pub mod rnn;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dataset::{ClassId, Dataset, LabelColumn};
use crate::quark::StringTable;
use crate::Error;

pub trait Filter {
    fn name(&self) -> &str;

    fn apply(&self, ds: &Dataset, label: LabelColumn) -> Result<FilterResult, Error>;
}

/// Fuses the predictions of the ensemble members for one instance into a
/// suspect/clean flag. Pure and stateless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Voting {
    /// Suspect iff fewer than half of the members agree with the current
    /// label; an exact half is trusted.
    Majority,
    /// Suspect iff no member agrees with the current label.
    Consensus,
}

impl Voting {
    pub fn is_suspect(self, votes: &[ClassId], current: ClassId) -> bool {
        let agreeing = votes.iter().filter(|&&v| v == current).count();
        match self {
            Voting::Majority => agreeing * 2 < votes.len(),
            Voting::Consensus => agreeing == 0,
        }
    }
}

/// Progress sink for the iterative filters. `on_round` receives the round
/// number and how many instances that round removed; `cancelled` is polled
/// at the top of each round. Results never depend on the observer.
pub trait Observer {
    fn on_round(&mut self, round: usize, removed: usize);

    fn cancelled(&self) -> bool {
        false
    }
}

/// The default observer: discards progress, never cancels.
#[derive(Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_round(&mut self, _round: usize, _removed: usize) {}
}

/// Outcome of one filter invocation.
///
/// Row indices are 1-based positions in the *original* dataset, whatever
/// order the filter worked in internally. The cleaned dataset is derived
/// on demand from the index sets and is never stored, so it cannot drift
/// from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    removed: BTreeSet<usize>,
    repaired: BTreeMap<usize, ClassId>,
    label_col: usize,
    parameters: serde_json::Value,
    provenance: String,
    notes: Vec<String>,
}

impl FilterResult {
    /// Validates the partition invariant against the dataset the filter
    /// ran on: indices within `1..=N`, removed and repaired disjoint,
    /// repair codes inside the label vocabulary.
    pub fn new(
        original: &Dataset,
        label_col: usize,
        removed: BTreeSet<usize>,
        repaired: BTreeMap<usize, ClassId>,
        parameters: serde_json::Value,
        provenance: String,
        notes: Vec<String>,
    ) -> Result<Self, Error> {
        match original.column(label_col) {
            Some(col) if col.is_categorical() => {}
            _ => {
                return Err(Error::InvalidInput(format!(
                    "result label column {} is missing or not categorical",
                    label_col
                )))
            }
        }
        let n = original.len();
        for &idx in removed.iter().chain(repaired.keys()) {
            if idx == 0 || idx > n {
                return Err(Error::InvalidInput(format!(
                    "result row {} outside 1..={}",
                    idx, n
                )));
            }
        }
        if let Some(&idx) = removed.iter().find(|idx| repaired.contains_key(*idx)) {
            return Err(Error::InvalidInput(format!(
                "row {} both removed and repaired",
                idx
            )));
        }
        let n_classes = original.class_names(label_col).len();
        for (&idx, &code) in &repaired {
            if code >= n_classes {
                return Err(Error::InvalidInput(format!(
                    "repair of row {} uses label code {} outside the class vocabulary",
                    idx, code
                )));
            }
        }
        Ok(Self { removed, repaired, label_col, parameters, provenance, notes })
    }

    /// Original 1-based rows dropped entirely.
    pub fn removed(&self) -> &BTreeSet<usize> {
        &self.removed
    }

    /// Original 1-based rows whose label was rewritten, with the new code.
    pub fn repaired(&self) -> &BTreeMap<usize, ClassId> {
        &self.repaired
    }

    /// Echo of the effective configuration, defaults included.
    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }

    /// Which filter and invocation produced this result.
    pub fn provenance(&self) -> &str {
        &self.provenance
    }

    /// Free-text diagnostics (round counts, termination cause, remarks).
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// 1-based rows that survive into the cleaned dataset, in original
    /// order.
    pub fn retained(&self, original: &Dataset) -> Vec<usize> {
        (1..=original.len()).filter(|idx| !self.removed.contains(idx)).collect()
    }

    /// Derives the cleaned dataset: overwrite repaired labels, then drop
    /// removed rows. Recomputing this from the same result and dataset is
    /// always byte-identical.
    pub fn clean_data(&self, original: &Dataset) -> Result<Dataset, Error> {
        let repairs: BTreeMap<usize, ClassId> =
            self.repaired.iter().map(|(&idx, &code)| (idx - 1, code)).collect();
        let patched = original.with_class_overwrites(self.label_col, &repairs)?;
        let keep: Vec<usize> = self.retained(original).into_iter().map(|idx| idx - 1).collect();
        Ok(patched.select(&keep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    #[test]
    fn majority_trusts_exact_half() {
        assert!(!Voting::Majority.is_suspect(&[0, 0, 1, 1], 0));
        assert!(Voting::Majority.is_suspect(&[0, 1, 1], 0));
        assert!(!Voting::Majority.is_suspect(&[0, 0, 1], 0));
    }

    #[test]
    fn consensus_needs_zero_agreement() {
        assert!(Voting::Consensus.is_suspect(&[1, 1, 1], 0));
        assert!(!Voting::Consensus.is_suspect(&[0, 1, 1], 0));
    }

    #[test]
    fn overlapping_sets_rejected() {
        let ds = Dataset::new(vec![
            Column::numeric("x", vec![1.0, 2.0]),
            Column::categorical("class", &["a", "b"]),
        ])
        .expect("valid dataset");
        let removed: BTreeSet<usize> = [1].iter().copied().collect();
        let mut repaired = BTreeMap::new();
        repaired.insert(1usize, 0usize);
        let r = FilterResult::new(
            &ds,
            1,
            removed,
            repaired,
            serde_json::json!({}),
            "test".to_string(),
            Vec::new(),
        );
        match r {
            Err(Error::InvalidInput(..)) => {}
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }
}
