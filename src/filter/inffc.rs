use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, Model};
use crate::classifiers::knn::{column_ranges, k_nearest};
use crate::classifiers::{Cart, KNearest, Logistic};
use crate::dataset::{ClassId, Dataset, LabelColumn};
use crate::filter::{Filter, FilterResult, NullObserver, Observer, Voting};
use crate::Error;

/// Tunables of the iterative ensemble filter. `Default` gives majority
/// voting, a 1% noise floor, three stall rounds, five scoring neighbors
/// and a zero score threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InffcConfig {
    pub voting: Voting,
    /// Fraction of the original row count a round must remove to count as
    /// progress.
    pub min_noise_proportion: f64,
    /// Consecutive low-progress rounds tolerated before converging.
    pub stall_iteration_limit: usize,
    /// Neighborhood size of the noise score's k-NN stage.
    pub neighbor_count: usize,
    /// Rows scoring strictly above this are removed; range [-1, 1].
    pub score_threshold: f64,
    /// Weight of the ensemble-disagreement term of the noise score.
    pub vote_weight: f64,
    /// Weight of the neighborhood-mismatch term of the noise score.
    pub neighbor_weight: f64,
    /// Folds of the round-robin held-out prediction policy.
    pub eval_folds: usize,
    /// Hard cap on rounds; `None` leaves termination to the stall rule.
    pub max_rounds: Option<usize>,
    /// Wall-clock budget checked at the top of each round.
    pub time_budget: Option<Duration>,
}

impl Default for InffcConfig {
    fn default() -> Self {
        Self {
            voting: Voting::Majority,
            min_noise_proportion: 0.01,
            stall_iteration_limit: 3,
            neighbor_count: 5,
            score_threshold: 0.0,
            vote_weight: 0.5,
            neighbor_weight: 0.5,
            eval_folds: 3,
            max_rounds: None,
            time_budget: None,
        }
    }
}

impl InffcConfig {
    fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.min_noise_proportion) {
            return Err(Error::InvalidInput(format!(
                "min_noise_proportion {} outside [0, 1]",
                self.min_noise_proportion
            )));
        }
        if self.stall_iteration_limit == 0 {
            return Err(Error::InvalidInput("stall_iteration_limit must be positive".into()));
        }
        if self.neighbor_count == 0 {
            return Err(Error::InvalidInput("neighbor_count must be positive".into()));
        }
        if !(-1.0..=1.0).contains(&self.score_threshold) {
            return Err(Error::InvalidInput(format!(
                "score_threshold {} outside [-1, 1]",
                self.score_threshold
            )));
        }
        if self.vote_weight < 0.0
            || self.neighbor_weight < 0.0
            || self.vote_weight + self.neighbor_weight <= 0.0
        {
            return Err(Error::InvalidInput(
                "score weights must be non-negative and not both zero".into(),
            ));
        }
        if self.eval_folds < 2 {
            return Err(Error::InvalidInput("eval_folds must be at least 2".into()));
        }
        Ok(())
    }
}

/// How an invocation of [`Inffc`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The stall rule fired: progress stayed under the noise floor for
    /// `stall_iteration_limit` consecutive rounds.
    Converged,
    /// The retained set became too small or too one-sided to train the
    /// ensemble; removals up to that point are kept.
    Exhausted,
    /// The observer requested cancellation between rounds.
    Cancelled,
    /// `max_rounds` or `time_budget` ran out.
    BudgetExceeded,
}

/// Iterative noise filter based on the fusion of classifier votes. Each
/// round trains the ensemble twice (on everything retained, then on the
/// preliminarily clean part only), scores the suspects, removes high
/// scorers, and repeats until progress stalls. Rows are only ever
/// removed, never relabeled.
pub struct Inffc {
    config: InffcConfig,
    ensemble: Vec<Box<dyn Classifier>>,
}

impl Inffc {
    pub fn new(config: InffcConfig, ensemble: Vec<Box<dyn Classifier>>) -> Result<Self, Error> {
        config.validate()?;
        if ensemble.is_empty() {
            return Err(Error::InvalidInput("ensemble has no classifiers".into()));
        }
        if ensemble.len() < 3 {
            log::warn!(
                "inffc: {} ensemble member(s); the reference design fuses three structurally different ones",
                ensemble.len()
            );
        }
        Ok(Self { config, ensemble })
    }

    /// The reference ensemble: CART, 3-NN and logistic regression.
    pub fn with_default_ensemble(config: InffcConfig) -> Result<Self, Error> {
        Self::new(
            config,
            vec![
                Box::new(Cart::default()),
                Box::new(KNearest::new(3)),
                Box::new(Logistic::default()),
            ],
        )
    }

    pub fn config(&self) -> &InffcConfig {
        &self.config
    }

    /// Runs the filter with an explicit progress observer. The observer
    /// receives one event per round and may cancel between rounds; results
    /// never depend on it.
    pub fn run(
        &self,
        ds: &Dataset,
        label: LabelColumn,
        observer: &mut dyn Observer,
    ) -> Result<(FilterResult, Termination), Error> {
        let label_col = ds.resolve_label(label)?;
        if ds.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "dataset has {} rows, need at least 2",
                ds.len()
            )));
        }
        let ranges = column_ranges(ds, label_col);
        let n = ds.len();
        let noise_floor = self.config.min_noise_proportion * n as f64;

        let mut retained: Vec<usize> = (0..n).collect();
        let mut removed_all: BTreeSet<usize> = BTreeSet::new();
        let mut notes: Vec<String> = Vec::new();
        let mut stall = 0usize;
        let mut round = 0usize;
        let started = Instant::now();

        let termination = loop {
            if observer.cancelled() {
                break Termination::Cancelled;
            }
            if self.config.max_rounds.map(|limit| round >= limit).unwrap_or(false) {
                break Termination::BudgetExceeded;
            }
            if self.config.time_budget.map(|b| started.elapsed() >= b).unwrap_or(false) {
                break Termination::BudgetExceeded;
            }
            if retained.len() < 2 || single_class(ds, label_col, &retained) {
                notes.push(format!(
                    "retained set of {} row(s) cannot train the ensemble",
                    retained.len()
                ));
                break Termination::Exhausted;
            }
            round += 1;
            let removals = match self.round_removals(ds, label_col, &ranges, &retained) {
                Ok(v) => v,
                Err(Error::Training { stage, source }) => {
                    log::warn!("inffc round {}: {} failed: {}", round, stage, source);
                    notes.push(format!("round {} aborted, {}: {}", round, stage, source));
                    break Termination::Exhausted;
                }
                Err(e) => return Err(e),
            };
            let removed_now = removals.len();
            let dropped: BTreeSet<usize> = removals.into_iter().collect();
            retained.retain(|r| !dropped.contains(r));
            removed_all.extend(dropped.iter().map(|&r| r + 1));
            log::info!(
                "inffc round {}: removed {}, retained {}",
                round,
                removed_now,
                retained.len()
            );
            observer.on_round(round, removed_now);
            // A zero-removal round is a stall even when the noise floor is 0.
            if removed_now == 0 || (removed_now as f64) < noise_floor {
                stall += 1;
            } else {
                stall = 0;
            }
            if stall >= self.config.stall_iteration_limit {
                break Termination::Converged;
            }
        };

        notes.insert(0, format!("{} round(s), removed {} of {} rows", round, removed_all.len(), n));
        notes.push(format!("termination: {:?}", termination));
        let config = serde_json::to_value(&self.config)?;
        let members: Vec<&str> = self.ensemble.iter().map(|m| m.name()).collect();
        let result = FilterResult::new(
            ds,
            label_col,
            removed_all,
            Default::default(),
            serde_json::json!({ "config": config, "label_column": label_col }),
            format!(
                "inffc ({:?} voting, ensemble [{}]) over {} rows",
                self.config.voting,
                members.join(", "),
                n
            ),
            notes,
        )?;
        Ok((result, termination))
    }

    /// One round: held-out preliminary filtering, noise-free re-filtering,
    /// noise scoring, decision. Returns the rows to remove.
    fn round_removals(
        &self,
        ds: &Dataset,
        label_col: usize,
        ranges: &[f64],
        retained: &[usize],
    ) -> Result<Vec<usize>, Error> {
        let prelim = self.heldout_votes(ds, label_col, retained)?;
        let prelim_clean: Vec<usize> = retained
            .iter()
            .enumerate()
            .filter(|(i, &r)| {
                !self.config.voting.is_suspect(&prelim[*i], ds.class_of(r, label_col))
            })
            .map(|(_, &r)| r)
            .collect();

        let mut models = Vec::with_capacity(self.ensemble.len());
        for member in &self.ensemble {
            let model = member
                .train(ds, &prelim_clean, label_col)
                .map_err(|source| Error::Training { stage: "noise-free filtering", source })?;
            models.push(model);
        }

        let weight_sum = self.config.vote_weight + self.config.neighbor_weight;
        let wv = self.config.vote_weight / weight_sum;
        let wn = self.config.neighbor_weight / weight_sum;
        let mut removals = Vec::new();
        for &r in retained {
            let class = ds.class_of(r, label_col);
            let votes: Vec<ClassId> = models.iter().map(|m| m.predict(ds, r)).collect();
            if !self.config.voting.is_suspect(&votes, class) {
                continue;
            }
            let disagree =
                votes.iter().filter(|&&v| v != class).count() as f64 / votes.len() as f64;
            let others: Vec<usize> = retained.iter().copied().filter(|&o| o != r).collect();
            let hood =
                k_nearest(ds, ranges, label_col, &others, r, self.config.neighbor_count);
            let mismatch = hood
                .iter()
                .filter(|&&o| ds.class_of(o, label_col) != class)
                .count() as f64
                / hood.len() as f64;
            let score = wv * (2.0 * disagree - 1.0) + wn * (2.0 * mismatch - 1.0);
            if score > self.config.score_threshold {
                removals.push(r);
            }
        }
        Ok(removals)
    }

    /// Per member, round-robin held-out predictions: each fold is predicted
    /// by a model trained on the other folds, so no row is judged by a
    /// model that saw it. Returns one vote vector per retained row.
    fn heldout_votes(
        &self,
        ds: &Dataset,
        label_col: usize,
        retained: &[usize],
    ) -> Result<Vec<Vec<ClassId>>, Error> {
        let folds = self.config.eval_folds;
        let mut votes = vec![vec![0; self.ensemble.len()]; retained.len()];
        for (m, member) in self.ensemble.iter().enumerate() {
            for fold in 0..folds {
                let test: Vec<usize> =
                    (0..retained.len()).filter(|i| i % folds == fold).collect();
                if test.is_empty() {
                    continue;
                }
                let train_rows: Vec<usize> = retained
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| i % folds != fold)
                    .map(|(_, &r)| r)
                    .collect();
                let model = member
                    .train(ds, &train_rows, label_col)
                    .map_err(|source| Error::Training { stage: "preliminary filtering", source })?;
                for i in test {
                    votes[i][m] = model.predict(ds, retained[i]);
                }
            }
        }
        Ok(votes)
    }
}

fn single_class(ds: &Dataset, label_col: usize, rows: &[usize]) -> bool {
    let first = ds.class_of(rows[0], label_col);
    rows.iter().all(|&r| ds.class_of(r, label_col) == first)
}

impl Filter for Inffc {
    fn name(&self) -> &str {
        "inffc"
    }

    fn apply(&self, ds: &Dataset, label: LabelColumn) -> Result<FilterResult, Error> {
        self.run(ds, label, &mut NullObserver).map(|(result, _)| result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_validate() {
        assert!(InffcConfig::default().validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_ranges() {
        let mut cfg = InffcConfig::default();
        cfg.min_noise_proportion = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = InffcConfig::default();
        cfg.score_threshold = -2.0;
        assert!(cfg.validate().is_err());

        let mut cfg = InffcConfig::default();
        cfg.stall_iteration_limit = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = InffcConfig::default();
        cfg.vote_weight = 0.0;
        cfg.neighbor_weight = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_ensemble_rejected() {
        match Inffc::new(InffcConfig::default(), Vec::new()) {
            Err(Error::InvalidInput(..)) => {}
            _ => panic!("expected InvalidInput"),
        }
    }
}
