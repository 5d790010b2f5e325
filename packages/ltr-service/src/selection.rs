use serde::Serialize;

use crate::{Evaluator, HyperparameterSearch, Result, SearchData, Settings};
use ltr_domain::SearchSpace;
use ltr_providers::{Classifier, Optimizer};

#[derive(Clone, Debug, Serialize)]
pub struct SelectionOutcome {
	/// Features in the order they were committed.
	pub selected: Vec<String>,
	/// Validation score of `selected`; `None` when no feature was committed.
	pub score: Option<f64>,
	pub rounds: Vec<SelectionRound>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SelectionRound {
	/// Every candidate tried this round with its best validation score.
	pub candidates: Vec<(String, f64)>,
	pub committed: Option<String>,
}

/// Greedy forward selection. Each round tunes the classifier on every
/// one-feature extension of the current selection and commits the best one,
/// provided it beats both the current score and zero.
pub struct ForwardFeatureSelector<O> {
	search: HyperparameterSearch<O>,
}
impl<O> ForwardFeatureSelector<O>
where
	O: Optimizer,
{
	pub fn new(search: HyperparameterSearch<O>) -> Self {
		Self { search }
	}

	pub fn select(
		&mut self,
		evaluator: &mut Evaluator,
		classifier: &mut dyn Classifier,
		space: &SearchSpace,
		data: SearchData<'_>,
		settings: &Settings,
	) -> Result<SelectionOutcome> {
		let features = data.train.schema().names().to_vec();
		let mut selected: Vec<String> = Vec::new();
		let mut current_score = f64::NEG_INFINITY;
		let mut rounds = Vec::new();

		while selected.len() < features.len() {
			let mut round_best: Option<(String, f64)> = None;
			let mut candidates = Vec::new();

			for feature in features.iter().filter(|feature| !selected.contains(*feature)) {
				let mut subset = selected.clone();

				subset.push(feature.clone());

				let train = data.train.select(&subset)?;
				let test = data.test.select(&subset)?;
				let validation = data.validation.select(&subset)?;
				let outcome = self.search.optimize(
					evaluator,
					classifier,
					None,
					space,
					SearchData { train: &train, test: &test, validation: &validation, ..data },
					settings,
				)?;
				let score = outcome.best_score;

				tracing::info!(features = ?subset, score, "Feature subset evaluated.");

				let round_score = round_best.as_ref().map_or(0.0, |(_, score)| *score);

				if score > current_score && score > round_score {
					round_best = Some((feature.clone(), score));
				}

				candidates.push((feature.clone(), score));
			}

			let Some((feature, score)) = round_best else {
				rounds.push(SelectionRound { candidates, committed: None });

				break;
			};

			selected.push(feature.clone());
			current_score = score;

			tracing::info!(features = ?selected, score, "Feature committed.");

			rounds.push(SelectionRound { candidates, committed: Some(feature) });
		}

		tracing::info!(features = ?selected, rounds = rounds.len(), "Feature selection finished.");

		Ok(SelectionOutcome {
			score: if selected.is_empty() { None } else { Some(current_score) },
			selected,
			rounds,
		})
	}
}
