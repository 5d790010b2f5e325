use serde::Serialize;

use crate::{Error, EvaluationReport, Evaluator, Result, ScoringData, Settings, scaler};
use ltr_domain::{FeatureTable, Params, Qrels, SearchSpace};
use ltr_providers::{Classifier, Error as ProviderError, Optimizer, Reranker};

/// Partitions and judgments for a search. Validation rows drive the
/// optimizer; test rows are scored once with the winning parameters.
#[derive(Clone, Copy)]
pub struct SearchData<'a> {
	pub train: &'a FeatureTable,
	pub test: &'a FeatureTable,
	pub validation: &'a FeatureTable,
	pub qrels_test: &'a Qrels,
	pub qrels_validation: &'a Qrels,
}

#[derive(Clone, Debug, Serialize)]
pub struct TuningOutcome {
	/// Best validation mean reciprocal rank.
	pub best_score: f64,
	pub best_params: Params,
	pub trials: usize,
	/// Final evaluation of the best parameters on the test partition.
	pub test: EvaluationReport,
}

/// Tunes classifier hyperparameters with a black-box minimizer over the
/// negated validation mean reciprocal rank.
pub struct HyperparameterSearch<O> {
	optimizer: O,
	trials: usize,
}
impl<O> HyperparameterSearch<O>
where
	O: Optimizer,
{
	pub fn new(optimizer: O, trials: usize) -> Self {
		Self { optimizer, trials }
	}

	pub fn optimize(
		&mut self,
		evaluator: &mut Evaluator,
		classifier: &mut dyn Classifier,
		mut reranker: Option<&mut dyn Reranker>,
		space: &SearchSpace,
		data: SearchData<'_>,
		settings: &Settings,
	) -> Result<TuningOutcome> {
		let scaled = scaler::scale_and_split(
			data.train,
			data.test,
			Some(data.validation),
			settings.reduction_components,
		)?;
		let validation = scaled.validation.as_ref().ok_or_else(|| Error::InvalidRequest {
			message: "Validation partition is missing after scaling.".to_string(),
		})?;
		let trial_settings = Settings { record: false, ..*settings };
		let mut failure = None;
		let mut trial = 0usize;
		let searched = {
			let mut objective = |params: &Params| -> ltr_providers::Result<f64> {
				trial += 1;

				let attempt = classifier.set_parameters(params).map_err(Error::from).and_then(|()| {
					evaluator.compute_metrics(
						&mut *classifier,
						reborrow(&mut reranker),
						ScoringData {
							train: scaled.train.features.view(),
							train_labels: &scaled.train_labels,
							target: validation.features.view(),
							pairs: &validation.pairs,
							qrels: data.qrels_validation,
							columns: &scaled.columns,
						},
						&trial_settings,
					)
				});

				match attempt {
					Ok(report) => {
						tracing::debug!(trial, score = report.score, ?params, "Trial evaluated.");

						Ok(-report.score)
					},
					Err(err) => {
						failure = Some(err);

						Err(ProviderError::ObjectiveAborted)
					},
				}
			};

			self.optimizer.minimize(&mut objective, space, self.trials)
		};
		let outcome = match searched {
			Ok(outcome) => outcome,
			Err(ProviderError::ObjectiveAborted) =>
				return Err(failure.unwrap_or_else(|| Error::Provider {
					message: ProviderError::ObjectiveAborted.to_string(),
				})),
			Err(err) => return Err(err.into()),
		};
		let best_score = -outcome.best_value;

		tracing::info!(best_score, best_params = ?outcome.best_params, "Hyperparameter search finished.");

		classifier.set_parameters(&outcome.best_params)?;

		let test = evaluator.compute_metrics(
			classifier,
			reranker,
			ScoringData {
				train: scaled.train.features.view(),
				train_labels: &scaled.train_labels,
				target: scaled.test.features.view(),
				pairs: &scaled.test.pairs,
				qrels: data.qrels_test,
				columns: &scaled.columns,
			},
			settings,
		)?;

		tracing::info!(best_score, test_score = test.score, "Best parameters evaluated on test.");

		Ok(TuningOutcome {
			best_score,
			best_params: outcome.best_params,
			trials: outcome.history.len(),
			test,
		})
	}
}

fn reborrow<'a>(reranker: &'a mut Option<&mut dyn Reranker>) -> Option<&'a mut dyn Reranker> {
	match reranker {
		Some(reranker) => Some(&mut **reranker),
		None => None,
	}
}
