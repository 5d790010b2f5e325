mod error;

pub use error::{Error, Result};

use ndarray::ArrayView2;

use ltr_domain::{
	FeatureRow, FeatureSchema, FeatureTable, Params, Qrel, Qrels, ScoredResult, SearchSpace,
};
use ltr_providers::{
	Classifier, Error as ProviderError, Objective, OptimizationOutcome, Optimizer,
	Result as ProviderResult, TrialRecord,
};

type ScoreFn = dyn Fn(&Params, ArrayView2<'_, f64>) -> Vec<f64>;

/// Classifier whose confidences come from a closure over its current
/// parameters and the prediction matrix.
pub struct ScriptedClassifier {
	score: Box<ScoreFn>,
	params: Params,
	fit_error: Option<String>,
	fits: usize,
}
impl ScriptedClassifier {
	/// Returns `confidences` verbatim for any matrix with that many rows.
	pub fn fixed(confidences: Vec<f64>) -> Self {
		Self::from_fn(move |_, features| {
			if features.nrows() == confidences.len() {
				confidences.clone()
			} else {
				vec![0.0; features.nrows()]
			}
		})
	}

	pub fn from_fn<F>(score: F) -> Self
	where
		F: Fn(&Params, ArrayView2<'_, f64>) -> Vec<f64> + 'static,
	{
		Self { score: Box::new(score), params: Params::new(), fit_error: None, fits: 0 }
	}

	/// Every `fit` call fails with this message.
	pub fn failing_fit(mut self, message: &str) -> Self {
		self.fit_error = Some(message.to_string());

		self
	}

	pub fn fits(&self) -> usize {
		self.fits
	}
}
impl Classifier for ScriptedClassifier {
	fn descriptor(&self) -> String {
		"Scripted".to_string()
	}

	fn fit(&mut self, _features: ArrayView2<'_, f64>, _labels: &[u8]) -> ProviderResult<()> {
		if let Some(message) = &self.fit_error {
			return Err(ProviderError::ModelFit { message: message.clone() });
		}

		self.fits += 1;

		Ok(())
	}

	fn predict_probability(&self, features: ArrayView2<'_, f64>) -> ProviderResult<Vec<f64>> {
		Ok((self.score)(&self.params, features))
	}

	fn parameters(&self) -> Params {
		self.params.clone()
	}

	fn set_parameters(&mut self, params: &Params) -> ProviderResult<()> {
		self.params.extend(params.iter().map(|(name, value)| (name.clone(), value.clone())));

		Ok(())
	}
}

/// Evaluates a fixed list of candidates in order, cycling when `trials`
/// exceeds the list.
pub struct SequenceOptimizer {
	candidates: Vec<Params>,
}
impl SequenceOptimizer {
	pub fn new(candidates: Vec<Params>) -> Self {
		Self { candidates }
	}
}
impl Optimizer for SequenceOptimizer {
	fn minimize(
		&mut self,
		objective: &mut Objective<'_>,
		_space: &SearchSpace,
		trials: usize,
	) -> ProviderResult<OptimizationOutcome> {
		if trials == 0 || self.candidates.is_empty() {
			return Err(ProviderError::Optimizer { message: "Nothing to evaluate.".to_string() });
		}

		let mut history: Vec<TrialRecord> = Vec::with_capacity(trials);

		for params in self.candidates.iter().cycle().take(trials) {
			let value = objective(params)?;

			history.push(TrialRecord { params: params.clone(), value });
		}

		let mut best = 0;

		for (index, trial) in history.iter().enumerate() {
			if trial.value < history[best].value {
				best = index;
			}
		}

		Ok(OptimizationOutcome {
			best_value: history[best].value,
			best_params: history[best].params.clone(),
			history,
		})
	}
}

/// Builds a table from `(query, passage, values, label)` tuples.
pub fn table(features: &[&str], rows: &[(&str, &str, &[f64], u8)]) -> Result<FeatureTable> {
	let schema = FeatureSchema::new(features.iter().map(|name| name.to_string()).collect())?;
	let rows = rows
		.iter()
		.map(|(query_id, passage_id, values, label)| FeatureRow {
			query_id: query_id.to_string(),
			passage_id: passage_id.to_string(),
			values: values.to_vec(),
			label: Some(*label),
		})
		.collect();

	Ok(FeatureTable::new(schema, rows)?)
}

pub fn qrels(grades: &[(&str, &str, u32)]) -> Qrels {
	grades
		.iter()
		.map(|(query_id, passage_id, grade)| Qrel {
			query_id: query_id.to_string(),
			passage_id: passage_id.to_string(),
			grade: *grade,
		})
		.collect()
}

pub fn scored(query_id: &str, passage_id: &str, confidence: f64, relevance: u32) -> ScoredResult {
	ScoredResult {
		query_id: query_id.to_string(),
		passage_id: passage_id.to_string(),
		confidence,
		relevance,
	}
}
