//! Capability traits for the collaborators the evaluation core drives, plus
//! default implementations.

pub mod naive_bayes;
pub mod pairwise;
pub mod random_search;

mod error;

pub use error::{Error, Result};
pub use naive_bayes::GaussianNb;
pub use pairwise::PairwiseReranker;
pub use random_search::RandomSearch;

use ndarray::ArrayView2;

use ltr_domain::{Params, ScoredResult, SearchSpace};

/// Probabilistic binary classifier.
pub trait Classifier {
	/// Human-readable model description, recorded with every run.
	fn descriptor(&self) -> String;

	fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<()>;

	/// Probability of the positive class for every row.
	fn predict_probability(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>>;

	fn parameters(&self) -> Params;

	fn set_parameters(&mut self, params: &Params) -> Result<()>;
}

/// Objective handed to an [`Optimizer`]. Errors abort the search.
pub type Objective<'a> = dyn FnMut(&Params) -> Result<f64> + 'a;

#[derive(Clone, Debug)]
pub struct TrialRecord {
	pub params: Params,
	pub value: f64,
}

#[derive(Clone, Debug)]
pub struct OptimizationOutcome {
	pub best_value: f64,
	pub best_params: Params,
	pub history: Vec<TrialRecord>,
}

/// Black-box minimizer over a [`SearchSpace`].
pub trait Optimizer {
	fn minimize(
		&mut self,
		objective: &mut Objective<'_>,
		space: &SearchSpace,
		trials: usize,
	) -> Result<OptimizationOutcome>;
}

pub struct RerankInput<'a> {
	pub train_features: ArrayView2<'a, f64>,
	pub train_labels: &'a [u8],
	/// Row `i` belongs to `results[i]`.
	pub test_features: ArrayView2<'a, f64>,
	pub top_k: usize,
	pub retrain: bool,
}

/// Re-orders the head of each query's ranking.
pub trait Reranker {
	fn descriptor(&self) -> String;

	/// Returns the results in input order with updated confidences.
	fn rerank(
		&mut self,
		results: Vec<ScoredResult>,
		input: RerankInput<'_>,
	) -> Result<Vec<ScoredResult>>;
}
