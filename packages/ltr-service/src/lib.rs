//! Evaluation and experiment search for learning-to-rank classifiers.

pub mod assembler;
pub mod evaluator;
pub mod scaler;
pub mod selection;
pub mod tuning;

mod error;

pub use error::{Error, Result};
pub use evaluator::{EvaluationReport, Evaluator, ScoringData};
pub use scaler::{ScaledPartition, ScaledPartitions, scale_and_split};
pub use selection::{ForwardFeatureSelector, SelectionOutcome, SelectionRound};
pub use tuning::{HyperparameterSearch, SearchData, TuningOutcome};

use ltr_config::{Config, SearchDimension};
use ltr_domain::{Dimension, Domain, SearchSpace};

/// Per-evaluation knobs shared by every procedure.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
	/// Depth for the @k confusion metrics.
	pub cutoff: usize,
	/// Principal components to keep; zero keeps the scaled features.
	pub reduction_components: usize,
	pub record: bool,
	/// Used only when a re-ranker is supplied.
	pub rerank: Option<RerankSettings>,
}
impl Settings {
	pub fn from_config(config: &Config) -> Self {
		Self {
			cutoff: config.evaluation.cutoff,
			reduction_components: config.evaluation.reduction_components,
			record: config.evaluation.record,
			rerank: config
				.rerank
				.as_ref()
				.map(|rerank| RerankSettings { top_k: rerank.top_k, retrain: rerank.retrain }),
		}
	}
}
impl Default for Settings {
	fn default() -> Self {
		Self { cutoff: 50, reduction_components: 0, record: true, rerank: None }
	}
}

#[derive(Clone, Copy, Debug)]
pub struct RerankSettings {
	pub top_k: usize,
	pub retrain: bool,
}
impl Default for RerankSettings {
	fn default() -> Self {
		Self { top_k: 50, retrain: true }
	}
}

/// Converts configured dimensions, in order, into a [`SearchSpace`].
pub fn search_space(dimensions: &[SearchDimension]) -> SearchSpace {
	let dimensions = dimensions
		.iter()
		.map(|dimension| {
			let domain = match dimension {
				SearchDimension::Integer { low, high, .. } =>
					Domain::Integer { low: *low, high: *high },
				SearchDimension::Real { low, high, log_scale, .. } =>
					Domain::Real { low: *low, high: *high, log_scale: *log_scale },
				SearchDimension::Categorical { values, .. } => Domain::Categorical(values.clone()),
			};

			Dimension { name: dimension.name().to_string(), domain }
		})
		.collect();

	SearchSpace::new(dimensions)
}
