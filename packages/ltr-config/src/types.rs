use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub evaluation: Evaluation,
	#[serde(default)]
	pub classifier: Classifier,
	pub search: Search,
	/// Optional. Enables the pairwise re-ranking stage when present.
	pub rerank: Option<Rerank>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// JSON file holding every recorded run. Created on first write.
	pub run_log: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Evaluation {
	#[serde(default = "default_cutoff")]
	pub cutoff: usize,
	/// Zero disables dimensionality reduction.
	#[serde(default)]
	pub reduction_components: usize,
	#[serde(default = "default_true")]
	pub record: bool,
}
impl Default for Evaluation {
	fn default() -> Self {
		Self { cutoff: default_cutoff(), reduction_components: 0, record: true }
	}
}

#[derive(Debug, Deserialize)]
pub struct Classifier {
	#[serde(default = "default_var_smoothing")]
	pub var_smoothing: f64,
}
impl Default for Classifier {
	fn default() -> Self {
		Self { var_smoothing: default_var_smoothing() }
	}
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_trials")]
	pub trials: usize,
	#[serde(default)]
	pub seed: u64,
	pub space: Vec<SearchDimension>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchDimension {
	Integer {
		name: String,
		low: i64,
		high: i64,
	},
	Real {
		name: String,
		low: f64,
		high: f64,
		#[serde(default)]
		log_scale: bool,
	},
	Categorical {
		name: String,
		values: Vec<String>,
	},
}
impl SearchDimension {
	pub fn name(&self) -> &str {
		match self {
			Self::Integer { name, .. } | Self::Real { name, .. } | Self::Categorical { name, .. } =>
				name,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Rerank {
	#[serde(default = "default_cutoff")]
	pub top_k: usize,
	#[serde(default = "default_true")]
	pub retrain: bool,
	#[serde(default = "default_max_pairs")]
	pub max_pairs: usize,
}

fn default_cutoff() -> usize {
	50
}

fn default_trials() -> usize {
	50
}

fn default_true() -> bool {
	true
}

fn default_var_smoothing() -> f64 {
	1e-9
}

fn default_max_pairs() -> usize {
	10_000
}
