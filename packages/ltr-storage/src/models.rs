use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use ltr_domain::{ConfusionMetrics, Params};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RunMetrics {
	pub mrr: f64,
	pub map: f64,
	pub ndcg: f64,
	pub judged_queries: usize,
	pub excluded_queries: usize,
	pub full: ConfusionMetrics,
	pub at_cutoff: ConfusionMetrics,
}

/// One recorded evaluation. Records are never edited once appended.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RunRecord {
	pub run_id: Uuid,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// BLAKE3 digest of the model, hyperparameters, features and reduction setting.
	pub fingerprint: String,
	pub model: String,
	pub hyperparameters: Params,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rerank_model: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rerank_top_k: Option<usize>,
	pub features: Vec<String>,
	pub train_rows: usize,
	pub test_rows: usize,
	pub reduction_components: usize,
	pub cutoff: usize,
	pub metrics: RunMetrics,
}
