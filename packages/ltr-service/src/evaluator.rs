use ndarray::ArrayView2;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, Settings, assembler, scaler};
use ltr_domain::{
	ConfusionMetrics, FeatureTable, PairKey, Params, Qrels, ScoredResult,
	metrics::{self, RankingSummary},
};
use ltr_providers::{Classifier, RerankInput, Reranker};
use ltr_storage::{RunLog, RunMetrics, RunRecord};

/// Matrices and identifiers for one fit-and-score cycle.
pub struct ScoringData<'a> {
	pub train: ArrayView2<'a, f64>,
	pub train_labels: &'a [u8],
	/// Partition being scored. Row `i` belongs to `pairs[i]`.
	pub target: ArrayView2<'a, f64>,
	pub pairs: &'a [PairKey],
	pub qrels: &'a Qrels,
	pub columns: &'a [String],
}

#[derive(Clone, Debug, Serialize)]
pub struct EvaluationReport {
	/// Mean reciprocal rank, the score both search procedures maximize.
	pub score: f64,
	pub ranking: RankingSummary,
	pub full: ConfusionMetrics,
	pub at_cutoff: ConfusionMetrics,
	pub cutoff: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub run_id: Option<Uuid>,
}

/// Fits, scores and measures a classifier; owns the run log it records into.
pub struct Evaluator {
	log: RunLog,
}
impl Evaluator {
	pub fn new(log: RunLog) -> Self {
		Self { log }
	}

	pub fn log(&self) -> &RunLog {
		&self.log
	}

	/// Scales `train` and `test` together, then runs [`Self::compute_metrics`]
	/// on the test partition.
	pub fn evaluate(
		&mut self,
		classifier: &mut dyn Classifier,
		reranker: Option<&mut dyn Reranker>,
		train: &FeatureTable,
		test: &FeatureTable,
		qrels: &Qrels,
		settings: &Settings,
	) -> Result<EvaluationReport> {
		let scaled = scaler::scale_and_split(train, test, None, settings.reduction_components)?;

		self.compute_metrics(
			classifier,
			reranker,
			ScoringData {
				train: scaled.train.features.view(),
				train_labels: &scaled.train_labels,
				target: scaled.test.features.view(),
				pairs: &scaled.test.pairs,
				qrels,
				columns: &scaled.columns,
			},
			settings,
		)
	}

	pub fn compute_metrics(
		&mut self,
		classifier: &mut dyn Classifier,
		reranker: Option<&mut dyn Reranker>,
		data: ScoringData<'_>,
		settings: &Settings,
	) -> Result<EvaluationReport> {
		if settings.cutoff == 0 {
			return Err(Error::InvalidRequest {
				message: "cutoff must be greater than zero.".to_string(),
			});
		}

		classifier.fit(data.train, data.train_labels)?;

		let confidences = classifier.predict_probability(data.target)?;
		let mut results = assembler::assemble(&confidences, data.pairs, data.qrels)?;
		let mut rerank_descriptor = None;

		if let Some(reranker) = reranker {
			let rerank = settings.rerank.unwrap_or_default();

			results = reranker.rerank(
				results,
				RerankInput {
					train_features: data.train,
					train_labels: data.train_labels,
					test_features: data.target,
					top_k: rerank.top_k,
					retrain: rerank.retrain,
				},
			)?;
			rerank_descriptor = Some((reranker.descriptor(), rerank.top_k));
		}

		let ranking = rank_summary(&results);
		let full = metrics::confusion_metrics(&results, None);
		let at_cutoff = metrics::confusion_metrics(&results, Some(settings.cutoff));

		tracing::info!(
			mrr = ranking.mean_reciprocal_rank,
			map = ranking.mean_average_precision,
			ndcg = ranking.mean_ndcg,
			judged_queries = ranking.judged_queries,
			accuracy = full.accuracy,
			precision = full.precision,
			recall = full.recall,
			f1 = full.f1,
			cutoff = settings.cutoff,
			recall_at_cutoff = at_cutoff.recall,
			"Evaluation complete."
		);

		if full.precision.is_nan() || at_cutoff.precision.is_nan() {
			tracing::debug!("Precision is undefined; no candidate reached the decision threshold.");
		}

		let mut report = EvaluationReport {
			score: ranking.mean_reciprocal_rank,
			ranking,
			full,
			at_cutoff,
			cutoff: settings.cutoff,
			run_id: None,
		};

		if settings.record {
			let hyperparameters = classifier.parameters();
			let model = classifier.descriptor();
			let record = RunRecord {
				run_id: Uuid::new_v4(),
				created_at: OffsetDateTime::now_utc(),
				fingerprint: fingerprint(
					&model,
					&hyperparameters,
					data.columns,
					settings.reduction_components,
				),
				model,
				hyperparameters,
				rerank_model: rerank_descriptor.as_ref().map(|(descriptor, _)| descriptor.clone()),
				rerank_top_k: rerank_descriptor.map(|(_, top_k)| top_k),
				features: data.columns.to_vec(),
				train_rows: data.train.nrows(),
				test_rows: data.target.nrows(),
				reduction_components: settings.reduction_components,
				cutoff: settings.cutoff,
				metrics: RunMetrics {
					mrr: report.ranking.mean_reciprocal_rank,
					map: report.ranking.mean_average_precision,
					ndcg: report.ranking.mean_ndcg,
					judged_queries: report.ranking.judged_queries,
					excluded_queries: report.ranking.excluded_queries.len(),
					full,
					at_cutoff,
				},
			};
			let run_id = self.log.append(record)?.run_id;

			tracing::info!(run_id = %run_id, location = %self.log.location(), "Run recorded.");

			report.run_id = Some(run_id);
		}

		Ok(report)
	}
}

/// Ranking means, or zeros when no query has a relevant entry.
fn rank_summary(results: &[ScoredResult]) -> RankingSummary {
	match metrics::summarize(results) {
		Ok(summary) => {
			if !summary.excluded_queries.is_empty() {
				tracing::debug!(
					excluded = ?summary.excluded_queries,
					"Queries without relevant entries were excluded."
				);
			}

			summary
		},
		Err(err) => {
			let excluded_queries = match err {
				ltr_domain::Error::EmptyResultSet { query_ids } => query_ids,
				_ => Vec::new(),
			};

			tracing::warn!(
				queries = excluded_queries.len(),
				"No query has a relevant entry. Ranking metrics default to zero."
			);

			RankingSummary {
				mean_reciprocal_rank: 0.0,
				mean_average_precision: 0.0,
				mean_ndcg: 0.0,
				judged_queries: 0,
				excluded_queries,
			}
		},
	}
}

/// BLAKE3 digest identifying the experiment configuration behind a run.
pub fn fingerprint(model: &str, params: &Params, features: &[String], reduction: usize) -> String {
	let mut hasher = blake3::Hasher::new();

	hasher.update(model.as_bytes());
	hasher.update(b"\0");

	for (name, value) in params {
		hasher.update(format!("{name}={value}\n").as_bytes());
	}

	hasher.update(b"\0");

	for feature in features {
		hasher.update(feature.as_bytes());
		hasher.update(b"\n");
	}

	hasher.update(&reduction.to_le_bytes());

	hasher.finalize().to_hex().to_string()
}
