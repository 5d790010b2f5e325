//! Ranking quality over scored result sets.
//!
//! Ranks are assigned per query: candidates are sorted by confidence
//! descending, ties keep input order, and ranks start at 1. Per-query
//! aggregates only count queries with at least one relevant entry.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Error, RankedHit, Result, ScoredResult};

/// Confidence at or above which a candidate is predicted relevant.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct ConfusionMetrics {
	#[serde(with = "undefined_as_null")]
	pub accuracy: f64,
	#[serde(with = "undefined_as_null")]
	pub precision: f64,
	#[serde(with = "undefined_as_null")]
	pub recall: f64,
	#[serde(with = "undefined_as_null")]
	pub f1: f64,
	pub evaluated: usize,
}

/// Means over the queries that have at least one relevant entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankingSummary {
	pub mean_reciprocal_rank: f64,
	pub mean_average_precision: f64,
	pub mean_ndcg: f64,
	pub judged_queries: usize,
	pub excluded_queries: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryMetrics {
	pub query_id: String,
	pub reciprocal_rank: f64,
	pub average_precision: f64,
	pub ndcg: f64,
	pub relevant_count: usize,
	pub candidate_count: usize,
}

/// Ranks one query's candidates and keeps the relevant ones.
///
/// The returned hits are in rank order with `position` 1..=M. Fails with
/// [`Error::EmptyResultSet`] when nothing is relevant.
pub fn assign_ranks(results: &[ScoredResult]) -> Result<Vec<RankedHit>> {
	let entries: Vec<&ScoredResult> = results.iter().collect();

	rank_entries(&entries)
}

pub fn average_precision(results: &[ScoredResult]) -> Result<f64> {
	Ok(average_precision_of(&assign_ranks(results)?))
}

/// Reciprocal of the best rank held by a relevant entry.
pub fn reciprocal_rank(results: &[ScoredResult]) -> Result<f64> {
	Ok(reciprocal_rank_of(&assign_ranks(results)?))
}

/// Normalized graded gain for one query; zero when nothing is relevant.
pub fn ndcg(results: &[ScoredResult]) -> f64 {
	match assign_ranks(results) {
		Ok(hits) => ndcg_of(&hits),
		Err(_) => 0.0,
	}
}

pub fn graded_gain(grade: u32) -> f64 {
	f64::from(grade).exp2() - 1.0
}

pub fn mean_reciprocal_rank(results: &[ScoredResult]) -> Result<f64> {
	mean_over_queries(results, reciprocal_rank_of)
}

pub fn mean_average_precision(results: &[ScoredResult]) -> Result<f64> {
	mean_over_queries(results, average_precision_of)
}

pub fn mean_ndcg(results: &[ScoredResult]) -> Result<f64> {
	mean_over_queries(results, ndcg_of)
}

/// Per-query metrics in first-appearance order. Queries without relevant
/// entries report zeros.
pub fn per_query(results: &[ScoredResult]) -> Vec<QueryMetrics> {
	group_by_query(results)
		.into_iter()
		.map(|(query_id, entries)| {
			let hits = rank_entries(&entries).unwrap_or_default();
			let (reciprocal_rank, average_precision, ndcg) = if hits.is_empty() {
				(0.0, 0.0, 0.0)
			} else {
				(reciprocal_rank_of(&hits), average_precision_of(&hits), ndcg_of(&hits))
			};

			QueryMetrics {
				query_id: query_id.to_string(),
				reciprocal_rank,
				average_precision,
				ndcg,
				relevant_count: hits.len(),
				candidate_count: entries.len(),
			}
		})
		.collect()
}

/// All three means in one pass over the groups.
pub fn summarize(results: &[ScoredResult]) -> Result<RankingSummary> {
	let mut rr_sum = 0.0_f64;
	let mut ap_sum = 0.0_f64;
	let mut ndcg_sum = 0.0_f64;
	let mut judged = 0usize;
	let mut excluded = Vec::new();

	for (query_id, entries) in group_by_query(results) {
		match rank_entries(&entries) {
			Ok(hits) => {
				rr_sum += reciprocal_rank_of(&hits);
				ap_sum += average_precision_of(&hits);
				ndcg_sum += ndcg_of(&hits);
				judged += 1;
			},
			Err(_) => excluded.push(query_id.to_string()),
		}
	}

	if judged == 0 {
		return Err(Error::EmptyResultSet { query_ids: excluded });
	}

	let count = judged as f64;

	Ok(RankingSummary {
		mean_reciprocal_rank: rr_sum / count,
		mean_average_precision: ap_sum / count,
		mean_ndcg: ndcg_sum / count,
		judged_queries: judged,
		excluded_queries: excluded,
	})
}

/// Accuracy, precision, recall and F1 of the fixed 0.5 decision threshold.
///
/// With a cutoff, only each query's top-`cutoff` candidates are classified.
/// Recall keeps every relevant candidate of the full set in its denominator,
/// so it is recall@k and never grows when the cutoff shrinks. Metrics with a
/// zero denominator are NaN.
pub fn confusion_metrics(results: &[ScoredResult], cutoff: Option<usize>) -> ConfusionMetrics {
	let total_relevant = results.iter().filter(|result| result.is_relevant()).count();
	let evaluated: Vec<&ScoredResult> = match cutoff {
		Some(k) => group_by_query(results)
			.into_iter()
			.flat_map(|(_, entries)| {
				let mut ordered = entries;

				ordered.sort_by(|a, b| by_confidence_desc(a, b));
				ordered.truncate(k);

				ordered
			})
			.collect(),
		None => results.iter().collect(),
	};
	let mut tp = 0usize;
	let mut fp = 0usize;
	let mut tn = 0usize;
	let mut fn_ = 0usize;

	for result in &evaluated {
		match (result.confidence >= DECISION_THRESHOLD, result.is_relevant()) {
			(true, true) => tp += 1,
			(true, false) => fp += 1,
			(false, false) => tn += 1,
			(false, true) => fn_ += 1,
		}
	}

	let accuracy = ratio(tp + tn, tp + fp + tn + fn_);
	let precision = ratio(tp, tp + fp);
	let recall = ratio(tp, total_relevant);
	let f1 = if precision.is_nan() || recall.is_nan() || precision + recall == 0.0 {
		f64::NAN
	} else {
		2.0 * precision * recall / (precision + recall)
	};

	ConfusionMetrics { accuracy, precision, recall, f1, evaluated: evaluated.len() }
}

fn rank_entries(entries: &[&ScoredResult]) -> Result<Vec<RankedHit>> {
	let mut ordered = entries.to_vec();

	ordered.sort_by(|a, b| by_confidence_desc(a, b));

	let hits: Vec<RankedHit> = ordered
		.iter()
		.enumerate()
		.filter(|(_, result)| result.is_relevant())
		.enumerate()
		.map(|(position, (index, result))| RankedHit {
			position: position + 1,
			rank: index + 1,
			query_id: result.query_id.clone(),
			passage_id: result.passage_id.clone(),
			confidence: result.confidence,
			relevance: result.relevance,
		})
		.collect();

	if hits.is_empty() {
		let query_ids = entries.first().map(|result| vec![result.query_id.clone()]);

		return Err(Error::EmptyResultSet { query_ids: query_ids.unwrap_or_default() });
	}

	Ok(hits)
}

fn average_precision_of(hits: &[RankedHit]) -> f64 {
	let sum: f64 = hits.iter().map(|hit| hit.position as f64 / hit.rank as f64).sum();

	sum / hits.len() as f64
}

fn reciprocal_rank_of(hits: &[RankedHit]) -> f64 {
	hits.iter().map(|hit| hit.rank).min().map(|rank| 1.0 / rank as f64).unwrap_or(0.0)
}

fn ndcg_of(hits: &[RankedHit]) -> f64 {
	let dcg: f64 = hits.iter().map(|hit| graded_gain(hit.relevance) / discount(hit.rank)).sum();
	let mut ideal: Vec<u32> = hits.iter().map(|hit| hit.relevance).collect();

	ideal.sort_by(|a, b| b.cmp(a));

	let idcg: f64 = ideal
		.iter()
		.enumerate()
		.map(|(index, grade)| graded_gain(*grade) / discount(index + 1))
		.sum();

	if idcg > 0.0 { dcg / idcg } else { 0.0 }
}

fn discount(rank: usize) -> f64 {
	(rank as f64 + 1.0).log2()
}

fn mean_over_queries<F>(results: &[ScoredResult], per_query: F) -> Result<f64>
where
	F: Fn(&[RankedHit]) -> f64,
{
	let mut sum = 0.0_f64;
	let mut judged = 0usize;
	let mut excluded = Vec::new();

	for (query_id, entries) in group_by_query(results) {
		match rank_entries(&entries) {
			Ok(hits) => {
				sum += per_query(&hits);
				judged += 1;
			},
			Err(_) => excluded.push(query_id.to_string()),
		}
	}

	if judged == 0 {
		return Err(Error::EmptyResultSet { query_ids: excluded });
	}

	Ok(sum / judged as f64)
}

/// Groups by query id in first-appearance order; entries keep input order.
fn group_by_query(results: &[ScoredResult]) -> Vec<(&str, Vec<&ScoredResult>)> {
	let mut groups: Vec<(&str, Vec<&ScoredResult>)> = Vec::new();
	let mut index_by_query = std::collections::HashMap::new();

	for result in results {
		let slot = *index_by_query.entry(result.query_id.as_str()).or_insert_with(|| {
			groups.push((result.query_id.as_str(), Vec::new()));

			groups.len() - 1
		});

		groups[slot].1.push(result);
	}

	groups
}

/// Descending confidence with NaN last. Equal keys compare equal, so stable
/// sorts keep input order.
pub fn by_confidence_desc(a: &ScoredResult, b: &ScoredResult) -> Ordering {
	sort_key(b.confidence).total_cmp(&sort_key(a.confidence))
}

fn sort_key(confidence: f64) -> f64 {
	if confidence.is_nan() { f64::NEG_INFINITY } else { confidence }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
	if denominator == 0 { f64::NAN } else { numerator as f64 / denominator as f64 }
}

mod undefined_as_null {
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		if value.is_nan() { serializer.serialize_none() } else { serializer.serialize_f64(*value) }
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
	}
}
