use crate::{Error, Result};
use ltr_domain::{PairKey, Qrels, ScoredResult};

/// Joins confidences with judgments, one result per pair in input order.
/// Pairs without a judgment get relevance 0.
pub fn assemble(confidences: &[f64], pairs: &[PairKey], qrels: &Qrels) -> Result<Vec<ScoredResult>> {
	if confidences.len() != pairs.len() {
		return Err(Error::RowCountMismatch {
			partition: "predictions".to_string(),
			expected: pairs.len(),
			actual: confidences.len(),
		});
	}

	let results = pairs
		.iter()
		.zip(confidences)
		.map(|(pair, confidence)| ScoredResult {
			query_id: pair.query_id.clone(),
			passage_id: pair.passage_id.clone(),
			confidence: *confidence,
			relevance: qrels.grade(pair),
		})
		.collect();

	Ok(results)
}
