use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::{Classifier, Error, RerankInput, Reranker, Result};
use ltr_domain::{ScoredResult, metrics};

/// Pairwise re-ranker backed by any [`Classifier`].
///
/// Training pairs are feature differences between a positive and a negative
/// row, in both orientations. Re-ranking orders each query's top candidates by
/// summed win probability against the others and hands them the original
/// top-k confidences in that new order.
pub struct PairwiseReranker<C> {
	inner: C,
	max_pairs: usize,
	fitted: bool,
}
impl<C> PairwiseReranker<C>
where
	C: Classifier,
{
	pub fn new(inner: C, max_pairs: usize) -> Self {
		Self { inner, max_pairs: max_pairs.max(2), fitted: false }
	}

	fn train(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<()> {
		if labels.len() != features.nrows() {
			return Err(Error::Rerank {
				message: format!(
					"Got {} labels for {} training rows.",
					labels.len(),
					features.nrows()
				),
			});
		}

		let positives: Vec<usize> = (0..labels.len()).filter(|row| labels[*row] == 1).collect();
		let negatives: Vec<usize> = (0..labels.len()).filter(|row| labels[*row] == 0).collect();

		if positives.is_empty() || negatives.is_empty() {
			return Err(Error::Rerank {
				message: "Pairwise training needs positive and negative rows.".to_string(),
			});
		}

		let grid = positives.len() * negatives.len();
		let budget = (self.max_pairs / 2).min(grid);
		let step = (grid / budget).max(1);
		let mut diffs = Vec::with_capacity(budget * 2);
		let mut pair_labels = Vec::with_capacity(budget * 2);

		for cell in (0..grid).step_by(step).take(budget) {
			let positive = features.row(positives[cell / negatives.len()]);
			let negative = features.row(negatives[cell % negatives.len()]);

			diffs.push(difference(positive, negative));
			pair_labels.push(1);
			diffs.push(difference(negative, positive));
			pair_labels.push(0);
		}

		let matrix = stack(diffs, features.ncols())?;

		tracing::info!(pairs = pair_labels.len(), "Training pairwise re-ranker.");

		self.inner.fit(matrix.view(), &pair_labels)?;
		self.fitted = true;

		Ok(())
	}

	fn reorder_head(
		&self,
		results: &mut [ScoredResult],
		head: &[usize],
		features: ArrayView2<'_, f64>,
	) -> Result<()> {
		let width = head.len();
		let mut diffs = Vec::with_capacity(width * (width - 1));

		for &i in head {
			for &j in head {
				if i != j {
					diffs.push(difference(features.row(i), features.row(j)));
				}
			}
		}

		let probabilities = self.inner.predict_probability(stack(diffs, features.ncols())?.view())?;
		let mut wins = vec![0.0_f64; width];

		for (slot, chunk) in probabilities.chunks(width - 1).enumerate() {
			wins[slot] = chunk.iter().sum();
		}

		let mut order: Vec<usize> = (0..width).collect();

		order.sort_by(|a, b| wins[*b].total_cmp(&wins[*a]));

		let confidences: Vec<f64> = head.iter().map(|index| results[*index].confidence).collect();

		for (confidence, slot) in confidences.into_iter().zip(order) {
			results[head[slot]].confidence = confidence;
		}

		Ok(())
	}
}
impl<C> Reranker for PairwiseReranker<C>
where
	C: Classifier,
{
	fn descriptor(&self) -> String {
		format!("Pairwise({})", self.inner.descriptor())
	}

	fn rerank(
		&mut self,
		mut results: Vec<ScoredResult>,
		input: RerankInput<'_>,
	) -> Result<Vec<ScoredResult>> {
		if input.test_features.nrows() != results.len() {
			return Err(Error::Rerank {
				message: format!(
					"Got {} feature rows for {} results.",
					input.test_features.nrows(),
					results.len()
				),
			});
		}
		if input.retrain {
			self.train(input.train_features, input.train_labels)?;
		}
		if !self.fitted {
			return Err(Error::Rerank {
				message: "Pairwise model must be trained before re-ranking.".to_string(),
			});
		}

		for mut head in head_indices_by_query(&results) {
			head.truncate(input.top_k);

			if head.len() < 2 {
				continue;
			}

			self.reorder_head(&mut results, &head, input.test_features)?;
		}

		Ok(results)
	}
}

/// Each query's row indices ordered by confidence descending, NaN last, ties in
/// input order.
fn head_indices_by_query(results: &[ScoredResult]) -> Vec<Vec<usize>> {
	let mut groups: Vec<Vec<usize>> = Vec::new();
	let mut slot_by_query: HashMap<&str, usize> = HashMap::new();

	for (index, result) in results.iter().enumerate() {
		let slot = *slot_by_query.entry(result.query_id.as_str()).or_insert_with(|| {
			groups.push(Vec::new());

			groups.len() - 1
		});

		groups[slot].push(index);
	}

	for group in &mut groups {
		group.sort_by(|a, b| metrics::by_confidence_desc(&results[*a], &results[*b]));
	}

	groups
}

fn difference(lhs: ArrayView1<'_, f64>, rhs: ArrayView1<'_, f64>) -> Vec<f64> {
	lhs.iter().zip(rhs.iter()).map(|(l, r)| l - r).collect()
}

fn stack(rows: Vec<Vec<f64>>, width: usize) -> Result<Array2<f64>> {
	let height = rows.len();

	Array2::from_shape_vec((height, width), rows.into_iter().flatten().collect())
		.map_err(|err| Error::Rerank { message: format!("Failed to build pair matrix: {err}") })
}
