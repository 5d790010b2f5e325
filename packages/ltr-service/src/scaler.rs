//! Joint standardization of all partitions, optional principal-component
//! reduction, and positional slicing back into partitions.

use ndarray::{Array1, Array2, s};

use crate::{Error, Result};
use ltr_domain::{FeatureTable, PairKey};

const JACOBI_SWEEPS: usize = 100;
const CONVERGENCE_TOLERANCE: f64 = 1e-12;

/// One partition after scaling. Row `i` of `features` belongs to `pairs[i]`.
#[derive(Clone, Debug)]
pub struct ScaledPartition {
	pub features: Array2<f64>,
	pub pairs: Vec<PairKey>,
}
impl ScaledPartition {
	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}
}

#[derive(Clone, Debug)]
pub struct ScaledPartitions {
	/// Output column names: the input schema, or `pca_comp_{i}` after reduction.
	pub columns: Vec<String>,
	pub train: ScaledPartition,
	pub train_labels: Vec<u8>,
	pub test: ScaledPartition,
	pub validation: Option<ScaledPartition>,
}

/// Standardizes every column over the concatenation of `train`, `test` and
/// `validation` (in that order), optionally projects onto the leading
/// `reduction_components` principal components, and slices the rows back.
pub fn scale_and_split(
	train: &FeatureTable,
	test: &FeatureTable,
	validation: Option<&FeatureTable>,
	reduction_components: usize,
) -> Result<ScaledPartitions> {
	if train.is_empty() {
		return Err(Error::InvalidRequest { message: "Training partition is empty.".to_string() });
	}

	let train_labels = train.labels().ok_or_else(|| Error::InvalidRequest {
		message: "Every training row must carry a label.".to_string(),
	})?;
	let mut partitions = vec![("test", test)];

	if let Some(validation) = validation {
		partitions.push(("validation", validation));
	}

	for (name, table) in &partitions {
		if table.schema() != train.schema() {
			return Err(Error::SchemaMismatch {
				partition: name.to_string(),
				message: format!(
					"expected columns {:?}, got {:?}.",
					train.schema().names(),
					table.schema().names()
				),
			});
		}
	}

	let width = train.schema().len();

	if reduction_components > width {
		return Err(Error::InvalidRequest {
			message: format!(
				"reduction_components ({reduction_components}) exceeds the {width} available features."
			),
		});
	}

	let tables: Vec<&FeatureTable> =
		std::iter::once(train).chain(partitions.iter().map(|(_, table)| *table)).collect();
	let mut data = concatenate(&tables, width)?;

	standardize(&mut data);

	let (data, columns) = if reduction_components > 0 {
		let reduced = project_onto_components(&data, reduction_components);
		let columns = (0..reduction_components).map(|index| format!("pca_comp_{index}")).collect();

		(reduced, columns)
	} else {
		(data, train.schema().names().to_vec())
	};

	tracing::debug!(
		rows = data.nrows(),
		columns = data.ncols(),
		reduction_components,
		"Partitions scaled."
	);

	let mut offset = 0;
	let mut slice = |partition: &str, table: &FeatureTable| -> Result<ScaledPartition> {
		let end = (offset + table.len()).min(data.nrows());
		let features = data.slice(s![offset..end, ..]).to_owned();

		if features.nrows() != table.len() {
			return Err(Error::RowCountMismatch {
				partition: partition.to_string(),
				expected: table.len(),
				actual: features.nrows(),
			});
		}

		offset = end;

		Ok(ScaledPartition { features, pairs: table.pairs() })
	};
	let train = slice("train", train)?;
	let test = slice("test", test)?;
	let validation = validation.map(|table| slice("validation", table)).transpose()?;

	Ok(ScaledPartitions { columns, train, train_labels, test, validation })
}

fn concatenate(tables: &[&FeatureTable], width: usize) -> Result<Array2<f64>> {
	let height = tables.iter().map(|table| table.len()).sum();
	let values = tables
		.iter()
		.flat_map(|table| table.rows())
		.flat_map(|row| row.values.iter().copied())
		.collect();

	Array2::from_shape_vec((height, width), values).map_err(|err| Error::InvalidRequest {
		message: format!("Failed to assemble the feature matrix: {err}"),
	})
}

/// Zero mean, unit population variance. Constant columns only get centered.
fn standardize(data: &mut Array2<f64>) {
	for mut column in data.columns_mut() {
		let mean = column.mean().unwrap_or(0.0);
		let deviation = column.var(0.0).sqrt();
		let scale = if deviation > 0.0 && deviation.is_finite() { deviation } else { 1.0 };

		column.mapv_inplace(|value| (value - mean) / scale);
	}
}

/// Projects centered data onto its leading principal axes, taken from a full
/// eigendecomposition of the covariance matrix.
fn project_onto_components(data: &Array2<f64>, components: usize) -> Array2<f64> {
	let rows = data.nrows().max(1) as f64;
	let covariance = data.t().dot(data) / rows;
	let (values, vectors) = symmetric_eigen(covariance);
	let mut order: Vec<usize> = (0..values.len()).collect();

	order.sort_by(|a, b| values[*b].total_cmp(&values[*a]));

	let mut basis = Array2::<f64>::zeros((data.ncols(), components));

	for (component, index) in order.into_iter().take(components).enumerate() {
		basis.column_mut(component).assign(&orient(vectors.column(index).to_owned()));
	}

	data.dot(&basis)
}

/// Cyclic Jacobi rotations. Returns the eigenvalues and the matching
/// eigenvectors as columns.
fn symmetric_eigen(mut matrix: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
	let width = matrix.nrows();
	let mut vectors = Array2::<f64>::eye(width);

	for _ in 0..JACOBI_SWEEPS {
		let mut off_diagonal = 0.0_f64;

		for p in 0..width {
			for q in p + 1..width {
				off_diagonal += matrix[[p, q]] * matrix[[p, q]];
			}
		}

		if off_diagonal.sqrt() < CONVERGENCE_TOLERANCE {
			break;
		}

		for p in 0..width {
			for q in p + 1..width {
				let pivot = matrix[[p, q]];

				if pivot == 0.0 {
					continue;
				}

				let theta = (matrix[[q, q]] - matrix[[p, p]]) / (2.0 * pivot);
				let tangent = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
				let cosine = 1.0 / (tangent * tangent + 1.0).sqrt();
				let sine = tangent * cosine;

				rotate_columns(&mut matrix, p, q, cosine, sine);
				rotate_columns(&mut vectors, p, q, cosine, sine);

				for k in 0..width {
					let upper = matrix[[p, k]];
					let lower = matrix[[q, k]];

					matrix[[p, k]] = cosine * upper - sine * lower;
					matrix[[q, k]] = sine * upper + cosine * lower;
				}
			}
		}
	}

	(matrix.diag().to_owned(), vectors)
}

fn rotate_columns(matrix: &mut Array2<f64>, p: usize, q: usize, cosine: f64, sine: f64) {
	for k in 0..matrix.nrows() {
		let left = matrix[[k, p]];
		let right = matrix[[k, q]];

		matrix[[k, p]] = cosine * left - sine * right;
		matrix[[k, q]] = sine * left + cosine * right;
	}
}

/// The largest-magnitude coordinate is made positive so projections are stable.
fn orient(mut vector: Array1<f64>) -> Array1<f64> {
	let pivot =
		vector.iter().copied().fold(0.0_f64, |pivot, v| if v.abs() > pivot.abs() { v } else { pivot });

	if pivot < 0.0 {
		vector.mapv_inplace(|v| -v);
	}

	vector
}

#[cfg(test)]
mod tests {
	use super::*;
	use ltr_testkit::table;

	fn assert_close(actual: f64, expected: f64) {
		assert!((actual - expected).abs() < 1e-9, "Expected {expected}, got {actual}.");
	}

	#[test]
	fn standardizes_over_all_partitions() {
		let train = table(&["a", "b"], &[("q1", "p1", &[1.0, 5.0], 1), ("q1", "p2", &[2.0, 5.0], 0)])
			.expect("Train.");
		let test = table(&["a", "b"], &[("q2", "p3", &[3.0, 5.0], 0)]).expect("Test.");
		let scaled = scale_and_split(&train, &test, None, 0).expect("Scale.");
		let column: Vec<f64> = scaled
			.train
			.features
			.column(0)
			.iter()
			.chain(scaled.test.features.column(0))
			.copied()
			.collect();
		let deviation = (2.0_f64 / 3.0).sqrt();

		assert_close(column[0], -1.0 / deviation);
		assert_close(column[1], 0.0);
		assert_close(column[2], 1.0 / deviation);
		assert!(scaled.train.features.column(1).iter().all(|value| *value == 0.0));
		assert_eq!(scaled.columns, vec!["a".to_string(), "b".to_string()]);
		assert_eq!(scaled.train_labels, vec![1, 0]);
		assert!(scaled.validation.is_none());
	}

	#[test]
	fn reduction_renames_columns_and_keeps_row_counts() {
		let train = table(
			&["a", "b", "c"],
			&[
				("q1", "p1", &[1.0, 2.0, 0.3], 1),
				("q1", "p2", &[2.0, 4.0, 0.1], 0),
				("q1", "p3", &[3.0, 6.0, 0.2], 0),
			],
		)
		.expect("Train.");
		let test = table(&["a", "b", "c"], &[("q2", "p4", &[4.0, 8.0, 0.0], 0)]).expect("Test.");
		let scaled = scale_and_split(&train, &test, None, 2).expect("Scale.");

		assert_eq!(scaled.columns, vec!["pca_comp_0".to_string(), "pca_comp_1".to_string()]);
		assert_eq!(scaled.train.features.dim(), (3, 2));
		assert_eq!(scaled.test.features.dim(), (1, 2));
	}

	#[test]
	fn leading_component_captures_correlated_columns() {
		let train = table(
			&["a", "b"],
			&[("q", "p1", &[1.0, 1.0], 1), ("q", "p2", &[2.0, 2.0], 0), ("q", "p3", &[3.0, 3.0], 0)],
		)
		.expect("Train.");
		let test = table(&["a", "b"], &[]).expect("Test.");
		let scaled = scale_and_split(&train, &test, None, 1).expect("Scale.");
		let projected: Vec<f64> = scaled.train.features.column(0).to_vec();
		let expected = 3.0_f64.sqrt();

		assert_close(projected[0], -expected);
		assert_close(projected[1], 0.0);
		assert_close(projected[2], expected);
	}

	#[test]
	fn leading_component_survives_anti_correlated_columns() {
		let train = table(
			&["a", "b", "c"],
			&[
				("q", "p1", &[1.0, -1.0, -1.0], 1),
				("q", "p2", &[2.0, -2.0, -2.0], 0),
				("q", "p3", &[3.0, -3.0, -3.0], 0),
			],
		)
		.expect("Train.");
		let test = table(&["a", "b", "c"], &[]).expect("Test.");
		let scaled = scale_and_split(&train, &test, None, 1).expect("Scale.");
		let projected: Vec<f64> = scaled.train.features.column(0).to_vec();
		let expected = 3.0_f64.sqrt() * 1.5_f64.sqrt();

		assert_close(projected[0].abs(), expected);
		assert_close(projected[1], 0.0);
		assert_close(projected[2], -projected[0]);
	}

	#[test]
	fn partitions_keep_their_identifiers_in_order() {
		let rows: &[(&str, &str, &[f64], u8)] = &[
			("q1", "p1", &[1.0, 0.5], 1),
			("q1", "p2", &[2.0, 0.1], 0),
			("q2", "p3", &[0.0, 0.9], 1),
		];
		let train = table(&["a", "b"], rows).expect("Train.");
		let test = table(&["a", "b"], &[("q3", "p4", &[4.0, 0.2], 0)]).expect("Test.");
		let validation = table(
			&["a", "b"],
			&[("q4", "p5", &[3.0, 0.3], 0), ("q4", "p6", &[5.0, 0.7], 1)],
		)
		.expect("Validation.");
		let scaled = scale_and_split(&train, &test, Some(&validation), 1).expect("Scale.");
		let scaled_validation = scaled.validation.expect("Validation partition.");
		let expected: Vec<PairKey> =
			train.pairs().into_iter().chain(test.pairs()).chain(validation.pairs()).collect();
		let actual: Vec<PairKey> = scaled
			.train
			.pairs
			.iter()
			.chain(&scaled.test.pairs)
			.chain(&scaled_validation.pairs)
			.cloned()
			.collect();

		assert_eq!(actual, expected);
		assert_eq!(scaled.train.features.nrows(), 3);
		assert_eq!(scaled.test.features.nrows(), 1);
		assert_eq!(scaled_validation.features.nrows(), 2);
	}

	#[test]
	fn rejects_more_components_than_features() {
		let train = table(&["a"], &[("q", "p", &[1.0], 1)]).expect("Train.");
		let test = table(&["a"], &[]).expect("Test.");

		assert!(matches!(
			scale_and_split(&train, &test, None, 2),
			Err(Error::InvalidRequest { .. })
		));
	}

	#[test]
	fn rejects_partitions_with_other_columns() {
		let train = table(&["a", "b"], &[("q", "p", &[1.0, 2.0], 1)]).expect("Train.");
		let test = table(&["b", "a"], &[("q", "p2", &[1.0, 2.0], 0)]).expect("Test.");

		match scale_and_split(&train, &test, None, 0) {
			Err(Error::SchemaMismatch { partition, .. }) => assert_eq!(partition, "test"),
			other => panic!("Expected a schema mismatch, got {other:?}."),
		}
	}
}
