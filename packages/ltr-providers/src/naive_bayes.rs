use std::f64::consts::PI;

use ndarray::ArrayView2;

use crate::{Classifier, Error, Result};
use ltr_domain::{ParamValue, Params};

pub const VAR_SMOOTHING: &str = "var_smoothing";

/// Gaussian naive Bayes over binary labels.
#[derive(Clone, Debug)]
pub struct GaussianNb {
	var_smoothing: f64,
	model: Option<FittedModel>,
}
impl GaussianNb {
	pub fn new(var_smoothing: f64) -> Self {
		Self { var_smoothing, model: None }
	}

	pub fn is_fitted(&self) -> bool {
		self.model.is_some()
	}
}
impl Default for GaussianNb {
	fn default() -> Self {
		Self::new(1e-9)
	}
}
impl Classifier for GaussianNb {
	fn descriptor(&self) -> String {
		format!("GaussianNb({VAR_SMOOTHING}={})", self.var_smoothing)
	}

	fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<()> {
		let rows = features.nrows();

		if rows == 0 {
			return Err(Error::ModelFit { message: "Training matrix is empty.".to_string() });
		}
		if labels.len() != rows {
			return Err(Error::ModelFit {
				message: format!("Got {} labels for {rows} training rows.", labels.len()),
			});
		}
		if let Some(label) = labels.iter().find(|label| **label > 1) {
			return Err(Error::ModelFit { message: format!("Label {label} is not binary.") });
		}

		let positives = labels.iter().filter(|label| **label == 1).count();

		if positives == 0 || positives == rows {
			return Err(Error::ModelFit {
				message: "Training labels must contain both classes.".to_string(),
			});
		}

		let max_variance = (0..features.ncols())
			.map(|col| column_stats(features, col, |_| true).1)
			.fold(0.0_f64, f64::max);
		let epsilon = self.var_smoothing * max_variance;
		let epsilon = if epsilon > 0.0 { epsilon } else { self.var_smoothing };
		let negative = ClassStats::fit(features, labels, 0, epsilon);
		let positive = ClassStats::fit(features, labels, 1, epsilon);

		self.model = Some(FittedModel { negative, positive, columns: features.ncols() });

		Ok(())
	}

	fn predict_probability(&self, features: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
		let model = self.model.as_ref().ok_or(Error::NotFitted)?;

		if features.ncols() != model.columns {
			return Err(Error::InvalidInput {
				message: format!(
					"Model was fitted on {} columns but got {}.",
					model.columns,
					features.ncols()
				),
			});
		}

		let probabilities = features
			.rows()
			.into_iter()
			.map(|row| {
				let row = row.to_vec();

				sigmoid(model.positive.log_joint(&row) - model.negative.log_joint(&row))
			})
			.collect();

		Ok(probabilities)
	}

	fn parameters(&self) -> Params {
		Params::from([(VAR_SMOOTHING.to_string(), ParamValue::Real(self.var_smoothing))])
	}

	fn set_parameters(&mut self, params: &Params) -> Result<()> {
		for (name, value) in params {
			if name != VAR_SMOOTHING {
				return Err(Error::InvalidParameter {
					name: name.clone(),
					message: "GaussianNb has no such parameter.".to_string(),
				});
			}

			let Some(var_smoothing) = value.as_f64().filter(|v| v.is_finite() && *v > 0.0) else {
				return Err(Error::InvalidParameter {
					name: name.clone(),
					message: format!("Expected a positive finite number, got {value}."),
				});
			};

			self.var_smoothing = var_smoothing;
		}

		Ok(())
	}
}

#[derive(Clone, Debug)]
struct FittedModel {
	negative: ClassStats,
	positive: ClassStats,
	columns: usize,
}

#[derive(Clone, Debug)]
struct ClassStats {
	log_prior: f64,
	means: Vec<f64>,
	variances: Vec<f64>,
}
impl ClassStats {
	fn fit(features: ArrayView2<'_, f64>, labels: &[u8], class: u8, epsilon: f64) -> Self {
		let count = labels.iter().filter(|label| **label == class).count();
		let (means, variances): (Vec<f64>, Vec<f64>) = (0..features.ncols())
			.map(|col| {
				let (mean, variance) = column_stats(features, col, |row| labels[row] == class);

				(mean, variance + epsilon)
			})
			.unzip();

		Self { log_prior: (count as f64 / labels.len() as f64).ln(), means, variances }
	}

	fn log_joint(&self, row: &[f64]) -> f64 {
		let mut total = self.log_prior;

		for ((x, mean), variance) in row.iter().zip(&self.means).zip(&self.variances) {
			total -= 0.5 * (2.0 * PI * variance).ln();
			total -= 0.5 * (x - mean).powi(2) / variance;
		}

		total
	}
}

/// Population mean and variance of one column over the selected rows.
fn column_stats<F>(features: ArrayView2<'_, f64>, col: usize, include: F) -> (f64, f64)
where
	F: Fn(usize) -> bool,
{
	let column = features.column(col);
	let mut count = 0usize;
	let mut sum = 0.0_f64;

	for (row, value) in column.iter().enumerate() {
		if include(row) {
			count += 1;
			sum += value;
		}
	}

	if count == 0 {
		return (0.0, 0.0);
	}

	let mean = sum / count as f64;
	let mut squares = 0.0_f64;

	for (row, value) in column.iter().enumerate() {
		if include(row) {
			squares += (value - mean).powi(2);
		}
	}

	(mean, squares / count as f64)
}

fn sigmoid(z: f64) -> f64 {
	if z >= 0.0 {
		1.0 / (1.0 + (-z).exp())
	} else {
		let e = z.exp();

		e / (1.0 + e)
	}
}

#[cfg(test)]
mod tests {
	use ndarray::array;

	use super::*;

	#[test]
	fn separates_two_clusters() {
		let features = array![[0.0, 0.1], [0.2, 0.0], [0.1, 0.2], [5.0, 5.1], [5.2, 4.9], [4.8, 5.0]];
		let labels = [0, 0, 0, 1, 1, 1];
		let mut model = GaussianNb::default();

		model.fit(features.view(), &labels).expect("Fit succeeds.");

		let probabilities =
			model.predict_probability(array![[0.1, 0.1], [5.0, 5.0]].view()).expect("Fitted.");

		assert!(probabilities[0] < 0.01, "Unexpected probability {}.", probabilities[0]);
		assert!(probabilities[1] > 0.99, "Unexpected probability {}.", probabilities[1]);
	}

	#[test]
	fn rejects_single_class_training_sets() {
		let features = array![[0.0], [1.0]];
		let mut model = GaussianNb::default();
		let result = model.fit(features.view(), &[1, 1]);

		assert!(matches!(result, Err(Error::ModelFit { .. })));
		assert!(!model.is_fitted());
	}

	#[test]
	fn rejects_label_count_mismatch() {
		let features = array![[0.0], [1.0]];
		let result = GaussianNb::default().fit(features.view(), &[0]);

		assert!(matches!(result, Err(Error::ModelFit { .. })));
	}

	#[test]
	fn predicting_before_fit_fails() {
		let result = GaussianNb::default().predict_probability(array![[0.0]].view());

		assert!(matches!(result, Err(Error::NotFitted)));
	}

	#[test]
	fn constant_features_still_yield_probabilities() {
		let features = array![[1.0], [1.0], [1.0], [1.0]];
		let mut model = GaussianNb::default();

		model.fit(features.view(), &[0, 1, 0, 1]).expect("Fit succeeds.");

		let probabilities = model.predict_probability(features.view()).expect("Fitted.");

		assert!(probabilities.iter().all(|p| (p - 0.5).abs() < 1e-9));
	}

	#[test]
	fn parameters_round_trip() {
		let mut model = GaussianNb::default();
		let params = Params::from([(VAR_SMOOTHING.to_string(), ParamValue::Real(1e-3))]);

		model.set_parameters(&params).expect("Known parameter.");

		assert_eq!(model.parameters(), params);
		assert!(model.descriptor().contains("0.001"));
	}

	#[test]
	fn unknown_and_invalid_parameters_are_rejected() {
		let mut model = GaussianNb::default();
		let unknown = Params::from([("alpha".to_string(), ParamValue::Real(1.0))]);
		let negative = Params::from([(VAR_SMOOTHING.to_string(), ParamValue::Real(-1.0))]);

		assert!(matches!(model.set_parameters(&unknown), Err(Error::InvalidParameter { .. })));
		assert!(matches!(model.set_parameters(&negative), Err(Error::InvalidParameter { .. })));
	}
}
