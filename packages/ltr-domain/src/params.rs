use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Named hyperparameter assignment, ordered by name.
pub type Params = BTreeMap<String, ParamValue>;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
	Integer(i64),
	Real(f64),
	Categorical(String),
}
impl ParamValue {
	/// Numeric view. Integers widen; categorical values have none.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Integer(value) => Some(*value as f64),
			Self::Real(value) => Some(*value),
			Self::Categorical(_) => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Integer(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Categorical(value) => Some(value),
			_ => None,
		}
	}
}
impl fmt::Display for ParamValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Integer(value) => write!(f, "{value}"),
			Self::Real(value) => write!(f, "{value}"),
			Self::Categorical(value) => f.write_str(value),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Domain {
	Integer { low: i64, high: i64 },
	Real { low: f64, high: f64, log_scale: bool },
	Categorical(Vec<String>),
}
impl Domain {
	pub fn contains(&self, value: &ParamValue) -> bool {
		match (self, value) {
			(Self::Integer { low, high }, ParamValue::Integer(value)) => (low..=high).contains(&value),
			(Self::Real { low, high, .. }, ParamValue::Real(value)) => (low..=high).contains(&value),
			(Self::Categorical(values), ParamValue::Categorical(value)) => values.contains(value),
			_ => false,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
	pub name: String,
	pub domain: Domain,
}

/// Ordered hyperparameter dimensions handed to an optimizer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchSpace {
	dimensions: Vec<Dimension>,
}
impl SearchSpace {
	pub fn new(dimensions: Vec<Dimension>) -> Self {
		Self { dimensions }
	}

	pub fn dimensions(&self) -> &[Dimension] {
		&self.dimensions
	}

	pub fn len(&self) -> usize {
		self.dimensions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.dimensions.is_empty()
	}

	/// Pairs a positional parameter vector with the dimension names.
	pub fn assign(&self, values: &[ParamValue]) -> Params {
		self.dimensions
			.iter()
			.zip(values.iter())
			.map(|(dimension, value)| (dimension.name.clone(), value.clone()))
			.collect()
	}
}
