use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifies one candidate passage for one query.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PairKey {
	pub query_id: String,
	pub passage_id: String,
}
impl PairKey {
	pub fn new(query_id: impl Into<String>, passage_id: impl Into<String>) -> Self {
		Self { query_id: query_id.into(), passage_id: passage_id.into() }
	}
}

/// Column handle issued by a [`FeatureSchema`]. Only obtainable through
/// [`FeatureSchema::resolve`] or [`FeatureSchema::ids`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FeatureId(usize);
impl FeatureId {
	pub fn index(self) -> usize {
		self.0
	}
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
	names: Vec<String>,
}
impl FeatureSchema {
	pub fn new(names: Vec<String>) -> Result<Self> {
		let mut seen = HashSet::with_capacity(names.len());

		for name in &names {
			if !seen.insert(name.as_str()) {
				return Err(Error::DuplicateFeature { name: name.clone() });
			}
		}

		Ok(Self { names })
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	pub fn name(&self, id: FeatureId) -> &str {
		&self.names[id.0]
	}

	pub fn ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
		(0..self.names.len()).map(FeatureId)
	}

	pub fn resolve(&self, name: &str) -> Result<FeatureId> {
		self.names
			.iter()
			.position(|candidate| candidate == name)
			.map(FeatureId)
			.ok_or_else(|| Error::UnknownFeature { name: name.to_string() })
	}
}
impl TryFrom<Vec<String>> for FeatureSchema {
	type Error = Error;

	fn try_from(names: Vec<String>) -> Result<Self> {
		Self::new(names)
	}
}
impl From<FeatureSchema> for Vec<String> {
	fn from(schema: FeatureSchema) -> Self {
		schema.names
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FeatureRow {
	pub query_id: String,
	pub passage_id: String,
	pub values: Vec<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<u8>,
}
impl FeatureRow {
	pub fn key(&self) -> PairKey {
		PairKey::new(self.query_id.clone(), self.passage_id.clone())
	}
}

/// A fixed-schema feature matrix keyed by (query, passage).
///
/// Row order is significant: partitions are concatenated and sliced back by
/// position during scaling.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "RawFeatureTable")]
pub struct FeatureTable {
	#[serde(rename = "features")]
	schema: FeatureSchema,
	rows: Vec<FeatureRow>,
}
impl FeatureTable {
	pub fn new(schema: FeatureSchema, rows: Vec<FeatureRow>) -> Result<Self> {
		for (index, row) in rows.iter().enumerate() {
			if row.values.len() != schema.len() {
				return Err(Error::RowWidth {
					index,
					expected: schema.len(),
					actual: row.values.len(),
				});
			}
		}

		Ok(Self { schema, rows })
	}

	pub fn schema(&self) -> &FeatureSchema {
		&self.schema
	}

	pub fn rows(&self) -> &[FeatureRow] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn pairs(&self) -> Vec<PairKey> {
		self.rows.iter().map(FeatureRow::key).collect()
	}

	/// Returns every row's label, or `None` when at least one row is unlabeled.
	pub fn labels(&self) -> Option<Vec<u8>> {
		self.rows.iter().map(|row| row.label).collect()
	}

	/// Keeps only the given columns, in the given order. Identifiers and labels
	/// are carried over unchanged.
	pub fn project(&self, ids: &[FeatureId]) -> Result<Self> {
		let mut names = Vec::with_capacity(ids.len());

		for id in ids {
			let name = self
				.schema
				.names
				.get(id.0)
				.ok_or_else(|| Error::UnknownFeature { name: format!("#{}", id.0) })?;

			names.push(name.clone());
		}

		let schema = FeatureSchema::new(names)?;
		let rows = self
			.rows
			.iter()
			.map(|row| FeatureRow {
				query_id: row.query_id.clone(),
				passage_id: row.passage_id.clone(),
				values: ids.iter().map(|id| row.values[id.0]).collect(),
				label: row.label,
			})
			.collect();

		Ok(Self { schema, rows })
	}

	/// Resolves `names` against this table's schema, then projects.
	pub fn select<S>(&self, names: &[S]) -> Result<Self>
	where
		S: AsRef<str>,
	{
		let ids = names
			.iter()
			.map(|name| self.schema.resolve(name.as_ref()))
			.collect::<Result<Vec<_>>>()?;

		self.project(&ids)
	}
}

#[derive(Deserialize)]
struct RawFeatureTable {
	features: FeatureSchema,
	rows: Vec<FeatureRow>,
}
impl TryFrom<RawFeatureTable> for FeatureTable {
	type Error = Error;

	fn try_from(raw: RawFeatureTable) -> Result<Self> {
		Self::new(raw.features, raw.rows)
	}
}
