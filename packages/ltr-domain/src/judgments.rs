use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::PairKey;

/// Graded relevance judgment. Grade 0 means not relevant.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Qrel {
	pub query_id: String,
	pub passage_id: String,
	pub grade: u32,
}

/// Exact-match lookup over relevance judgments. Pairs without a judgment are
/// not relevant.
#[derive(Clone, Debug, Default)]
pub struct Qrels {
	grades: HashMap<PairKey, u32>,
}
impl Qrels {
	pub fn grade(&self, key: &PairKey) -> u32 {
		self.grades.get(key).copied().unwrap_or(0)
	}

	pub fn len(&self) -> usize {
		self.grades.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grades.is_empty()
	}
}
impl FromIterator<Qrel> for Qrels {
	/// Later judgments for the same pair replace earlier ones.
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = Qrel>,
	{
		let grades = iter
			.into_iter()
			.map(|qrel| (PairKey::new(qrel.query_id, qrel.passage_id), qrel.grade))
			.collect();

		Self { grades }
	}
}
