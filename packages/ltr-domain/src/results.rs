use serde::{Deserialize, Serialize};

/// One evaluated candidate: classifier confidence joined with its relevance grade.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScoredResult {
	pub query_id: String,
	pub passage_id: String,
	pub confidence: f64,
	pub relevance: u32,
}
impl ScoredResult {
	pub fn is_relevant(&self) -> bool {
		self.relevance >= 1
	}
}

/// A relevant entry after ranking. `position` counts relevant entries only
/// (1..=M); `rank` is the entry's rank among all candidates of its query.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedHit {
	pub position: usize,
	pub rank: usize,
	pub query_id: String,
	pub passage_id: String,
	pub confidence: f64,
	pub relevance: u32,
}
