pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
	#[error("No relevant entries for queries {query_ids:?}.")]
	EmptyResultSet { query_ids: Vec<String> },
	#[error("Unknown feature {name}.")]
	UnknownFeature { name: String },
	#[error("Feature {name} is declared twice.")]
	DuplicateFeature { name: String },
	#[error("Row {index} has {actual} values; the schema declares {expected}.")]
	RowWidth { index: usize, expected: usize, actual: usize },
}
