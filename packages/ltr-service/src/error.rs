pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Model fit failed: {message}")]
	ModelFit { message: String },
	#[error("Row count mismatch in {partition}: expected {expected}, got {actual}.")]
	RowCountMismatch { partition: String, expected: usize, actual: usize },
	#[error("Schema mismatch in {partition}: {message}")]
	SchemaMismatch { partition: String, message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<ltr_providers::Error> for Error {
	fn from(err: ltr_providers::Error) -> Self {
		match err {
			ltr_providers::Error::ModelFit { message } => Self::ModelFit { message },
			other => Self::Provider { message: other.to_string() },
		}
	}
}

impl From<ltr_storage::Error> for Error {
	fn from(err: ltr_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<ltr_domain::Error> for Error {
	fn from(err: ltr_domain::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
