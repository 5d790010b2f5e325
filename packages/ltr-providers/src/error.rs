pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Model fit failed: {message}")]
	ModelFit { message: String },
	#[error("Model is not fitted.")]
	NotFitted,
	#[error("Invalid input: {message}")]
	InvalidInput { message: String },
	#[error("Invalid parameter {name}: {message}")]
	InvalidParameter { name: String, message: String },
	#[error("Optimizer error: {message}")]
	Optimizer { message: String },
	#[error("Rerank error: {message}")]
	Rerank { message: String },
	#[error("Objective evaluation aborted.")]
	ObjectiveAborted,
}
