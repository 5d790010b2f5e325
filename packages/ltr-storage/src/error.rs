use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to access run log at {path:?}: {source}")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Run log at {path:?} is not valid JSON: {source}")]
	Json { path: PathBuf, source: serde_json::Error },
}
