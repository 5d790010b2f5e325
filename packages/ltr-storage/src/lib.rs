//! Append-only log of evaluation runs.

pub mod models;
pub mod run_log;
pub mod store;

mod error;

pub use error::Error;
pub use models::{RunMetrics, RunRecord};
pub use run_log::RunLog;
pub use store::{JsonFileStore, MemoryStore, RunStore};

pub type Result<T, E = Error> = std::result::Result<T, E>;
