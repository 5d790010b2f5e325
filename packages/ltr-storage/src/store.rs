use std::{
	fs, io,
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
};

use crate::{Error, Result, RunRecord};

/// Durable home of the run log. `save` always receives the full log.
pub trait RunStore {
	fn load(&self) -> Result<Vec<RunRecord>>;

	fn save(&mut self, records: &[RunRecord]) -> Result<()>;

	fn location(&self) -> String;
}

/// Pretty-printed JSON array on disk, replaced atomically on every save.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
	path: PathBuf,
}
impl JsonFileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn staging_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(|name| name.to_os_string()).unwrap_or_default();

		name.push(".tmp");

		self.path.with_file_name(name)
	}
}
impl RunStore for JsonFileStore {
	fn load(&self) -> Result<Vec<RunRecord>> {
		let raw = match fs::read_to_string(&self.path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				tracing::info!(path = %self.path.display(), "Run log not found. Starting empty.");

				return Ok(Vec::new());
			},
			Err(err) => return Err(Error::Io { path: self.path.clone(), source: err }),
		};

		if raw.trim().is_empty() {
			return Ok(Vec::new());
		}

		serde_json::from_str(&raw).map_err(|err| Error::Json { path: self.path.clone(), source: err })
	}

	fn save(&mut self, records: &[RunRecord]) -> Result<()> {
		if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
			fs::create_dir_all(parent)
				.map_err(|err| Error::Io { path: parent.to_path_buf(), source: err })?;
		}

		let payload = serde_json::to_vec_pretty(records)
			.map_err(|err| Error::Json { path: self.path.clone(), source: err })?;
		let staging = self.staging_path();

		fs::write(&staging, payload).map_err(|err| Error::Io { path: staging.clone(), source: err })?;
		fs::rename(&staging, &self.path)
			.map_err(|err| Error::Io { path: self.path.clone(), source: err })?;

		Ok(())
	}

	fn location(&self) -> String {
		self.path.display().to_string()
	}
}

/// Shared in-process store. Clones see the same records.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	records: Arc<Mutex<Vec<RunRecord>>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn snapshot(&self) -> Vec<RunRecord> {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl RunStore for MemoryStore {
	fn load(&self) -> Result<Vec<RunRecord>> {
		Ok(self.snapshot())
	}

	fn save(&mut self, records: &[RunRecord]) -> Result<()> {
		let mut stored = self.records.lock().unwrap_or_else(|err| err.into_inner());

		*stored = records.to_vec();

		Ok(())
	}

	fn location(&self) -> String {
		"memory".to_string()
	}
}
