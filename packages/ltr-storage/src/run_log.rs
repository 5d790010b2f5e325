use std::path::Path;

use crate::{JsonFileStore, Result, RunRecord, RunStore};

/// Records loaded once at open; every append rewrites the whole log.
pub struct RunLog {
	store: Box<dyn RunStore>,
	records: Vec<RunRecord>,
}
impl RunLog {
	pub fn open<S>(store: S) -> Result<Self>
	where
		S: RunStore + 'static,
	{
		let records = store.load()?;

		tracing::info!(location = %store.location(), records = records.len(), "Run log opened.");

		Ok(Self { store: Box::new(store), records })
	}

	pub fn open_file(path: &Path) -> Result<Self> {
		Self::open(JsonFileStore::new(path))
	}

	pub fn records(&self) -> &[RunRecord] {
		&self.records
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn location(&self) -> String {
		self.store.location()
	}

	/// Appends and persists. On a failed save the in-memory log is left as it was.
	pub fn append(&mut self, record: RunRecord) -> Result<&RunRecord> {
		self.records.push(record);

		if let Err(err) = self.store.save(&self.records) {
			self.records.pop();

			return Err(err);
		}

		let index = self.records.len() - 1;

		Ok(&self.records[index])
	}
}
