mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Classifier, Config, Evaluation, Rerank, Search, SearchDimension, Service, Storage};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.is_empty() {
		return Err(Error::Validation { message: "service.log_level must be non-empty.".to_string() });
	}
	if cfg.storage.run_log.as_os_str().is_empty() {
		return Err(Error::Validation { message: "storage.run_log must be non-empty.".to_string() });
	}
	if cfg.evaluation.cutoff == 0 {
		return Err(Error::Validation {
			message: "evaluation.cutoff must be greater than zero.".to_string(),
		});
	}
	if !cfg.classifier.var_smoothing.is_finite() {
		return Err(Error::Validation {
			message: "classifier.var_smoothing must be a finite number.".to_string(),
		});
	}
	if cfg.classifier.var_smoothing <= 0.0 {
		return Err(Error::Validation {
			message: "classifier.var_smoothing must be greater than zero.".to_string(),
		});
	}
	if cfg.search.trials == 0 {
		return Err(Error::Validation {
			message: "search.trials must be greater than zero.".to_string(),
		});
	}
	if cfg.search.space.is_empty() {
		return Err(Error::Validation { message: "search.space must be non-empty.".to_string() });
	}

	let mut seen = HashSet::new();

	for dimension in &cfg.search.space {
		validate_dimension(dimension)?;

		if !seen.insert(dimension.name()) {
			return Err(Error::Validation {
				message: format!("search.space dimension {} is declared twice.", dimension.name()),
			});
		}
	}

	if let Some(rerank) = cfg.rerank.as_ref() {
		if rerank.top_k == 0 {
			return Err(Error::Validation {
				message: "rerank.top_k must be greater than zero.".to_string(),
			});
		}
		if rerank.max_pairs == 0 {
			return Err(Error::Validation {
				message: "rerank.max_pairs must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn validate_dimension(dimension: &SearchDimension) -> Result<()> {
	let name = dimension.name();

	if name.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.space dimension names must be non-empty.".to_string(),
		});
	}

	match dimension {
		SearchDimension::Integer { low, high, .. } =>
			if low > high {
				return Err(Error::Validation {
					message: format!("search.space.{name} low must not exceed high."),
				});
			},
		SearchDimension::Real { low, high, log_scale, .. } => {
			if !low.is_finite() || !high.is_finite() {
				return Err(Error::Validation {
					message: format!("search.space.{name} bounds must be finite numbers."),
				});
			}
			if low > high {
				return Err(Error::Validation {
					message: format!("search.space.{name} low must not exceed high."),
				});
			}
			if *log_scale && *low <= 0.0 {
				return Err(Error::Validation {
					message: format!(
						"search.space.{name} bounds must be greater than zero when log_scale is set."
					),
				});
			}
		},
		SearchDimension::Categorical { values, .. } =>
			if values.is_empty() {
				return Err(Error::Validation {
					message: format!("search.space.{name} values must be non-empty."),
				});
			},
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let log_level = cfg.service.log_level.trim();

	if log_level.len() != cfg.service.log_level.len() {
		cfg.service.log_level = log_level.to_string();
	}

	if let Some(raw) = cfg.storage.run_log.to_str() {
		let trimmed = raw.trim();

		if trimmed.len() != raw.len() {
			cfg.storage.run_log = trimmed.into();
		}
	}
}
