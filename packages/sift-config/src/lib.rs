mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Backend, Config, Index, Pagination, PaginationFields, Postgres, Query, Reconcile, Service,
	Storage,
};

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
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.backend.hosts.is_empty() {
		return Err(Error::Validation {
			message: "backend.hosts must contain at least one host.".to_string(),
		});
	}

	for host in &cfg.backend.hosts {
		if !(host.starts_with("http://") || host.starts_with("https://")) {
			return Err(Error::Validation {
				message: format!("backend.hosts entry {host:?} must start with http:// or https://."),
			});
		}
	}

	if cfg.backend.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "backend.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &cfg.backend.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("backend.default_headers.{key} must be a string."),
			});
		}
	}

	if cfg.index.prefix.chars().any(|ch| ch == ',' || ch == '*' || ch.is_whitespace()) {
		return Err(Error::Validation {
			message: "index.prefix must not contain commas, wildcards, or whitespace.".to_string(),
		});
	}
	if cfg.query.default_per_page == 0 {
		return Err(Error::Validation {
			message: "query.default_per_page must be greater than zero.".to_string(),
		});
	}

	let mut seen = HashSet::new();

	for (field, path) in cfg.pagination.fields.entries() {
		if path.is_empty() || path.split('.').any(str::is_empty) {
			return Err(Error::Validation {
				message: format!(
					"pagination.fields.{field} must be a dot path without empty segments."
				),
			});
		}
		if !seen.insert(path) {
			return Err(Error::Validation {
				message: format!("pagination.fields.{field} reuses the path {path:?}."),
			});
		}
	}

	let entries = cfg.pagination.fields.entries();

	for (parent_field, parent) in entries {
		for (field, path) in entries {
			if path.strip_prefix(parent).is_some_and(|rest| rest.starts_with('.')) {
				return Err(Error::Validation {
					message: format!(
						"pagination.fields.{field} nests under pagination.fields.{parent_field} \
						 ({parent:?})."
					),
				});
			}
		}
	}

	if let Some(storage) = cfg.storage.as_ref() {
		if storage.postgres.dsn.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.postgres.dsn must be non-empty.".to_string(),
			});
		}
		if storage.postgres.pool_max_conns == 0 {
			return Err(Error::Validation {
				message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.backend.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.backend.api_key = None;
	}

	for host in &mut cfg.backend.hosts {
		let trimmed = host.trim().trim_end_matches('/');

		if trimmed.len() != host.len() {
			*host = trimmed.to_string();
		}
	}

	cfg.index.prefix = cfg.index.prefix.trim().to_string();
}
