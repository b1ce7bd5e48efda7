//! Multi-file configuration loading.
//!
//! Follows `include` directives and makes sure each top-level section is
//! defined in exactly one file.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a configuration file together with everything it includes.
pub(crate) struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Canonical paths already loaded, for cycle detection.
	loaded_files: HashSet<PathBuf>,
	/// Which file each top-level section came from.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub(crate) fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads the main file, merges its includes and validates the result.
	pub(crate) async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path);
		let mut main_table = self.load_table(&config_path).await?;

		let includes = extract_includes(&main_table)?;
		main_table.remove("include");

		for key in main_table.keys() {
			self.section_sources
				.insert(key.clone(), config_path.clone());
		}

		for include in includes {
			let include_path = self.resolve_path(&include);
			let include_table = self.load_table(&include_path).await?;

			if include_table.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"Nested includes are not supported ({})",
					include_path.display()
				)));
			}

			for (key, value) in include_table {
				if let Some(existing) = self.section_sources.get(&key) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						key,
						existing.display(),
						include_path.display()
					)));
				}
				self.section_sources
					.insert(key.clone(), include_path.clone());
				main_table.insert(key, value);
			}
		}

		// Values are already resolved and must not be substituted again.
		let combined = toml::to_string(&main_table)
			.map_err(|e| ConfigError::Parse(format!("Failed to serialize combined config: {}", e)))?;
		Config::from_resolved(&combined)
	}

	/// Reads a file, resolves environment variables and parses it as a table.
	async fn load_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical_path = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical_path.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical_path.display()
			)));
		}

		let content = tokio::fs::read_to_string(&canonical_path).await?;
		let resolved = resolve_env_vars(&content)?;
		Ok(toml::from_str(&resolved)?)
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
		let path = path.as_ref();
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		}
	}
}

fn extract_includes(table: &toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.get("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use crate::{Config, ConfigError};
	use std::fs;
	use tempfile::TempDir;

	const WORKFLOW: &str = "[workflow]\ndestination_address = \"0xabc\"\n";

	#[tokio::test]
	async fn test_single_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(&path, format!("[broker]\nkey_id = \"PK\"\n{}", WORKFLOW)).unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.broker.key_id.expose_secret(), "PK");
		assert_eq!(config.workflow.destination_address, "0xabc");
	}

	#[tokio::test]
	async fn test_include_secrets_file() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("secrets.toml"),
			"[broker]\nkey_id = \"PKINC\"\nsecret_key = \"s3cr3t\"\n",
		)
		.unwrap();
		let path = dir.path().join("main.toml");
		fs::write(&path, format!("include = [\"secrets.toml\"]\n{}", WORKFLOW)).unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.broker.key_id.expose_secret(), "PKINC");
		assert_eq!(config.broker.secret_key.expose_secret(), "s3cr3t");
	}

	#[tokio::test]
	async fn test_duplicate_section_rejected() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("extra.toml"), WORKFLOW).unwrap();
		let path = dir.path().join("main.toml");
		fs::write(&path, format!("include = \"extra.toml\"\n[broker]\n{}", WORKFLOW)).unwrap();

		let err = Config::from_file(&path).await.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("Duplicate section 'workflow'")));
	}

	#[tokio::test]
	async fn test_self_include_rejected() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("main.toml");
		fs::write(&path, format!("include = \"main.toml\"\n[broker]\n{}", WORKFLOW)).unwrap();

		let err = Config::from_file(&path).await.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("Circular include")));
	}

	#[tokio::test]
	async fn test_env_values_are_substituted_once() {
		std::env::set_var("REDEEM_LOADER_NESTED_SECRET", "ab${REDEEM_LOADER_UNSET_INNER}cd");
		std::env::remove_var("REDEEM_LOADER_UNSET_INNER");

		let dir = TempDir::new().unwrap();
		let path = dir.path().join("main.toml");
		let contents = format!(
			"[broker]\nkey_id = \"PK\"\nsecret_key = \"${{REDEEM_LOADER_NESTED_SECRET}}\"\n{}",
			WORKFLOW
		);
		fs::write(&path, &contents).unwrap();

		let from_file = Config::from_file(&path).await.unwrap();
		let parsed: Config = contents.parse().unwrap();
		assert_eq!(
			from_file.broker.secret_key.expose_secret(),
			"ab${REDEEM_LOADER_UNSET_INNER}cd"
		);
		assert_eq!(from_file.broker.secret_key, parsed.broker.secret_key);
	}

	#[tokio::test]
	async fn test_missing_file() {
		let dir = TempDir::new().unwrap();
		let err = Config::from_file(dir.path().join("absent.toml"))
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::Io(_)));
	}
}
