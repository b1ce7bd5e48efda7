//! Configuration for the redemption workflow.
//!
//! Configuration is read from TOML. String values may reference environment
//! variables as `${VAR}` or `${VAR:-default}`, which keeps credentials out of
//! the file itself.
//!
//! ## Modular Configuration Support
//!
//! A file may pull in others with `include = ["secrets.toml"]`. Each top-level
//! section must appear in exactly one file.

mod loader;

use redeem_types::{SecretString, ORDER_FILLED_STATUS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Brokerage endpoint and credentials.
	pub broker: BrokerConfig,
	/// HTTP transport selection.
	#[serde(default)]
	pub transport: TransportConfig,
	/// Assets, destination and polling policies.
	pub workflow: WorkflowConfig,
}

/// Brokerage endpoint and credentials.
///
/// Empty credentials are accepted here; the workflow rejects them before
/// making any request so the failure is reported as a pre-flight error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
	#[serde(default = "default_base_url")]
	pub base_url: String,
	/// Sent as `APCA-API-KEY-ID`.
	#[serde(default)]
	pub key_id: SecretString,
	/// Sent as `APCA-API-SECRET-KEY`.
	#[serde(default)]
	pub secret_key: SecretString,
}

fn default_base_url() -> String {
	"https://paper-api.alpaca.markets/v2".to_string()
}

/// HTTP transport selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
	/// Which implementation to use.
	#[serde(default = "default_transport")]
	pub primary: String,
	/// Raw per-implementation tables, validated by each implementation's schema.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl Default for TransportConfig {
	fn default() -> Self {
		Self {
			primary: default_transport(),
			implementations: HashMap::new(),
		}
	}
}

fn default_transport() -> String {
	"http".to_string()
}

impl TransportConfig {
	/// The raw table for the primary implementation, or an empty table.
	pub fn primary_config(&self) -> toml::Value {
		self.implementations
			.get(&self.primary)
			.cloned()
			.unwrap_or_else(|| toml::Value::Table(toml::Table::new()))
	}
}

/// Assets, destination and polling policies.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
	/// Ticker liquidated in the first leg.
	#[serde(default = "default_sell_symbol")]
	pub sell_symbol: String,
	/// Stable-value ticker bought in the second leg.
	#[serde(default = "default_stable_symbol")]
	pub stable_symbol: String,
	/// Wallet address the stable asset is transferred to.
	pub destination_address: String,
	/// Asset code used for the wallet transfer.
	#[serde(default = "default_stable_symbol")]
	pub transfer_asset: String,
	/// Polling policy while waiting for order fills.
	#[serde(default = "default_order_fill")]
	pub order_fill: PollConfig,
	/// Polling policy while waiting for the transfer to complete.
	#[serde(default = "default_transfer")]
	pub transfer: PollConfig,
}

fn default_sell_symbol() -> String {
	"NVDA".to_string()
}

fn default_stable_symbol() -> String {
	"USDCUSD".to_string()
}

/// Orders: 30 polls 5 seconds apart, about 2.5 minutes.
fn default_order_fill() -> PollConfig {
	PollConfig {
		poll_interval_seconds: default_poll_interval(),
		max_attempts: 30,
		deadline_seconds: None,
		terminal_status: default_terminal_status(),
	}
}

/// Transfers: 120 polls 5 seconds apart, about 10 minutes.
fn default_transfer() -> PollConfig {
	PollConfig {
		poll_interval_seconds: default_poll_interval(),
		max_attempts: 120,
		deadline_seconds: None,
		terminal_status: default_terminal_status(),
	}
}

/// A bounded polling policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollConfig {
	#[serde(default = "default_poll_interval")]
	pub poll_interval_seconds: u64,
	/// Number of status requests before giving up.
	pub max_attempts: u32,
	/// Optional wall-clock ceiling for the whole wait.
	#[serde(default)]
	pub deadline_seconds: Option<u64>,
	/// Status literal that ends the wait successfully.
	#[serde(default = "default_terminal_status")]
	pub terminal_status: String,
}

fn default_poll_interval() -> u64 {
	5
}

fn default_terminal_status() -> String {
	ORDER_FILLED_STATUS.to_string()
}

impl PollConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_seconds)
	}

	pub fn deadline(&self) -> Option<Duration> {
		self.deadline_seconds.map(Duration::from_secs)
	}

	fn validate(&self, section: &str) -> Result<(), ConfigError> {
		if self.max_attempts == 0 {
			return Err(ConfigError::Validation(format!(
				"{}.max_attempts must be at least 1",
				section
			)));
		}
		if self.terminal_status.is_empty() {
			return Err(ConfigError::Validation(format!(
				"{}.terminal_status cannot be empty",
				section
			)));
		}
		if self.deadline_seconds == Some(0) {
			return Err(ConfigError::Validation(format!(
				"{}.deadline_seconds must be positive when set",
				section
			)));
		}
		Ok(())
	}
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with `default`
/// for `${VAR_NAME:-default}` when the variable is unset.
///
/// Input is limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path.display())))?;

		let mut loader = loader::ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// Parses and validates text whose environment variables are already resolved.
	pub(crate) fn from_resolved(resolved: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(resolved)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates cross-field constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		let base_url = self.broker.base_url.trim();
		if base_url.is_empty() {
			return Err(ConfigError::Validation("broker.base_url cannot be empty".into()));
		}
		if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
			return Err(ConfigError::Validation(format!(
				"broker.base_url must be an http(s) URL, got '{}'",
				base_url
			)));
		}

		if self.transport.primary.is_empty() {
			return Err(ConfigError::Validation(
				"transport.primary cannot be empty".into(),
			));
		}

		let workflow = &self.workflow;
		if workflow.sell_symbol.trim().is_empty() {
			return Err(ConfigError::Validation("workflow.sell_symbol cannot be empty".into()));
		}
		if workflow.stable_symbol.trim().is_empty() {
			return Err(ConfigError::Validation(
				"workflow.stable_symbol cannot be empty".into(),
			));
		}
		if workflow.destination_address.trim().is_empty() {
			return Err(ConfigError::Validation(
				"workflow.destination_address cannot be empty".into(),
			));
		}
		if workflow.transfer_asset.trim().is_empty() {
			return Err(ConfigError::Validation(
				"workflow.transfer_asset cannot be empty".into(),
			));
		}
		workflow.order_fill.validate("workflow.order_fill")?;
		workflow.transfer.validate("workflow.transfer")?;

		Ok(())
	}

	/// A fully populated configuration pointing at `base_url`, for tests.
	#[cfg(any(test, feature = "testing"))]
	pub fn for_testing(base_url: &str) -> Self {
		Self {
			broker: BrokerConfig {
				base_url: base_url.to_string(),
				key_id: SecretString::from("PKTEST"),
				secret_key: SecretString::from("test-secret"),
			},
			transport: TransportConfig::default(),
			workflow: WorkflowConfig {
				sell_symbol: default_sell_symbol(),
				stable_symbol: default_stable_symbol(),
				destination_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
				transfer_asset: default_stable_symbol(),
				order_fill: default_order_fill(),
				transfer: default_transfer(),
			},
		}
	}
}

/// Parses and validates a configuration string.
///
/// Environment variables are resolved before parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		Config::from_resolved(&resolved)
	}
}
