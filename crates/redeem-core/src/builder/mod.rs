//! Builder for constructing redemption engines.
//!
//! Resolves the configured transport from a set of named factories and
//! wires it into a [`RedemptionEngine`]. Tests can skip the lookup by
//! supplying a transport directly.

use crate::engine::RedemptionEngine;
use redeem_broker::{HttpTransport, TransportError};
use redeem_config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Builder for a [`RedemptionEngine`].
pub struct EngineBuilder {
	config: Config,
	transport: Option<Arc<dyn HttpTransport>>,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			transport: None,
		}
	}

	/// Uses `transport` instead of resolving one from factories.
	pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Builds the engine, creating the primary transport with the matching
	/// factory unless one was supplied.
	pub fn build<F>(self, factories: &HashMap<String, F>) -> Result<RedemptionEngine, BuilderError>
	where
		F: Fn(&toml::Value) -> Result<Box<dyn HttpTransport>, TransportError>,
	{
		let transport = match self.transport {
			Some(transport) => transport,
			None => {
				let primary = &self.config.transport.primary;
				let factory = factories.get(primary).ok_or_else(|| {
					BuilderError::MissingComponent(format!(
						"No transport implementation named '{}'",
						primary
					))
				})?;

				match factory(&self.config.transport.primary_config()) {
					Ok(transport) => {
						tracing::info!(component = "transport", implementation = %primary, "Loaded");
						Arc::from(transport)
					},
					Err(e) => {
						tracing::error!(
							component = "transport",
							implementation = %primary,
							error = %e,
							"Failed to create transport implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create transport implementation '{}': {}",
							primary, e
						)));
					},
				}
			},
		};

		tracing::info!(
			base_url = %self.config.broker.base_url,
			sell_symbol = %self.config.workflow.sell_symbol,
			stable_symbol = %self.config.workflow.stable_symbol,
			"Engine ready"
		);
		Ok(RedemptionEngine::new(&self.config, transport))
	}
}
