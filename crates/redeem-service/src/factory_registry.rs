//! Transport factory lookup and engine construction.

use redeem_broker::TransportFactory;
use redeem_config::Config;
use redeem_core::{BuilderError, EngineBuilder, RedemptionEngine};
use std::collections::HashMap;

/// Every registered transport, keyed by its configuration name.
pub fn transport_factories() -> HashMap<String, TransportFactory> {
	redeem_broker::get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect()
}

/// Builds the engine using the transport named in `config`.
pub fn build_engine(config: Config) -> Result<RedemptionEngine, BuilderError> {
	EngineBuilder::new(config).build(&transport_factories())
}
