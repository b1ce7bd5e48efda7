//! Brokerage access for the redemption workflow.
//!
//! Two layers live here. [`HttpTransport`] is the single
//! `execute(request) -> response` primitive the rest of the system depends
//! on; implementations register themselves through
//! [`get_all_implementations`]. [`BrokerClient`] sits on top of it, owns the
//! base URL and credentials, and exposes one typed method per endpoint.

use async_trait::async_trait;
use redeem_types::{ConfigSchema, HttpRequest, HttpResponse, ImplementationRegistry};
use thiserror::Error;

mod client;

pub use client::{BrokerClient, BrokerError, Credentials};

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors raised by a transport before any HTTP status is available.
#[derive(Debug, Error)]
pub enum TransportError {
	/// Connection, TLS, DNS or timeout failure.
	#[error("Network error: {0}")]
	Network(String),
	/// The request could not be built.
	#[error("Invalid request: {0}")]
	InvalidRequest(String),
	/// The implementation's configuration was rejected.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// The HTTP primitive every brokerage call goes through.
///
/// Implementations must surface network-level failures as `Err`, never as a
/// successful response.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
	/// Returns the configuration schema for this transport.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Sends one request and returns its status and decoded JSON body.
	async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Factory signature every transport implementation provides.
pub type TransportFactory = fn(&toml::Value) -> Result<Box<dyn HttpTransport>, TransportError>;

/// Registry trait for transport implementations.
pub trait TransportRegistry: ImplementationRegistry<Factory = TransportFactory> {}

/// Returns `(name, factory)` for every available transport implementation.
pub fn get_all_implementations() -> Vec<(&'static str, TransportFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}
