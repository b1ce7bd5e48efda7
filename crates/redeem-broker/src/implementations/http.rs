//! `reqwest`-backed HTTP transport.

use crate::{HttpTransport, TransportError, TransportFactory, TransportRegistry};
use async_trait::async_trait;
use redeem_types::{
	ConfigSchema, Field, FieldType, HttpMethod, HttpRequest, HttpResponse, ImplementationRegistry,
	Schema, ValidationError,
};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("redeem/", env!("CARGO_PKG_VERSION"));

/// Transport that sends requests with a shared `reqwest::Client`.
pub struct HttpClientTransport {
	client: reqwest::Client,
}

impl HttpClientTransport {
	pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.pool_idle_timeout(Duration::from_secs(90))
			.user_agent(user_agent)
			.build()
			.map_err(|e| TransportError::Configuration(e.to_string()))?;
		Ok(Self { client })
	}
}

#[async_trait]
impl HttpTransport for HttpClientTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpTransportSchema)
	}

	async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		let method = match request.method {
			HttpMethod::Get => reqwest::Method::GET,
			HttpMethod::Post => reqwest::Method::POST,
			HttpMethod::Delete => reqwest::Method::DELETE,
		};

		let mut builder = self.client.request(method, &request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.expose_secret());
		}
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder
			.send()
			.await
			.map_err(|e| TransportError::Network(e.without_url().to_string()))?;
		let status = response.status().as_u16();
		let bytes = response
			.bytes()
			.await
			.map_err(|e| TransportError::Network(e.without_url().to_string()))?;

		// Empty or non-JSON bodies are kept as Null; callers decide whether
		// that is acceptable for the endpoint.
		let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

		Ok(HttpResponse { status, body })
	}
}

/// Configuration schema for the `http` transport.
///
/// Both fields are optional:
/// - `timeout_seconds`: per-request timeout, 1..=300 (default 30)
/// - `user_agent`: non-blank string
pub struct HttpTransportSchema;

impl ConfigSchema for HttpTransportSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
				Field::new("user_agent", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(s) if s.trim().is_empty() => {
							Err("user_agent cannot be blank".to_string())
						},
						_ => Ok(()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create the `http` transport from configuration.
pub fn create_transport(config: &toml::Value) -> Result<Box<dyn HttpTransport>, TransportError> {
	HttpTransportSchema
		.validate(config)
		.map_err(|e| TransportError::Configuration(e.to_string()))?;

	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|secs| secs as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
	let user_agent = config
		.get("user_agent")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_USER_AGENT);

	Ok(Box::new(HttpClientTransport::new(
		Duration::from_secs(timeout),
		user_agent,
	)?))
}

/// Registry for the `http` transport.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = TransportFactory;

	fn factory() -> Self::Factory {
		create_transport
	}
}

impl TransportRegistry for Registry {}
