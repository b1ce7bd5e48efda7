//! Typed brokerage client.
//!
//! Every call carries the `APCA-API-KEY-ID` / `APCA-API-SECRET-KEY` headers.
//! Responses are checked for status 200 and decoded into the endpoint's
//! schema; anything else becomes a [`BrokerError`].

use crate::{HttpTransport, TransportError};
use redeem_types::{
	AccountSnapshot, HttpMethod, HttpRequest, HttpResponse, OrderRequest, OrderResponse,
	RequestFailure, SecretString, StatusSnapshot, TransferRequest, TransferResponse,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

const KEY_ID_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";

/// Errors returned by [`BrokerClient`] calls.
#[derive(Debug, Error)]
pub enum BrokerError {
	#[error("Brokerage credentials are missing")]
	MissingCredentials,
	#[error(transparent)]
	Transport(#[from] TransportError),
	#[error("Unexpected HTTP status {0}")]
	Status(u16),
	#[error("Failed to decode response: {0}")]
	Decode(String),
}

impl BrokerError {
	/// Collapses the error into the failure recorded in stage outcomes.
	pub fn into_request_failure(self) -> RequestFailure {
		match self {
			BrokerError::Status(code) => RequestFailure::Status(code),
			BrokerError::Decode(msg) => RequestFailure::MalformedBody(msg),
			BrokerError::Transport(e) => RequestFailure::Transport(e.to_string()),
			BrokerError::MissingCredentials => {
				RequestFailure::Transport("credentials missing".to_string())
			},
		}
	}
}

/// API key pair sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
	pub key_id: SecretString,
	pub secret_key: SecretString,
}

impl Credentials {
	pub fn new(key_id: SecretString, secret_key: SecretString) -> Self {
		Self { key_id, secret_key }
	}

	/// True when both halves of the key pair are non-blank.
	pub fn is_complete(&self) -> bool {
		!self.key_id.is_blank() && !self.secret_key.is_blank()
	}
}

/// Brokerage REST client bound to one base URL and key pair.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct BrokerClient {
	base_url: String,
	credentials: Credentials,
	transport: Arc<dyn HttpTransport>,
}

impl BrokerClient {
	pub fn new(
		base_url: impl Into<String>,
		credentials: Credentials,
		transport: Arc<dyn HttpTransport>,
	) -> Self {
		let base_url = base_url.into().trim_end_matches('/').to_string();
		Self {
			base_url,
			credentials,
			transport,
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// `POST /orders`
	pub async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, BrokerError> {
		let body = to_json(order)?;
		let response = self.send(HttpMethod::Post, "/orders", Some(body)).await?;
		decode_ok(response)
	}

	/// `GET /orders/{id}`
	pub async fn get_order_status(&self, order_id: &str) -> Result<StatusSnapshot, BrokerError> {
		let path = format!("/orders/{}", order_id);
		let response = self.send(HttpMethod::Get, &path, None).await?;
		decode_ok(response)
	}

	/// `DELETE /orders/{id}`
	///
	/// Returns whatever status the brokerage answered with; only a transport
	/// failure is an error.
	pub async fn cancel_order(&self, order_id: &str) -> Result<u16, BrokerError> {
		let path = format!("/orders/{}", order_id);
		let response = self.send(HttpMethod::Delete, &path, None).await?;
		Ok(response.status)
	}

	/// `POST /wallets/transfers`
	pub async fn create_transfer(
		&self,
		transfer: &TransferRequest,
	) -> Result<TransferResponse, BrokerError> {
		let body = to_json(transfer)?;
		let response = self
			.send(HttpMethod::Post, "/wallets/transfers", Some(body))
			.await?;
		decode_ok(response)
	}

	/// `GET /wallets/transfers/{id}`
	pub async fn get_transfer_status(
		&self,
		transfer_id: &str,
	) -> Result<StatusSnapshot, BrokerError> {
		let path = format!("/wallets/transfers/{}", transfer_id);
		let response = self.send(HttpMethod::Get, &path, None).await?;
		decode_ok(response)
	}

	/// `GET /account`
	pub async fn get_account(&self) -> Result<AccountSnapshot, BrokerError> {
		let response = self.send(HttpMethod::Get, "/account", None).await?;
		decode_ok(response)
	}

	async fn send(
		&self,
		method: HttpMethod,
		path: &str,
		body: Option<serde_json::Value>,
	) -> Result<HttpResponse, BrokerError> {
		if !self.credentials.is_complete() {
			return Err(BrokerError::MissingCredentials);
		}

		let mut request = HttpRequest::new(method, format!("{}{}", self.base_url, path))
			.header("accept", "application/json")
			.header(KEY_ID_HEADER, self.credentials.key_id.clone())
			.header(SECRET_KEY_HEADER, self.credentials.secret_key.clone());
		if let Some(body) = body {
			request = request
				.header("content-type", "application/json")
				.json(body);
		}

		tracing::trace!(method = %method, path, "Sending brokerage request");
		let response = self.transport.execute(request).await?;
		tracing::trace!(method = %method, path, status = response.status, "Brokerage response");
		Ok(response)
	}
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, BrokerError> {
	serde_json::to_value(value)
		.map_err(|e| BrokerError::Transport(TransportError::InvalidRequest(e.to_string())))
}

fn decode_ok<T: DeserializeOwned>(response: HttpResponse) -> Result<T, BrokerError> {
	if !response.is_ok() {
		return Err(BrokerError::Status(response.status));
	}
	serde_json::from_value(response.body).map_err(|e| BrokerError::Decode(e.to_string()))
}
