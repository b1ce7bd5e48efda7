//! Transport-neutral HTTP types.
//!
//! The workflow talks to the brokerage through a single
//! `execute(request) -> response` primitive. These types are what crosses
//! that boundary, independent of the HTTP library behind it.

use crate::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP methods used by the brokerage endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	Get,
	Post,
	Delete,
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HttpMethod::Get => f.write_str("GET"),
			HttpMethod::Post => f.write_str("POST"),
			HttpMethod::Delete => f.write_str("DELETE"),
		}
	}
}

/// A single outgoing request.
///
/// Header values are held as [`SecretString`] because the authentication
/// headers carry credentials; `Debug` output therefore never shows them.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
	pub method: HttpMethod,
	pub url: String,
	pub headers: Vec<(String, SecretString)>,
	pub body: Option<serde_json::Value>,
}

impl HttpRequest {
	pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			headers: Vec::new(),
			body: None,
		}
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<SecretString>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);
		self
	}

	/// Looks up a header value by case-insensitive name.
	pub fn header_value(&self, name: &str) -> Option<&SecretString> {
		self.headers
			.iter()
			.find(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v)
	}
}

/// The status code and decoded JSON body of a response.
///
/// A body that is empty or not JSON is represented as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: serde_json::Value,
}

impl HttpResponse {
	pub fn new(status: u16, body: serde_json::Value) -> Self {
		Self { status, body }
	}

	pub fn is_ok(&self) -> bool {
		self.status == 200
	}
}
