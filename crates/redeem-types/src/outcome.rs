//! Outcome types shared by every stage that talks to the brokerage.

use serde::Deserialize;
use std::fmt;

/// Why a brokerage call did not produce a usable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
	/// The brokerage answered with a non-200 status.
	Status(u16),
	/// The request never produced a response (connect, TLS, timeout...).
	Transport(String),
	/// A 200 response whose body did not match the expected schema.
	MalformedBody(String),
}

impl RequestFailure {
	/// The raw HTTP status, when the brokerage answered at all.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			RequestFailure::Status(code) => Some(*code),
			_ => None,
		}
	}
}

impl fmt::Display for RequestFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RequestFailure::Status(code) => write!(f, "HTTP status {}", code),
			RequestFailure::Transport(msg) => write!(f, "transport error: {}", msg),
			RequestFailure::MalformedBody(msg) => write!(f, "malformed response body: {}", msg),
		}
	}
}

/// One observation of an order's or transfer's status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusSnapshot {
	pub status: String,
}

impl StatusSnapshot {
	/// True when the status equals the terminal literal exactly.
	///
	/// No case folding or trimming: `"Filled"` and `"filled "` are not terminal.
	pub fn is_terminal(&self, terminal: &str) -> bool {
		self.status == terminal
	}
}

/// Result of waiting for an order fill or a transfer completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillResult {
	/// The terminal status was observed.
	Filled,
	/// Attempts (or the deadline) ran out without a terminal status.
	NotFilled,
	/// A status request failed; polling stopped immediately.
	Failed(RequestFailure),
}

impl FillResult {
	pub fn is_filled(&self) -> bool {
		matches!(self, FillResult::Filled)
	}
}
