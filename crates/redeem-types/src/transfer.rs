//! Wallet transfer types.

use crate::outcome::RequestFailure;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /wallets/transfers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRequest {
	pub amount: Decimal,
	pub address: String,
	pub asset: String,
}

/// Correlation handle for an initiated transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferHandle {
	pub transfer_id: String,
}

/// The fields of the transfer initiation response the workflow relies on.
///
/// A missing `ids` key is read as an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferResponse {
	#[serde(default)]
	pub ids: Vec<String>,
}

impl TransferResponse {
	/// The first identifier in the response, if any.
	pub fn first_id(&self) -> Option<&str> {
		self.ids.first().map(String::as_str).filter(|id| !id.is_empty())
	}
}

/// Verdict of a transfer initiation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
	Accepted(TransferHandle),
	/// The brokerage answered 200 but returned no transfer identifier.
	Rejected,
	RequestFailed(RequestFailure),
}
