//! Market order types.
//!
//! An [`OrderRequest`] is validated on construction, so a request that reaches
//! the wire always has a symbol and a positive quantity. The brokerage answers
//! with an [`OrderResponse`], which the placer reduces to an [`OrderOutcome`].

use crate::outcome::RequestFailure;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status literal the brokerage reports for a freshly accepted order.
pub const ORDER_ACCEPTED_STATUS: &str = "accepted";

/// Status literal the brokerage reports for a fully executed order.
pub const ORDER_FILLED_STATUS: &str = "filled";

/// Errors raised while building an order request or parsing a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderRequestError {
	#[error("Order symbol must not be empty")]
	EmptySymbol,
	#[error("Quantity must be positive, got {0}")]
	NonPositiveQuantity(Decimal),
	#[error("Invalid quantity '{0}'")]
	InvalidQuantity(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
	Buy,
	Sell,
}

impl fmt::Display for OrderSide {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderSide::Buy => f.write_str("buy"),
			OrderSide::Sell => f.write_str("sell"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
	Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
	Gtc,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
	symbol: String,
	qty: Decimal,
	side: OrderSide,
	#[serde(rename = "type")]
	order_type: OrderType,
	time_in_force: TimeInForce,
}

impl OrderRequest {
	/// Builds a good-till-cancelled market order.
	pub fn market(
		symbol: impl Into<String>,
		quantity: Decimal,
		side: OrderSide,
	) -> Result<Self, OrderRequestError> {
		let symbol = symbol.into();
		if symbol.trim().is_empty() {
			return Err(OrderRequestError::EmptySymbol);
		}
		if quantity <= Decimal::ZERO {
			return Err(OrderRequestError::NonPositiveQuantity(quantity));
		}
		Ok(Self {
			symbol,
			qty: quantity,
			side,
			order_type: OrderType::Market,
			time_in_force: TimeInForce::Gtc,
		})
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	pub fn quantity(&self) -> Decimal {
		self.qty
	}

	pub fn side(&self) -> OrderSide {
		self.side
	}
}

/// Parses an externally supplied quantity string into a positive decimal.
pub fn parse_quantity(raw: &str) -> Result<Decimal, OrderRequestError> {
	let quantity = Decimal::from_str(raw.trim())
		.map_err(|_| OrderRequestError::InvalidQuantity(raw.to_string()))?;
	if quantity <= Decimal::ZERO {
		return Err(OrderRequestError::NonPositiveQuantity(quantity));
	}
	Ok(quantity.normalize())
}

/// Correlation handle for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderHandle {
	pub client_order_id: String,
}

/// The fields of the order placement response the workflow relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
	pub client_order_id: String,
	pub status: String,
}

/// Verdict of a single placement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
	Accepted(OrderHandle),
	/// The brokerage answered 200 but did not report the order as accepted.
	Rejected { status: String },
	RequestFailed(RequestFailure),
}
