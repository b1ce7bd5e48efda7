//! Brokerage account snapshot.

use rust_decimal::Decimal;
use serde::Deserialize;

/// The fields of `GET /account` the balance read uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountSnapshot {
	pub portfolio_value: Decimal,
}
