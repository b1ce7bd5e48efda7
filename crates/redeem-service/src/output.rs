//! Result encoding for the command line.
//!
//! Every command ends by printing one uint256: first in decimal, then as
//! the 32-byte ABI word. Failures print zero.

use alloy_primitives::U256;
use redeem_broker::BrokerError;
use redeem_types::{abi_word_hex, to_fixed_point_rounded, AccountSnapshot};

/// Decimal and hex lines for `value`.
pub fn render(value: U256) -> String {
	format!("{}\n{}", value, abi_word_hex(value))
}

/// Fixed-point encoding of a balance read, rounded to 18 decimals, zero on
/// failure.
pub fn encode_balance(result: Result<AccountSnapshot, BrokerError>) -> U256 {
	match result {
		Ok(account) => match to_fixed_point_rounded(account.portfolio_value) {
			Ok(value) => value,
			Err(e) => {
				tracing::warn!(error = %e, "Portfolio value cannot be encoded");
				U256::ZERO
			},
		},
		Err(e) => {
			tracing::error!(error = %e, "Balance read failed");
			U256::ZERO
		},
	}
}
