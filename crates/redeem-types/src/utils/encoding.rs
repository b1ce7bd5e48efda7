//! Fixed-point encoding of decimal amounts into uint256.
//!
//! Downstream on-chain consumers expect amounts as integers scaled by 10^18.

use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of fractional digits in the encoded result.
pub const FIXED_POINT_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
	#[error("Cannot encode negative amount {0}")]
	Negative(Decimal),
}

/// Scales `amount` by 10^18 into a `U256`.
///
/// Fractional digits beyond the 18th are truncated toward zero.
pub fn to_fixed_point(amount: Decimal) -> Result<U256, EncodingError> {
	scale_with(amount, RoundingStrategy::ToZero)
}

/// Scales `amount` by 10^18 into a `U256`, rounding the 19th fractional
/// digit half away from zero.
pub fn to_fixed_point_rounded(amount: Decimal) -> Result<U256, EncodingError> {
	scale_with(amount, RoundingStrategy::MidpointAwayFromZero)
}

fn scale_with(amount: Decimal, strategy: RoundingStrategy) -> Result<U256, EncodingError> {
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(EncodingError::Negative(amount));
	}

	let rounded = amount.round_dp_with_strategy(FIXED_POINT_DECIMALS, strategy);
	let mantissa = rounded.mantissa().unsigned_abs();
	let scale = rounded.scale();

	let factor = U256::from(10u64).pow(U256::from(FIXED_POINT_DECIMALS - scale));
	Ok(U256::from(mantissa) * factor)
}
