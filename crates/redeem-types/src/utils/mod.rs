//! Helpers for log formatting and on-chain result encoding.

pub mod encoding;
pub mod formatting;

pub use encoding::{to_fixed_point, to_fixed_point_rounded, EncodingError, FIXED_POINT_DECIMALS};
pub use formatting::{abi_word_hex, truncate_id};
