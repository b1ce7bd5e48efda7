//! String formatting helpers for logs and CLI output.

use alloy_primitives::{hex, U256};

/// Shortens an identifier for log output.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

/// Renders a value as a 0x-prefixed, 32-byte big-endian ABI word.
pub fn abi_word_hex(value: U256) -> String {
	format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
}
