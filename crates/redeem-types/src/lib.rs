//! Common types for the brokerage redemption workflow.
//!
//! Request and response schemas for every brokerage endpoint the workflow
//! touches, the outcome types each stage resolves to, and the shared
//! configuration-validation and registry plumbing used by the other crates.

/// Brokerage account snapshot returned by the balance endpoint.
pub mod account;
/// Transport-neutral HTTP request/response types.
pub mod http;
/// Market order requests, handles and outcomes.
pub mod order;
/// Request failures, status snapshots and fill results.
pub mod outcome;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Redacting wrapper for API credentials.
pub mod secret_string;
/// Asset transfer requests, handles and outcomes.
pub mod transfer;
/// Formatting and fixed-point encoding helpers.
pub mod utils;
/// Configuration validation types.
pub mod validation;
/// Workflow states, errors and the final report.
pub mod workflow;

pub use account::*;
pub use http::*;
pub use order::*;
pub use outcome::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use transfer::*;
pub use utils::{
	abi_word_hex, to_fixed_point, to_fixed_point_rounded, truncate_id, EncodingError,
	FIXED_POINT_DECIMALS,
};
pub use validation::*;
pub use workflow::*;
