//! Request handlers for the workflow's brokerage calls.
//!
//! Handlers turn raw client results into stage outcomes; they never retry
//! and never poll.

pub mod order;
pub mod transfer;

pub use order::OrderHandler;
pub use transfer::TransferHandler;
