//! Core redemption workflow.
//!
//! Liquidates an equity position, buys a stablecoin with the proceeds and
//! transfers it to a fixed wallet address, reporting the transferred amount
//! as an 18-decimal fixed-point integer (zero on any failure).
//!
//! - [`handlers`] place and cancel orders and initiate transfers.
//! - [`monitoring`] polls order and transfer status until a terminal literal.
//! - [`state`] validates the workflow's state transitions.
//! - [`engine`] sequences the stages.
//! - [`builder`] wires configuration and transports into an engine.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod monitoring;
pub mod state;

pub use builder::{BuilderError, EngineBuilder};
pub use engine::RedemptionEngine;
pub use monitoring::{poll_until_terminal, PollPolicy};
