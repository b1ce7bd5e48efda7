//! Status monitors for orders and wallet transfers.
//!
//! Both monitors are thin wrappers around [`poller::poll_until_terminal`]
//! that bind it to a brokerage status endpoint.

pub mod order;
pub mod poller;
pub mod transfer;

pub use order::OrderFillMonitor;
pub use poller::{poll_until_terminal, PollPolicy};
pub use transfer::TransferMonitor;
