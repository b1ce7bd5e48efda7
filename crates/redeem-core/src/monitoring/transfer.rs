//! Wallet transfer monitoring.

use crate::monitoring::poller::{poll_until_terminal, PollPolicy};
use redeem_broker::{BrokerClient, BrokerError};
use redeem_types::{truncate_id, FillResult};
use tracing::instrument;

/// Waits for an outbound wallet transfer to complete.
pub struct TransferMonitor {
	broker: BrokerClient,
	policy: PollPolicy,
}

impl TransferMonitor {
	pub fn new(broker: BrokerClient, policy: PollPolicy) -> Self {
		Self { broker, policy }
	}

	#[instrument(skip_all, fields(transfer_id = %truncate_id(transfer_id)))]
	pub async fn await_transfer(&self, transfer_id: &str) -> FillResult {
		let broker = &self.broker;
		let result = poll_until_terminal(&self.policy, move || async move {
			broker
				.get_transfer_status(transfer_id)
				.await
				.map_err(BrokerError::into_request_failure)
		})
		.await;

		if result.is_filled() {
			tracing::info!("Transfer complete");
		}
		result
	}
}
