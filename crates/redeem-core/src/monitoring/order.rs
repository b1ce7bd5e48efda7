//! Order fill monitoring.

use crate::monitoring::poller::{poll_until_terminal, PollPolicy};
use redeem_broker::{BrokerClient, BrokerError};
use redeem_types::{truncate_id, FillResult};
use tracing::instrument;

/// Waits for a submitted order to reach its filled status.
pub struct OrderFillMonitor {
	broker: BrokerClient,
	policy: PollPolicy,
}

impl OrderFillMonitor {
	pub fn new(broker: BrokerClient, policy: PollPolicy) -> Self {
		Self { broker, policy }
	}

	/// Polls `GET /orders/{id}` until the order is filled or the policy runs out.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn await_fill(&self, order_id: &str) -> FillResult {
		let broker = &self.broker;
		let result = poll_until_terminal(&self.policy, move || async move {
			broker
				.get_order_status(order_id)
				.await
				.map_err(BrokerError::into_request_failure)
		})
		.await;

		if result.is_filled() {
			tracing::info!("Order filled");
		}
		result
	}
}
