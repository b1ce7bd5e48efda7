//! Market order placement and cancellation.

use redeem_broker::{BrokerClient, BrokerError};
use redeem_types::{
	truncate_id, OrderHandle, OrderOutcome, OrderRequest, RequestFailure, ORDER_ACCEPTED_STATUS,
};
use tracing::instrument;

/// Places and cancels market orders.
pub struct OrderHandler {
	broker: BrokerClient,
}

impl OrderHandler {
	pub fn new(broker: BrokerClient) -> Self {
		Self { broker }
	}

	/// Submits `order` once.
	///
	/// The order counts as accepted only when the brokerage answers 200 and
	/// reports exactly `"accepted"`.
	#[instrument(skip_all, fields(symbol = %order.symbol(), side = %order.side(), qty = %order.quantity()))]
	pub async fn place_order(&self, order: &OrderRequest) -> OrderOutcome {
		let response = match self.broker.submit_order(order).await {
			Ok(response) => response,
			Err(e) => {
				tracing::error!(error = %e, "Order submission failed");
				return OrderOutcome::RequestFailed(e.into_request_failure());
			},
		};

		if response.status != ORDER_ACCEPTED_STATUS || response.client_order_id.is_empty() {
			tracing::warn!(status = %response.status, "Order not accepted");
			return OrderOutcome::Rejected {
				status: response.status,
			};
		}

		tracing::info!(order_id = %truncate_id(&response.client_order_id), "Order accepted");
		OrderOutcome::Accepted(OrderHandle {
			client_order_id: response.client_order_id,
		})
	}

	/// Requests cancellation and returns the brokerage's HTTP status.
	///
	/// Any status is passed through; only a transport failure is an error.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn cancel_order(&self, order_id: &str) -> Result<u16, RequestFailure> {
		match self.broker.cancel_order(order_id).await {
			Ok(status) => {
				tracing::info!(status, "Cancellation requested");
				Ok(status)
			},
			Err(e) => {
				tracing::error!(error = %e, "Cancellation request failed");
				Err(BrokerError::into_request_failure(e))
			},
		}
	}
}
