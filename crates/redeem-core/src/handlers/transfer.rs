//! Outbound wallet transfer initiation.

use redeem_broker::BrokerClient;
use redeem_types::{truncate_id, TransferHandle, TransferOutcome, TransferRequest};
use rust_decimal::Decimal;
use tracing::instrument;

/// Starts transfers of a fixed asset to a fixed destination address.
pub struct TransferHandler {
	broker: BrokerClient,
	destination_address: String,
	asset: String,
}

impl TransferHandler {
	pub fn new(
		broker: BrokerClient,
		destination_address: impl Into<String>,
		asset: impl Into<String>,
	) -> Self {
		Self {
			broker,
			destination_address: destination_address.into(),
			asset: asset.into(),
		}
	}

	/// Requests one transfer of `amount` and returns its identifier.
	#[instrument(skip_all, fields(amount = %amount, asset = %self.asset))]
	pub async fn initiate_transfer(&self, amount: Decimal) -> TransferOutcome {
		let request = TransferRequest {
			amount,
			address: self.destination_address.clone(),
			asset: self.asset.clone(),
		};

		let response = match self.broker.create_transfer(&request).await {
			Ok(response) => response,
			Err(e) => {
				tracing::error!(error = %e, "Transfer initiation failed");
				return TransferOutcome::RequestFailed(e.into_request_failure());
			},
		};

		match response.first_id() {
			Some(id) => {
				tracing::info!(transfer_id = %truncate_id(id), "Transfer initiated");
				TransferOutcome::Accepted(TransferHandle {
					transfer_id: id.to_string(),
				})
			},
			None => {
				tracing::error!("Transfer response carried no identifier");
				TransferOutcome::Rejected
			},
		}
	}
}
