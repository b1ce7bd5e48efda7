//! Workflow states, errors and the final report.

use crate::outcome::RequestFailure;
use crate::utils::to_fixed_point;
use alloy_primitives::U256;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// The part of the workflow an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
	Preflight,
	Sell,
	Buy,
	Transfer,
}

impl fmt::Display for WorkflowStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WorkflowStage::Preflight => f.write_str("preflight"),
			WorkflowStage::Sell => f.write_str("sell"),
			WorkflowStage::Buy => f.write_str("buy"),
			WorkflowStage::Transfer => f.write_str("transfer"),
		}
	}
}

/// States of a single workflow invocation.
///
/// The machine only moves forward: `Created -> SellPending -> SellFilled ->
/// BuyPending -> BuyFilled -> TransferPending -> TransferFilled -> Done`.
/// Every `*Failed` state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
	Created,
	PreflightFailed,
	SellPending,
	SellFilled,
	SellFailed,
	BuyPending,
	BuyFilled,
	BuyFailed,
	TransferPending,
	TransferFilled,
	TransferFailed,
	Done,
}

impl WorkflowState {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			WorkflowState::PreflightFailed
				| WorkflowState::SellFailed
				| WorkflowState::BuyFailed
				| WorkflowState::TransferFailed
				| WorkflowState::Done
		)
	}
}

/// Everything that can abort a workflow invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
	#[error("Brokerage credentials are missing")]
	MissingCredentials,
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	#[error("{stage} request failed: {failure}")]
	RequestFailed {
		stage: WorkflowStage,
		failure: RequestFailure,
	},
	#[error("{stage} order rejected with status '{status}'")]
	Rejected { stage: WorkflowStage, status: String },
	#[error("{stage} order {order_id} was not filled in time")]
	FillTimeout {
		stage: WorkflowStage,
		order_id: String,
	},
	#[error("Transfer initiation failed: {0}")]
	TransferInitiationFailed(String),
	#[error("Transfer {transfer_id} did not complete in time")]
	TransferTimeout { transfer_id: String },
	#[error("Internal error: {0}")]
	Internal(String),
}

impl WorkflowError {
	/// The stage whose failure this error reports.
	pub fn stage(&self) -> WorkflowStage {
		match self {
			WorkflowError::MissingCredentials
			| WorkflowError::InvalidInput(_)
			| WorkflowError::Internal(_) => WorkflowStage::Preflight,
			WorkflowError::RequestFailed { stage, .. }
			| WorkflowError::Rejected { stage, .. }
			| WorkflowError::FillTimeout { stage, .. } => *stage,
			WorkflowError::TransferInitiationFailed(_) | WorkflowError::TransferTimeout { .. } => {
				WorkflowStage::Transfer
			},
		}
	}
}

/// Final result of one workflow invocation.
///
/// Distinguishes the failing stage while [`WorkflowReport::encode`] keeps the
/// zero-sentinel contract for downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
	pub state: WorkflowState,
	pub outcome: Result<Decimal, WorkflowError>,
}

impl WorkflowReport {
	pub fn settled(amount: Decimal) -> Self {
		Self {
			state: WorkflowState::Done,
			outcome: Ok(amount),
		}
	}

	pub fn failed(state: WorkflowState, error: WorkflowError) -> Self {
		Self {
			state,
			outcome: Err(error),
		}
	}

	pub fn settled_amount(&self) -> Option<Decimal> {
		self.outcome.as_ref().ok().copied()
	}

	pub fn error(&self) -> Option<&WorkflowError> {
		self.outcome.as_ref().err()
	}

	/// The settled amount scaled by 10^18, or zero on any failure.
	pub fn encode(&self) -> U256 {
		match &self.outcome {
			Ok(amount) => to_fixed_point(*amount).unwrap_or(U256::ZERO),
			Err(_) => U256::ZERO,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_encode_settled() {
		let report = WorkflowReport::settled(Decimal::new(500, 0));
		let expected = U256::from(500u64) * U256::from(10u64).pow(U256::from(18u64));
		assert_eq!(report.encode(), expected);
		assert_eq!(report.state, WorkflowState::Done);
	}

	#[test]
	fn test_encode_failure_is_zero() {
		let report = WorkflowReport::failed(
			WorkflowState::SellFailed,
			WorkflowError::RequestFailed {
				stage: WorkflowStage::Sell,
				failure: RequestFailure::Status(422),
			},
		);
		assert_eq!(report.encode(), U256::ZERO);
		assert_eq!(report.error().map(WorkflowError::stage), Some(WorkflowStage::Sell));
	}

	#[test]
	fn test_terminal_states() {
		assert!(WorkflowState::BuyFailed.is_terminal());
		assert!(WorkflowState::Done.is_terminal());
		assert!(!WorkflowState::TransferPending.is_terminal());
	}
}
