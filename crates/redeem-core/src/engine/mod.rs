//! Redemption workflow engine.
//!
//! Runs the three stages strictly in order: sell the position, buy the
//! stablecoin, then transfer it out. Each stage must reach its success
//! verdict before the next one starts. Any failure ends the invocation with
//! a [`WorkflowReport`] whose encoding is the zero sentinel.

use crate::handlers::{OrderHandler, TransferHandler};
use crate::monitoring::{OrderFillMonitor, PollPolicy, TransferMonitor};
use crate::state::WorkflowStateMachine;
use redeem_broker::{BrokerClient, BrokerError, Credentials, HttpTransport};
use redeem_config::{Config, WorkflowConfig};
use redeem_types::{
	parse_quantity, truncate_id, AccountSnapshot, FillResult, OrderOutcome, OrderRequest,
	OrderSide, TransferOutcome, WorkflowError, WorkflowReport, WorkflowStage, WorkflowState,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;

/// Validated inputs of one invocation.
struct WorkflowPlan {
	sell: OrderRequest,
	buy: OrderRequest,
	transfer_amount: Decimal,
}

/// Sequences the sell, buy and transfer stages against one brokerage account.
///
/// Holds no per-invocation state, so one engine can serve concurrent runs.
pub struct RedemptionEngine {
	workflow: WorkflowConfig,
	broker: BrokerClient,
	orders: OrderHandler,
	transfers: TransferHandler,
	order_monitor: OrderFillMonitor,
	transfer_monitor: TransferMonitor,
}

impl RedemptionEngine {
	pub fn new(config: &Config, transport: Arc<dyn HttpTransport>) -> Self {
		let credentials = Credentials::new(
			config.broker.key_id.clone(),
			config.broker.secret_key.clone(),
		);
		let broker = BrokerClient::new(config.broker.base_url.clone(), credentials, transport);
		let workflow = config.workflow.clone();

		Self {
			orders: OrderHandler::new(broker.clone()),
			transfers: TransferHandler::new(
				broker.clone(),
				workflow.destination_address.clone(),
				workflow.transfer_asset.clone(),
			),
			order_monitor: OrderFillMonitor::new(
				broker.clone(),
				PollPolicy::from(&workflow.order_fill),
			),
			transfer_monitor: TransferMonitor::new(
				broker.clone(),
				PollPolicy::from(&workflow.transfer),
			),
			broker,
			workflow,
		}
	}

	pub fn broker(&self) -> &BrokerClient {
		&self.broker
	}

	pub fn workflow_config(&self) -> &WorkflowConfig {
		&self.workflow
	}

	/// Runs one redemption: sell `sell_qty` of the configured position, buy
	/// `stable_qty` of the stablecoin and transfer that amount out.
	///
	/// Never returns an error or panics; failures are carried in the report.
	#[instrument(skip_all, fields(sell_qty = %sell_qty, stable_qty = %stable_qty))]
	pub async fn run(&self, sell_qty: &str, stable_qty: &str) -> WorkflowReport {
		let mut machine = WorkflowStateMachine::new();

		match self.execute(&mut machine, sell_qty, stable_qty).await {
			Ok(amount) => {
				tracing::info!(amount = %amount, "Redemption settled");
				WorkflowReport::settled(amount)
			},
			Err(error) => {
				if let Err(e) = machine.abort() {
					tracing::error!(error = %e, "Failed to record workflow failure");
				}
				tracing::error!(
					stage = %error.stage(),
					state = ?machine.state(),
					error = %error,
					"Redemption failed"
				);
				WorkflowReport::failed(machine.state(), error)
			},
		}
	}

	/// Reads the account's portfolio value.
	#[instrument(skip_all)]
	pub async fn balance(&self) -> Result<AccountSnapshot, BrokerError> {
		if !self.broker.credentials().is_complete() {
			tracing::error!("Brokerage credentials are not configured");
			return Err(BrokerError::MissingCredentials);
		}

		let account = self.broker.get_account().await?;
		tracing::info!(portfolio_value = %account.portfolio_value, "Fetched account");
		Ok(account)
	}

	async fn execute(
		&self,
		machine: &mut WorkflowStateMachine,
		sell_qty: &str,
		stable_qty: &str,
	) -> Result<Decimal, WorkflowError> {
		let plan = self.preflight(sell_qty, stable_qty)?;

		advance(machine, WorkflowState::SellPending)?;
		self.fill_order(WorkflowStage::Sell, &plan.sell).await?;
		advance(machine, WorkflowState::SellFilled)?;

		advance(machine, WorkflowState::BuyPending)?;
		self.fill_order(WorkflowStage::Buy, &plan.buy).await?;
		advance(machine, WorkflowState::BuyFilled)?;

		advance(machine, WorkflowState::TransferPending)?;
		self.transfer(plan.transfer_amount).await?;
		advance(machine, WorkflowState::TransferFilled)?;

		advance(machine, WorkflowState::Done)?;
		Ok(plan.transfer_amount)
	}

	/// Checks credentials and inputs before any request is sent.
	fn preflight(&self, sell_qty: &str, stable_qty: &str) -> Result<WorkflowPlan, WorkflowError> {
		if !self.broker.credentials().is_complete() {
			tracing::error!("Brokerage credentials are not configured");
			return Err(WorkflowError::MissingCredentials);
		}

		let sell_qty = parse_quantity(sell_qty)
			.map_err(|e| WorkflowError::InvalidInput(format!("sell quantity: {}", e)))?;
		let stable_qty = parse_quantity(stable_qty)
			.map_err(|e| WorkflowError::InvalidInput(format!("stable quantity: {}", e)))?;

		let sell = OrderRequest::market(self.workflow.sell_symbol.clone(), sell_qty, OrderSide::Sell)
			.map_err(|e| WorkflowError::InvalidInput(e.to_string()))?;
		let buy = OrderRequest::market(self.workflow.stable_symbol.clone(), stable_qty, OrderSide::Buy)
			.map_err(|e| WorkflowError::InvalidInput(e.to_string()))?;

		Ok(WorkflowPlan {
			sell,
			buy,
			transfer_amount: stable_qty,
		})
	}

	/// Places one order and waits for it to fill, cancelling it if the wait
	/// runs out.
	#[instrument(skip_all, fields(stage = %stage))]
	async fn fill_order(&self, stage: WorkflowStage, order: &OrderRequest) -> Result<(), WorkflowError> {
		let handle = match self.orders.place_order(order).await {
			OrderOutcome::Accepted(handle) => handle,
			OrderOutcome::Rejected { status } => {
				return Err(WorkflowError::Rejected { stage, status });
			},
			OrderOutcome::RequestFailed(failure) => {
				return Err(WorkflowError::RequestFailed { stage, failure });
			},
		};
		let order_id = handle.client_order_id;

		match self.order_monitor.await_fill(&order_id).await {
			FillResult::Filled => Ok(()),
			FillResult::NotFilled => {
				if let Err(failure) = self.orders.cancel_order(&order_id).await {
					tracing::warn!(error = %failure, "Cancellation not confirmed");
				}
				tracing::warn!(order_id = %truncate_id(&order_id), "Order not filled in time");
				Err(WorkflowError::FillTimeout { stage, order_id })
			},
			FillResult::Failed(failure) => Err(WorkflowError::RequestFailed { stage, failure }),
		}
	}

	#[instrument(skip_all, fields(stage = %WorkflowStage::Transfer))]
	async fn transfer(&self, amount: Decimal) -> Result<(), WorkflowError> {
		let stage = WorkflowStage::Transfer;
		let transfer_id = match self.transfers.initiate_transfer(amount).await {
			TransferOutcome::Accepted(handle) => handle.transfer_id,
			TransferOutcome::Rejected => {
				return Err(WorkflowError::TransferInitiationFailed(
					"response carried no transfer id".to_string(),
				));
			},
			TransferOutcome::RequestFailed(failure) => {
				return Err(WorkflowError::RequestFailed { stage, failure });
			},
		};

		match self.transfer_monitor.await_transfer(&transfer_id).await {
			FillResult::Filled => Ok(()),
			FillResult::NotFilled => Err(WorkflowError::TransferTimeout { transfer_id }),
			FillResult::Failed(failure) => Err(WorkflowError::RequestFailed { stage, failure }),
		}
	}
}

fn advance(machine: &mut WorkflowStateMachine, next: WorkflowState) -> Result<(), WorkflowError> {
	machine
		.transition(next)
		.map(|_| ())
		.map_err(|e| WorkflowError::Internal(e.to_string()))
}
