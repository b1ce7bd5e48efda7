//! End-to-end workflow scenarios against a scripted brokerage.

use alloy_primitives::U256;
use redeem_broker::{MockHttpTransport, TransportError};
use redeem_config::Config;
use redeem_core::RedemptionEngine;
use redeem_types::{
	HttpMethod, HttpRequest, HttpResponse, RequestFailure, WorkflowError, WorkflowStage,
	WorkflowState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const BASE_URL: &str = "https://broker.test/v2";

#[derive(Debug, Clone)]
struct Call {
	method: HttpMethod,
	path: String,
	body: Option<Value>,
	at: Instant,
}

#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
	fn calls(&self) -> Vec<Call> {
		self.0.lock().unwrap().clone()
	}

	fn count(&self, method: HttpMethod, prefix: &str) -> usize {
		self.calls()
			.iter()
			.filter(|c| c.method == method && c.path.starts_with(prefix))
			.count()
	}

	fn times(&self, method: HttpMethod, prefix: &str) -> Vec<Instant> {
		self.calls()
			.into_iter()
			.filter(|c| c.method == method && c.path.starts_with(prefix))
			.map(|c| c.at)
			.collect()
	}
}

/// Scripted brokerage behaviour, one answer per endpoint.
#[derive(Clone)]
struct Script {
	sell_placement: (u16, Value),
	buy_placement: (u16, Value),
	sell_status: (u16, Value),
	buy_status: (u16, Value),
	/// `None` makes the cancel request fail at the transport.
	cancel_status: Option<u16>,
	transfer_creation: (u16, Value),
	transfer_status: (u16, Value),
}

impl Default for Script {
	fn default() -> Self {
		Self {
			sell_placement: (200, json!({ "client_order_id": "sell-1", "status": "accepted" })),
			buy_placement: (200, json!({ "client_order_id": "buy-1", "status": "accepted" })),
			sell_status: (200, json!({ "status": "filled" })),
			buy_status: (200, json!({ "status": "filled" })),
			cancel_status: Some(204),
			transfer_creation: (200, json!({ "ids": ["tr-1"] })),
			transfer_status: (200, json!({ "status": "filled" })),
		}
	}
}

impl Script {
	fn answer(&self, request: &HttpRequest, path: &str) -> Result<HttpResponse, TransportError> {
		let (status, body) = match (request.method, path) {
			(HttpMethod::Post, "/orders") => {
				let side = request.body.as_ref().and_then(|b| b.get("side")).cloned();
				if side == Some(json!("sell")) {
					self.sell_placement.clone()
				} else {
					self.buy_placement.clone()
				}
			},
			(HttpMethod::Get, "/orders/sell-1") => self.sell_status.clone(),
			(HttpMethod::Get, "/orders/buy-1") => self.buy_status.clone(),
			(HttpMethod::Delete, p) if p.starts_with("/orders/") => match self.cancel_status {
				Some(status) => (status, Value::Null),
				None => return Err(TransportError::Network("connection reset".into())),
			},
			(HttpMethod::Post, "/wallets/transfers") => self.transfer_creation.clone(),
			(HttpMethod::Get, p) if p.starts_with("/wallets/transfers/") => {
				self.transfer_status.clone()
			},
			_ => (404, json!({ "message": "not found" })),
		};
		Ok(HttpResponse::new(status, body))
	}
}

fn engine_with(config: Config, script: Script) -> (RedemptionEngine, CallLog) {
	let log = CallLog::default();
	let recorder = log.clone();

	let mut transport = MockHttpTransport::new();
	transport.expect_execute().returning(move |request| {
		let path = request
			.url
			.strip_prefix(BASE_URL)
			.unwrap_or(&request.url)
			.to_string();
		let response = script.answer(&request, &path);
		recorder.0.lock().unwrap().push(Call {
			method: request.method,
			path,
			body: request.body.clone(),
			at: Instant::now(),
		});
		response
	});

	(RedemptionEngine::new(&config, Arc::new(transport)), log)
}

fn engine(script: Script) -> (RedemptionEngine, CallLog) {
	engine_with(Config::for_testing(BASE_URL), script)
}

fn wei(units: u64) -> U256 {
	U256::from(units) * U256::from(10u64).pow(U256::from(18u64))
}

#[tokio::test(start_paused = true)]
async fn scenario_a_everything_fills_first_poll() {
	let (engine, log) = engine(Script::default());

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::Done);
	assert_eq!(report.settled_amount(), Some(Decimal::new(500, 0)));
	assert_eq!(report.encode(), wei(500));

	let calls = log.calls();
	let sequence: Vec<_> = calls.iter().map(|c| (c.method, c.path.as_str())).collect();
	assert_eq!(
		sequence,
		vec![
			(HttpMethod::Post, "/orders"),
			(HttpMethod::Get, "/orders/sell-1"),
			(HttpMethod::Post, "/orders"),
			(HttpMethod::Get, "/orders/buy-1"),
			(HttpMethod::Post, "/wallets/transfers"),
			(HttpMethod::Get, "/wallets/transfers/tr-1"),
		]
	);

	assert_eq!(
		calls[0].body,
		Some(json!({
			"symbol": "NVDA",
			"qty": "1",
			"side": "sell",
			"type": "market",
			"time_in_force": "gtc",
		}))
	);
	assert_eq!(
		calls[2].body,
		Some(json!({
			"symbol": "USDCUSD",
			"qty": "500",
			"side": "buy",
			"type": "market",
			"time_in_force": "gtc",
		}))
	);
	assert_eq!(
		calls[4].body,
		Some(json!({
			"amount": "500",
			"address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
			"asset": "USDCUSD",
		}))
	);
}

#[tokio::test(start_paused = true)]
async fn scenario_b_sell_rejected_with_422() {
	let (engine, log) = engine(Script {
		sell_placement: (422, json!({ "message": "insufficient qty" })),
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::SellFailed);
	assert_eq!(
		report.error(),
		Some(&WorkflowError::RequestFailed {
			stage: WorkflowStage::Sell,
			failure: RequestFailure::Status(422),
		})
	);
	assert_eq!(report.encode(), U256::ZERO);
	assert_eq!(log.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn scenario_c_sell_never_fills() {
	let (engine, log) = engine(Script {
		sell_status: (200, json!({ "status": "new" })),
		..Script::default()
	});
	let started = Instant::now();

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::SellFailed);
	assert_eq!(
		report.error(),
		Some(&WorkflowError::FillTimeout {
			stage: WorkflowStage::Sell,
			order_id: "sell-1".into(),
		})
	);
	assert_eq!(report.encode(), U256::ZERO);

	let polls = log.times(HttpMethod::Get, "/orders/sell-1");
	assert_eq!(polls.len(), 30);
	for pair in polls.windows(2) {
		assert_eq!(pair[1] - pair[0], Duration::from_secs(5));
	}
	assert_eq!(log.count(HttpMethod::Delete, "/orders/sell-1"), 1);
	assert_eq!(log.count(HttpMethod::Post, "/orders"), 1);
	assert_eq!(log.count(HttpMethod::Post, "/wallets/transfers"), 0);
	// No sleep after the last poll.
	assert_eq!(started.elapsed(), Duration::from_secs(5 * 29));
}

#[tokio::test(start_paused = true)]
async fn buy_never_fills_cancels_only_the_buy() {
	let (engine, log) = engine(Script {
		buy_status: (200, json!({ "status": "new" })),
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::BuyFailed);
	assert_eq!(
		report.error(),
		Some(&WorkflowError::FillTimeout {
			stage: WorkflowStage::Buy,
			order_id: "buy-1".into(),
		})
	);
	assert_eq!(report.encode(), U256::ZERO);

	let polls = log.times(HttpMethod::Get, "/orders/buy-1");
	assert_eq!(polls.len(), 30);
	for pair in polls.windows(2) {
		assert_eq!(pair[1] - pair[0], Duration::from_secs(5));
	}
	assert_eq!(log.count(HttpMethod::Get, "/orders/sell-1"), 1);
	assert_eq!(log.count(HttpMethod::Delete, "/orders/buy-1"), 1);
	assert_eq!(log.count(HttpMethod::Delete, "/orders/sell-1"), 0);
	assert_eq!(log.count(HttpMethod::Post, "/wallets/transfers"), 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_d_transfer_without_ids() {
	let (engine, log) = engine(Script {
		transfer_creation: (200, json!({ "ids": [] })),
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::TransferFailed);
	assert!(matches!(
		report.error(),
		Some(WorkflowError::TransferInitiationFailed(_))
	));
	assert_eq!(report.encode(), U256::ZERO);
	assert_eq!(log.count(HttpMethod::Get, "/wallets/transfers/"), 0);
	assert_eq!(log.count(HttpMethod::Delete, "/orders/"), 0);
}

#[tokio::test(start_paused = true)]
async fn transfer_never_completes_after_120_polls() {
	let (engine, log) = engine(Script {
		transfer_status: (200, json!({ "status": "pending" })),
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::TransferFailed);
	assert_eq!(
		report.error(),
		Some(&WorkflowError::TransferTimeout {
			transfer_id: "tr-1".into()
		})
	);
	assert_eq!(report.encode(), U256::ZERO);

	let polls = log.times(HttpMethod::Get, "/wallets/transfers/tr-1");
	assert_eq!(polls.len(), 120);
	for pair in polls.windows(2) {
		assert_eq!(pair[1] - pair[0], Duration::from_secs(5));
	}
	assert_eq!(log.count(HttpMethod::Delete, "/orders/"), 0);
}

#[tokio::test(start_paused = true)]
async fn near_miss_placement_status_rejects_buy_without_cancel() {
	for status in ["Accepted", "accepted ", "pending", "accpeted"] {
		let (engine, log) = engine(Script {
			buy_placement: (200, json!({ "client_order_id": "buy-1", "status": status })),
			..Script::default()
		});

		let report = engine.run("1", "500").await;

		assert_eq!(report.state, WorkflowState::BuyFailed);
		assert_eq!(
			report.error(),
			Some(&WorkflowError::Rejected {
				stage: WorkflowStage::Buy,
				status: status.to_string(),
			})
		);
		assert_eq!(report.encode(), U256::ZERO);
		assert_eq!(log.count(HttpMethod::Delete, "/orders/"), 0);
		assert_eq!(log.count(HttpMethod::Post, "/wallets/transfers"), 0);
	}
}

#[tokio::test(start_paused = true)]
async fn near_miss_fill_status_times_out_with_one_cancel() {
	for status in ["Filled", "filled ", "partially_filled"] {
		let (engine, log) = engine(Script {
			sell_status: (200, json!({ "status": status })),
			..Script::default()
		});

		let report = engine.run("1", "500").await;

		assert!(matches!(
			report.error(),
			Some(WorkflowError::FillTimeout {
				stage: WorkflowStage::Sell,
				..
			})
		));
		assert_eq!(log.count(HttpMethod::Delete, "/orders/sell-1"), 1);
		assert_eq!(log.count(HttpMethod::Delete, "/orders/"), 1);
	}
}

#[tokio::test(start_paused = true)]
async fn status_request_failure_fails_without_cancel() {
	let (engine, log) = engine(Script {
		sell_status: (500, json!({ "message": "internal" })),
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::SellFailed);
	assert_eq!(
		report.error(),
		Some(&WorkflowError::RequestFailed {
			stage: WorkflowStage::Sell,
			failure: RequestFailure::Status(500),
		})
	);
	assert_eq!(log.count(HttpMethod::Get, "/orders/sell-1"), 1);
	assert_eq!(log.count(HttpMethod::Delete, "/orders/"), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_failure_does_not_change_verdict() {
	let (engine, log) = engine(Script {
		sell_status: (200, json!({ "status": "new" })),
		cancel_status: Some(422),
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert!(matches!(
		report.error(),
		Some(WorkflowError::FillTimeout { .. })
	));
	assert_eq!(report.encode(), U256::ZERO);
	assert_eq!(log.count(HttpMethod::Delete, "/orders/sell-1"), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_cancel_keeps_fill_timeout() {
	let (engine, log) = engine(Script {
		sell_status: (200, json!({ "status": "new" })),
		cancel_status: None,
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert_eq!(report.state, WorkflowState::SellFailed);
	assert_eq!(
		report.error(),
		Some(&WorkflowError::FillTimeout {
			stage: WorkflowStage::Sell,
			order_id: "sell-1".into(),
		})
	);
	assert_eq!(log.count(HttpMethod::Delete, "/orders/sell-1"), 1);
	assert_eq!(log.count(HttpMethod::Post, "/orders"), 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_placement_body_is_request_failure() {
	let (engine, _log) = engine(Script {
		sell_placement: (200, json!({ "unexpected": true })),
		..Script::default()
	});

	let report = engine.run("1", "500").await;

	assert!(matches!(
		report.error(),
		Some(WorkflowError::RequestFailed {
			stage: WorkflowStage::Sell,
			failure: RequestFailure::MalformedBody(_),
		})
	));
}

#[tokio::test(start_paused = true)]
async fn configured_transfer_literal_and_deadline() {
	let mut config = Config::for_testing(BASE_URL);
	config.workflow.transfer.terminal_status = "complete".into();
	let (engine, _log) = engine_with(
		config.clone(),
		Script {
			transfer_status: (200, json!({ "status": "complete" })),
			..Script::default()
		},
	);
	assert_eq!(engine.run("2", "0.5").await.encode(), wei(1) / U256::from(2u64));

	config.workflow.order_fill.deadline_seconds = Some(12);
	let (engine, log) = engine_with(
		config,
		Script {
			sell_status: (200, json!({ "status": "new" })),
			..Script::default()
		},
	);
	let report = engine.run("2", "0.5").await;
	assert!(matches!(
		report.error(),
		Some(WorkflowError::FillTimeout { .. })
	));
	assert_eq!(log.count(HttpMethod::Get, "/orders/sell-1"), 3);
	assert_eq!(log.count(HttpMethod::Delete, "/orders/sell-1"), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_invocations_share_one_engine() {
	let (engine, log) = engine(Script::default());

	let (first, second) = tokio::join!(engine.run("1", "500"), engine.run("3", "250"));

	assert_eq!(first.encode(), wei(500));
	assert_eq!(second.encode(), wei(250));
	assert_eq!(log.calls().len(), 12);
}
