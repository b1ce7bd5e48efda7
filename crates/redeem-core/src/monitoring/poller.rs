//! Bounded status polling.
//!
//! Both order fills and wallet transfers are confirmed the same way: ask the
//! brokerage for the current status, compare it to a terminal literal, wait
//! and retry. [`poll_until_terminal`] is that loop, parameterised by a
//! [`PollPolicy`] and a status check closure.

use redeem_config::PollConfig;
use redeem_types::{FillResult, RequestFailure, StatusSnapshot};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// How often, how many times and for how long to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
	pub interval: Duration,
	pub max_attempts: u32,
	/// Wall-clock budget for the whole wait, checked before each attempt.
	pub deadline: Option<Duration>,
	/// Exact status literal that ends the wait successfully.
	pub terminal_status: String,
}

impl PollPolicy {
	pub fn new(interval: Duration, max_attempts: u32, terminal_status: impl Into<String>) -> Self {
		Self {
			interval,
			max_attempts,
			deadline: None,
			terminal_status: terminal_status.into(),
		}
	}

	pub fn with_deadline(mut self, deadline: Duration) -> Self {
		self.deadline = Some(deadline);
		self
	}
}

impl From<&PollConfig> for PollPolicy {
	fn from(config: &PollConfig) -> Self {
		Self {
			interval: config.interval(),
			max_attempts: config.max_attempts,
			deadline: config.deadline(),
			terminal_status: config.terminal_status.clone(),
		}
	}
}

/// Polls `check` until it reports the terminal status.
///
/// Makes at most `max_attempts` checks, sleeping `interval` between
/// consecutive checks and never after the last one. The first check failure
/// ends the wait with [`FillResult::Failed`]. Running out of attempts, or
/// crossing the deadline before an attempt, yields [`FillResult::NotFilled`].
pub async fn poll_until_terminal<F, Fut>(policy: &PollPolicy, mut check: F) -> FillResult
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<StatusSnapshot, RequestFailure>>,
{
	let started = Instant::now();

	for attempt in 1..=policy.max_attempts {
		if let Some(deadline) = policy.deadline {
			if started.elapsed() >= deadline {
				tracing::warn!(
					attempt,
					elapsed_secs = started.elapsed().as_secs(),
					"Polling deadline reached"
				);
				return FillResult::NotFilled;
			}
		}

		match check().await {
			Ok(snapshot) if snapshot.is_terminal(&policy.terminal_status) => {
				tracing::debug!(attempt, status = %snapshot.status, "Terminal status reached");
				return FillResult::Filled;
			},
			Ok(snapshot) => {
				tracing::debug!(
					attempt,
					max_attempts = policy.max_attempts,
					status = %snapshot.status,
					"Not terminal yet"
				);
			},
			Err(failure) => {
				tracing::warn!(attempt, error = %failure, "Status request failed");
				return FillResult::Failed(failure);
			},
		}

		if attempt < policy.max_attempts {
			tokio::time::sleep(policy.interval).await;
		}
	}

	tracing::warn!(
		attempts = policy.max_attempts,
		"Attempts exhausted without terminal status"
	);
	FillResult::NotFilled
}
