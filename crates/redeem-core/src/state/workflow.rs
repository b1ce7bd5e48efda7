//! Workflow state machine.
//!
//! Tracks one invocation through
//! Created -> SellPending -> SellFilled -> BuyPending -> BuyFilled ->
//! TransferPending -> TransferFilled -> Done, rejecting any move the
//! transition table does not allow.

use once_cell::sync::Lazy;
use redeem_types::WorkflowState;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
	#[error("Invalid state transition from {from:?} to {to:?}")]
	InvalidTransition {
		from: WorkflowState,
		to: WorkflowState,
	},
}

/// State of a single workflow invocation and the path it took.
#[derive(Debug, Clone)]
pub struct WorkflowStateMachine {
	state: WorkflowState,
	history: Vec<WorkflowState>,
}

impl Default for WorkflowStateMachine {
	fn default() -> Self {
		Self::new()
	}
}

impl WorkflowStateMachine {
	pub fn new() -> Self {
		Self {
			state: WorkflowState::Created,
			history: vec![WorkflowState::Created],
		}
	}

	pub fn state(&self) -> WorkflowState {
		self.state
	}

	/// Every state visited so far, oldest first.
	pub fn history(&self) -> &[WorkflowState] {
		&self.history
	}

	/// Moves to `next` if the transition table allows it.
	pub fn transition(&mut self, next: WorkflowState) -> Result<WorkflowState, StateError> {
		if !Self::is_valid_transition(self.state, next) {
			return Err(StateError::InvalidTransition {
				from: self.state,
				to: next,
			});
		}
		tracing::debug!(from = ?self.state, to = ?next, "Workflow transition");
		self.state = next;
		self.history.push(next);
		Ok(next)
	}

	/// Moves to the failure state of the step currently in progress.
	pub fn abort(&mut self) -> Result<WorkflowState, StateError> {
		let failed = match self.state {
			WorkflowState::Created => WorkflowState::PreflightFailed,
			WorkflowState::SellPending | WorkflowState::SellFilled => WorkflowState::SellFailed,
			WorkflowState::BuyPending | WorkflowState::BuyFilled => WorkflowState::BuyFailed,
			WorkflowState::TransferPending | WorkflowState::TransferFilled => {
				WorkflowState::TransferFailed
			},
			terminal => {
				return Err(StateError::InvalidTransition {
					from: terminal,
					to: terminal,
				})
			},
		};
		self.transition(failed)
	}

	fn is_valid_transition(from: WorkflowState, to: WorkflowState) -> bool {
		use WorkflowState::*;

		// Each state maps to the states it may move to.
		static TRANSITIONS: Lazy<HashMap<WorkflowState, HashSet<WorkflowState>>> = Lazy::new(|| {
			let mut m = HashMap::new();
			m.insert(Created, HashSet::from([SellPending, PreflightFailed]));
			m.insert(SellPending, HashSet::from([SellFilled, SellFailed]));
			m.insert(SellFilled, HashSet::from([BuyPending, SellFailed]));
			m.insert(BuyPending, HashSet::from([BuyFilled, BuyFailed]));
			m.insert(BuyFilled, HashSet::from([TransferPending, BuyFailed]));
			m.insert(TransferPending, HashSet::from([TransferFilled, TransferFailed]));
			m.insert(TransferFilled, HashSet::from([Done, TransferFailed]));
			for terminal in [PreflightFailed, SellFailed, BuyFailed, TransferFailed, Done] {
				m.insert(terminal, HashSet::new());
			}
			m
		});

		TRANSITIONS
			.get(&from)
			.is_some_and(|allowed| allowed.contains(&to))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use redeem_types::WorkflowState::*;

	#[test]
	fn test_happy_path() {
		let mut machine = WorkflowStateMachine::new();
		for next in [
			SellPending,
			SellFilled,
			BuyPending,
			BuyFilled,
			TransferPending,
			TransferFilled,
			Done,
		] {
			machine.transition(next).unwrap();
		}
		assert_eq!(machine.state(), Done);
		assert_eq!(machine.history().len(), 8);
		assert!(machine.state().is_terminal());
	}

	#[test]
	fn test_no_skipping_or_going_back() {
		let mut machine = WorkflowStateMachine::new();
		assert_eq!(
			machine.transition(BuyPending),
			Err(StateError::InvalidTransition {
				from: Created,
				to: BuyPending
			})
		);

		machine.transition(SellPending).unwrap();
		machine.transition(SellFilled).unwrap();
		assert!(machine.transition(SellPending).is_err());
		assert!(machine.transition(TransferPending).is_err());
		assert_eq!(machine.state(), SellFilled);
	}

	#[test]
	fn test_abort_maps_to_current_step() {
		let mut machine = WorkflowStateMachine::new();
		assert_eq!(machine.abort(), Ok(PreflightFailed));

		let mut machine = WorkflowStateMachine::new();
		machine.transition(SellPending).unwrap();
		machine.transition(SellFilled).unwrap();
		machine.transition(BuyPending).unwrap();
		assert_eq!(machine.abort(), Ok(BuyFailed));
	}

	#[test]
	fn test_terminal_states_are_final() {
		let mut machine = WorkflowStateMachine::new();
		machine.abort().unwrap();
		assert!(machine.abort().is_err());
		assert!(machine.transition(SellPending).is_err());
	}
}
