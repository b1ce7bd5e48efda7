//! Workflow state tracking.

pub mod workflow;

pub use workflow::{StateError, WorkflowStateMachine};
