//! Workflow state machine for the payroll run life-cycle.
//!
//! This module contains the stage derivation from persisted run status,
//! the audit gate that conditions forward progress, the per-stage action
//! registry with pure enablement predicates, the async action runner with
//! timeout protection, and the engine that orchestrates them into a
//! single queryable state machine.

mod actions;
mod engine;
mod gate;
mod runner;
mod stage;

pub use actions::{
    ActionDescriptor, ActionKey, WorkflowContext, actions_for, describe_actions, is_enabled,
    stage_owns,
};
pub use engine::{ActionInput, RefreshScope, TransitionOutcome, WorkflowEngine};
pub use gate::{GateDecision, can_advance};
pub use runner::AsyncActionRunner;
pub use stage::{WorkflowStage, predecessor_status, stage_of};
