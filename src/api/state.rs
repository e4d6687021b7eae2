//! Application state for the workflow console API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::workflow::WorkflowEngine;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers:
/// the workflow engine, which owns the backend seam and the per-action
/// loading flags for this session.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<WorkflowEngine>,
}

impl AppState {
    /// Creates a new application state owning the given engine.
    pub fn new(engine: WorkflowEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Returns a reference to the workflow engine.
    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }
}
