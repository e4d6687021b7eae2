//! Configuration module for the workflow engine.
//!
//! This module provides configuration loading and the strongly-typed
//! configuration structures used by the engine.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{ActionTimeouts, ProgressPolling, WorkflowConfig};
