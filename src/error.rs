//! Error types for the payroll workflow engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while evaluating or driving the
//! payroll run workflow.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for the payroll workflow engine.
///
/// All operations in the engine return this error type. Every error is
/// terminal for the single action invocation that raised it: the engine
/// never retries automatically, and internal state is always re-derived
/// from the backend rather than rolled back.
///
/// # Example
///
/// ```
/// use payroll_workflow::error::WorkflowError;
///
/// let error = WorkflowError::Validation {
///     reason: "submit blocked by 2 outstanding audit errors".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Transition not allowed: submit blocked by 2 outstanding audit errors"
/// );
/// ```
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A requested transition is not currently allowed.
    #[error("Transition not allowed: {reason}")]
    Validation {
        /// Why the transition was refused, including concrete counts
        /// where an audit gate is involved.
        reason: String,
    },

    /// Enablement re-validation failed at dispatch time even though the
    /// action was presented as enabled. Surfaced to callers the same way
    /// as a validation failure.
    #[error("Action '{action}' is stale: {reason}")]
    StaleState {
        /// The action key that was requested.
        action: String,
        /// Why the action is no longer valid.
        reason: String,
    },

    /// An action exceeded its allotted time. The dispatched operation may
    /// still be completing server-side; the next refetch is the source of
    /// truth.
    #[error("Action '{action}' timed out after {timeout_ms}ms (the operation may still be completing)")]
    Timeout {
        /// The action key that timed out.
        action: String,
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The backend returned an error response.
    #[error("Backend error {code}: {message}")]
    Remote {
        /// The backend's error code.
        code: String,
        /// The backend's error message, propagated verbatim.
        message: String,
    },

    /// An action key was requested that no stage of the workflow owns.
    #[error("Unknown workflow action: {key}")]
    UnknownAction {
        /// The unrecognized action key.
        key: String,
    },

    /// The calculation engine reported a failed task.
    #[error("Calculation task {task_id} failed: {message}")]
    CalculationFailed {
        /// The calculation task identifier.
        task_id: Uuid,
        /// The failure message reported by the progress endpoint.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParse {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// An internal invariant failed, e.g. a dispatched task panicked.
    #[error("Internal workflow error: {message}")]
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

/// A type alias for Results that return WorkflowError.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
