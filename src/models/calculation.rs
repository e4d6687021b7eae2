//! Calculation engine exchange types.
//!
//! The payroll calculation algorithm itself is an opaque external engine;
//! these types describe only what crosses the wire: the options sent with
//! an invocation, the outcome of a (long-running) invocation, and the
//! progress snapshots reported while a task is executing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::RunTotals;

/// Options accompanying a calculation engine invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculationOptions {
    /// Recalculate even if the run already carries calculated totals.
    #[serde(default)]
    pub force_recalculate: bool,
    /// Restrict the calculation to the given employee ids, if non-empty.
    #[serde(default)]
    pub employee_ids: Vec<String>,
}

/// Per-employee error reported by the calculation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCalculationError {
    /// The employee the error applies to.
    pub employee_id: String,
    /// The engine's error message for this employee.
    pub message: String,
}

/// Result of a calculation engine invocation.
///
/// The invocation is long-running; a client that observes a timeout can
/// still follow up on `task_id` through the progress endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationOutcome {
    /// Identifier of the calculation task, for progress polling.
    pub task_id: Uuid,
    /// Totals produced by the engine, absent if the task failed early.
    pub totals: Option<RunTotals>,
    /// Per-employee errors encountered during calculation.
    #[serde(default)]
    pub employee_errors: Vec<EmployeeCalculationError>,
}

/// Lifecycle status of a calculation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationStatus {
    /// Task accepted but not yet running.
    Queued,
    /// Task is executing.
    Running,
    /// Task finished successfully.
    Completed,
    /// Task finished with a failure.
    Failed,
}

impl CalculationStatus {
    /// Whether this status is terminal (no further progress will follow).
    pub fn is_terminal(&self) -> bool {
        matches!(self, CalculationStatus::Completed | CalculationStatus::Failed)
    }
}

/// A progress snapshot for an in-flight calculation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationProgress {
    /// The task this snapshot describes.
    pub task_id: Uuid,
    /// Current lifecycle status of the task.
    pub status: CalculationStatus,
    /// Completion percentage in `0..=100`.
    pub percent_complete: u8,
    /// Optional human-readable progress or failure message.
    #[serde(default)]
    pub message: Option<String>,
}
