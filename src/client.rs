//! Backend client seam.
//!
//! The engine produces and consumes no network protocol itself; it depends
//! on a backend exposing the operations below. The trait is the contract
//! the workflow logic is written and tested against; the concrete REST
//! client lives outside this crate.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::WorkflowResult;
use crate::models::{
    AuditSummary, CalculationOptions, CalculationOutcome, CalculationProgress, PayrollPeriod,
    PayrollRun, RunStatus,
};

/// Operations the payroll backend exposes to the workflow engine.
///
/// Status mutations are atomic server-side: a failed call leaves the run
/// status unchanged. None of these operations carries a cancellation
/// token; once dispatched, an operation runs to completion regardless of
/// what the client observes.
#[async_trait]
pub trait PayrollBackend: Send + Sync {
    /// Lists all pay periods, in the backend's display order.
    async fn list_periods(&self) -> WorkflowResult<Vec<PayrollPeriod>>;

    /// Lists the runs (versions) of one period.
    async fn list_runs(&self, period_id: Uuid) -> WorkflowResult<Vec<PayrollRun>>;

    /// Fetches the latest audit summary for a run, or `None` if no audit
    /// has run yet.
    async fn audit_summary(&self, run_id: Uuid) -> WorkflowResult<Option<AuditSummary>>;

    /// Executes an audit over the run and returns the superseding
    /// summary. `advanced` selects the extended rule set.
    async fn run_audit(&self, run_id: Uuid, advanced: bool) -> WorkflowResult<AuditSummary>;

    /// Transitions the run to the target status and returns the updated
    /// run.
    async fn update_status(&self, run_id: Uuid, target: RunStatus) -> WorkflowResult<PayrollRun>;

    /// Invokes the external calculation engine. Long-running.
    async fn run_calculation(
        &self,
        run_id: Uuid,
        options: CalculationOptions,
    ) -> WorkflowResult<CalculationOutcome>;

    /// Fetches a progress snapshot for an in-flight calculation task.
    async fn calculation_progress(&self, task_id: Uuid) -> WorkflowResult<CalculationProgress>;

    /// Marks the given anomalies as ignored and returns the superseding
    /// audit summary. Idempotent: re-ignoring an already-ignored anomaly
    /// does not change the aggregate.
    async fn ignore_anomalies(
        &self,
        run_id: Uuid,
        anomaly_ids: &[Uuid],
        reason: &str,
    ) -> WorkflowResult<AuditSummary>;

    /// Creates a new draft run in the period by copying the previous
    /// period's run.
    async fn copy_previous_run(&self, period_id: Uuid) -> WorkflowResult<PayrollRun>;

    /// Creates or extends a draft run from a bulk import payload. The
    /// payload shape is owned by the import subsystem and opaque here.
    async fn import_entries(
        &self,
        period_id: Uuid,
        payload: serde_json::Value,
    ) -> WorkflowResult<PayrollRun>;

    /// Creates an empty draft run for the period if it has none.
    /// Idempotent: repeated calls return the existing run.
    async fn create_run_if_absent(&self, period_id: Uuid) -> WorkflowResult<PayrollRun>;

    /// Generates payroll reports for the run.
    async fn generate_reports(&self, run_id: Uuid) -> WorkflowResult<()>;

    /// Generates the bank payment file for the run.
    async fn generate_bank_file(&self, run_id: Uuid) -> WorkflowResult<()>;

    /// Archives the completed run's data.
    async fn archive_run(&self, run_id: Uuid) -> WorkflowResult<()>;
}
