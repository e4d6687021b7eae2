//! Workflow engine orchestration.
//!
//! This module ties the stage mapper, audit gate, and action registry
//! into a single queryable state machine, and drives side-effecting
//! actions through the [`AsyncActionRunner`] against the backend seam.
//!
//! The engine never mutates run state optimistically: every mutation goes
//! to the backend, and the caller refetches according to the returned
//! [`RefreshScope`]. A failed or timed-out action leaves the engine with
//! nothing to roll back, because nothing was changed locally.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::PayrollBackend;
use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{
    AuditSummary, CalculationOptions, CalculationOutcome, CalculationProgress, CalculationStatus,
    PayrollPeriod, PayrollRun, RunStatus,
};
use crate::workflow::{
    ActionDescriptor, ActionKey, AsyncActionRunner, WorkflowContext, WorkflowStage, can_advance,
    describe_actions, is_enabled, predecessor_status, stage_of, stage_owns,
};

/// What the caller should refetch after a successful action.
///
/// The selective-refresh discipline is deliberate: a coarse full refresh
/// after every action is avoided. Audit actions invalidate only the audit
/// summary, status transitions only the version, and generation actions
/// the whole page state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshScope {
    /// Nothing changed that the page caches.
    None,
    /// Refetch the audit summary for the selected run only.
    AuditOnly,
    /// Refetch the selected run (version) only.
    VersionOnly,
    /// Refetch periods, versions, and audit state.
    Everything,
}

/// The result of a successfully dispatched transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    /// The action that was dispatched.
    pub action: ActionKey,
    /// What the caller should refetch now that the action settled.
    pub refresh: RefreshScope,
    /// The updated run, for actions that return one.
    pub updated_run: Option<PayrollRun>,
    /// The superseding audit summary, for audit actions.
    pub audit: Option<AuditSummary>,
    /// The calculation outcome, for the calculation engine action.
    pub calculation: Option<CalculationOutcome>,
}

impl TransitionOutcome {
    fn new(action: ActionKey, refresh: RefreshScope) -> Self {
        Self {
            action,
            refresh,
            updated_run: None,
            audit: None,
            calculation: None,
        }
    }
}

/// Caller-supplied input for the parameterized actions.
///
/// Most actions need nothing beyond the selection context; bulk import
/// carries its (opaque) import payload and the calculation engine its
/// options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionInput {
    /// Payload for `bulk_import`, produced by the import subsystem.
    #[serde(default)]
    pub import_payload: Option<serde_json::Value>,
    /// Options for `run_calculation_engine`.
    #[serde(default)]
    pub calculation: Option<CalculationOptions>,
}

/// The payroll run workflow state machine.
///
/// States are the five workflow stages, linear, with the single explicit
/// compensating back-transition; the initial state is data preparation
/// and completion is terminal. All stage state is derived from the
/// backend's persisted run status on every query; the engine holds no
/// stage state of its own, only the per-action loading flags.
pub struct WorkflowEngine {
    backend: Arc<dyn PayrollBackend>,
    runner: AsyncActionRunner,
    config: WorkflowConfig,
}

impl WorkflowEngine {
    /// Creates an engine over the given backend and configuration.
    pub fn new(backend: Arc<dyn PayrollBackend>, config: WorkflowConfig) -> Self {
        Self {
            backend,
            runner: AsyncActionRunner::new(),
            config,
        }
    }

    /// The workflow stage of a run, derived from its persisted status.
    pub fn current_stage(&self, run: &PayrollRun) -> WorkflowStage {
        stage_of(&run.status_code)
    }

    /// The stage's actions with enablement evaluated against the context.
    pub fn available_actions(&self, context: &WorkflowContext) -> Vec<ActionDescriptor> {
        describe_actions(context.current_stage(), context)
    }

    /// Why forward progress is blocked, if it is.
    ///
    /// Non-`None` exactly when the current stage is the audit check and
    /// the gate disallows advancing. The message carries the effective
    /// error count and, when applicable, the ignored count.
    pub fn blocking_reason(&self, context: &WorkflowContext) -> Option<String> {
        can_advance(context.current_stage(), context.audit.as_ref()).reason
    }

    /// Whether the given action is currently in flight.
    pub fn is_loading(&self, key: ActionKey) -> bool {
        self.runner.is_loading(key)
    }

    /// The actions currently in flight.
    pub fn loading_actions(&self) -> Vec<ActionKey> {
        self.runner.loading_actions()
    }

    /// Dispatches a workflow action.
    ///
    /// Enablement is re-validated here, at dispatch time, not just at
    /// render time: a stage that moved or a gate that closed since the
    /// UI last evaluated surfaces as an error instead of a misdirected
    /// backend call. On success the caller must refetch according to
    /// [`TransitionOutcome::refresh`]; the refetch is sequenced strictly
    /// after the action settles, never speculatively before.
    ///
    /// # Arguments
    ///
    /// * `context` - The current selection and audit snapshot
    /// * `key` - The action to dispatch
    /// * `input` - Payloads for the parameterized actions
    ///
    /// # Errors
    ///
    /// [`WorkflowError::Validation`] when the action is not allowed in
    /// the current state, [`WorkflowError::StaleState`] when the stage no
    /// longer owns the action, [`WorkflowError::Timeout`] when the
    /// action's budget elapses, and [`WorkflowError::Remote`] for backend
    /// failures.
    pub async fn request_transition(
        &self,
        context: &WorkflowContext,
        key: ActionKey,
        input: ActionInput,
    ) -> WorkflowResult<TransitionOutcome> {
        let stage = context.current_stage();

        if !stage_owns(stage, key) {
            return Err(WorkflowError::StaleState {
                action: key.as_str().to_string(),
                reason: format!("current stage {:?} does not own this action", stage),
            });
        }

        if !is_enabled(key, context) {
            // The audit gate gets a concrete blocking message; everything
            // else failing enablement here is a missing selection.
            if key == ActionKey::SubmitForReview {
                let gate = can_advance(stage, context.audit.as_ref());
                if let Some(reason) = gate.reason {
                    return Err(WorkflowError::Validation { reason });
                }
            }
            let reason = match key {
                ActionKey::QuickCopyPrevious | ActionKey::BulkImport => "no period selected",
                _ => "no run selected",
            };
            return Err(WorkflowError::Validation {
                reason: reason.to_string(),
            });
        }

        info!(
            action = key.as_str(),
            stage = stage.index(),
            "Dispatching workflow action"
        );

        let timeout = self.config.timeouts.for_action(key);
        let backend = Arc::clone(&self.backend);

        let outcome = match key {
            ActionKey::QuickCopyPrevious => {
                let period_id = self.selected_period_id(context)?;
                let run = self
                    .runner
                    .run(key, timeout, async move {
                        backend.copy_previous_run(period_id).await
                    })
                    .await?;
                let mut outcome = TransitionOutcome::new(key, RefreshScope::Everything);
                outcome.updated_run = Some(run);
                outcome
            }
            ActionKey::BulkImport => {
                let period_id = self.selected_period_id(context)?;
                let payload = input.import_payload.ok_or_else(|| WorkflowError::Validation {
                    reason: "bulk import requires an import payload".to_string(),
                })?;
                let run = self
                    .runner
                    .run(key, timeout, async move {
                        backend.import_entries(period_id, payload).await
                    })
                    .await?;
                let mut outcome = TransitionOutcome::new(key, RefreshScope::Everything);
                outcome.updated_run = Some(run);
                outcome
            }
            ActionKey::RunCalculationEngine => {
                let run_id = self.selected_run_id(context)?;
                let options = input.calculation.unwrap_or_default();
                let calculation = self
                    .runner
                    .run(key, timeout, async move {
                        backend.run_calculation(run_id, options).await
                    })
                    .await?;
                let mut outcome = TransitionOutcome::new(key, RefreshScope::VersionOnly);
                outcome.calculation = Some(calculation);
                outcome
            }
            ActionKey::RunAudit | ActionKey::RunAdvancedAudit => {
                let run_id = self.selected_run_id(context)?;
                let advanced = key == ActionKey::RunAdvancedAudit;
                let audit = self
                    .runner
                    .run(key, timeout, async move {
                        backend.run_audit(run_id, advanced).await
                    })
                    .await?;
                let mut outcome = TransitionOutcome::new(key, RefreshScope::AuditOnly);
                outcome.audit = Some(audit);
                outcome
            }
            ActionKey::GoBackOneStage
            | ActionKey::RejectAndReturn
            | ActionKey::RevokeApproval => {
                let run_id = self.selected_run_id(context)?;
                let target = predecessor_status(stage).ok_or_else(|| WorkflowError::Validation {
                    reason: "the first stage has no predecessor to go back to".to_string(),
                })?;
                self.dispatch_status_update(key, run_id, target, timeout).await?
            }
            ActionKey::SubmitForReview => {
                let run_id = self.selected_run_id(context)?;
                self.dispatch_status_update(key, run_id, RunStatus::InReview, timeout)
                    .await?
            }
            ActionKey::ApprovePayment => {
                let run_id = self.selected_run_id(context)?;
                self.dispatch_status_update(key, run_id, RunStatus::ApprovedForPayment, timeout)
                    .await?
            }
            ActionKey::MarkAsPaid => {
                let run_id = self.selected_run_id(context)?;
                self.dispatch_status_update(key, run_id, RunStatus::Paid, timeout)
                    .await?
            }
            ActionKey::GenerateReports => {
                let run_id = self.selected_run_id(context)?;
                self.runner
                    .run(key, timeout, async move {
                        backend.generate_reports(run_id).await
                    })
                    .await?;
                TransitionOutcome::new(key, RefreshScope::None)
            }
            ActionKey::GenerateBankFile => {
                let run_id = self.selected_run_id(context)?;
                self.runner
                    .run(key, timeout, async move {
                        backend.generate_bank_file(run_id).await
                    })
                    .await?;
                TransitionOutcome::new(key, RefreshScope::None)
            }
            ActionKey::ArchiveData => {
                let run_id = self.selected_run_id(context)?;
                self.runner
                    .run(key, timeout, async move { backend.archive_run(run_id).await })
                    .await?;
                TransitionOutcome::new(key, RefreshScope::None)
            }
        };

        info!(
            action = key.as_str(),
            refresh = ?outcome.refresh,
            "Workflow action settled"
        );
        Ok(outcome)
    }

    /// Marks anomalies as ignored and returns the superseding audit
    /// summary. The caller should refetch the audit summary only.
    pub async fn ignore_anomalies(
        &self,
        run_id: Uuid,
        anomaly_ids: &[Uuid],
        reason: &str,
    ) -> WorkflowResult<AuditSummary> {
        info!(
            run_id = %run_id,
            count = anomaly_ids.len(),
            "Ignoring audit anomalies"
        );
        self.backend.ignore_anomalies(run_id, anomaly_ids, reason).await
    }

    /// Polls the calculation progress endpoint until the task reaches a
    /// terminal status.
    ///
    /// Polls on the configured interval, optionally backing off
    /// exponentially up to the configured cap, and gives up after the
    /// configured attempt budget. A `FAILED` terminal status surfaces as
    /// [`WorkflowError::CalculationFailed`]; exhausting the budget
    /// surfaces as a timeout, since the task may still be running.
    pub async fn await_calculation(&self, task_id: Uuid) -> WorkflowResult<CalculationProgress> {
        let polling = &self.config.polling;
        let mut interval_ms = polling.interval_ms;
        let mut waited_ms: u64 = 0;

        for _attempt in 0..polling.max_attempts {
            let progress = self.backend.calculation_progress(task_id).await?;
            match progress.status {
                CalculationStatus::Completed => {
                    info!(task_id = %task_id, "Calculation task completed");
                    return Ok(progress);
                }
                CalculationStatus::Failed => {
                    warn!(task_id = %task_id, "Calculation task failed");
                    return Err(WorkflowError::CalculationFailed {
                        task_id,
                        message: progress
                            .message
                            .unwrap_or_else(|| "no failure message reported".to_string()),
                    });
                }
                CalculationStatus::Queued | CalculationStatus::Running => {
                    sleep(std::time::Duration::from_millis(interval_ms)).await;
                    waited_ms += interval_ms;
                    if polling.exponential_backoff {
                        interval_ms = (interval_ms * 2).min(polling.max_interval_ms);
                    }
                }
            }
        }

        Err(WorkflowError::Timeout {
            action: "calculation_progress".to_string(),
            timeout_ms: waited_ms,
        })
    }

    /// Creates a draft run for a period that has none.
    ///
    /// Idempotent by construction: the backend's create-if-absent
    /// operation replaces the client-side debounce heuristic, so calling
    /// this repeatedly for the same period never duplicates runs. Returns
    /// `None` when the period already has runs.
    pub async fn ensure_run_exists(
        &self,
        period: &PayrollPeriod,
    ) -> WorkflowResult<Option<PayrollRun>> {
        if period.has_runs() {
            return Ok(None);
        }
        info!(period_id = %period.id, "Period has no runs, creating draft run");
        let run = self.backend.create_run_if_absent(period.id).await?;
        Ok(Some(run))
    }

    async fn dispatch_status_update(
        &self,
        key: ActionKey,
        run_id: Uuid,
        target: RunStatus,
        timeout: std::time::Duration,
    ) -> WorkflowResult<TransitionOutcome> {
        let backend = Arc::clone(&self.backend);
        let run = self
            .runner
            .run(key, timeout, async move {
                backend.update_status(run_id, target).await
            })
            .await?;
        let mut outcome = TransitionOutcome::new(key, RefreshScope::VersionOnly);
        outcome.updated_run = Some(run);
        Ok(outcome)
    }

    fn selected_run_id(&self, context: &WorkflowContext) -> WorkflowResult<Uuid> {
        context
            .run
            .as_ref()
            .map(|run| run.id)
            .ok_or_else(|| WorkflowError::Validation {
                reason: "no run selected".to_string(),
            })
    }

    fn selected_period_id(&self, context: &WorkflowContext) -> WorkflowResult<Uuid> {
        context
            .period
            .as_ref()
            .map(|period| period.id)
            .ok_or_else(|| WorkflowError::Validation {
                reason: "no period selected".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::models::RunTotals;

    /// Backend double that records calls and serves canned responses.
    #[derive(Default)]
    struct MockBackend {
        calls: Mutex<Vec<String>>,
        update_status_delay: Option<Duration>,
        progress_sequence: Mutex<VecDeque<CalculationProgress>>,
    }

    impl MockBackend {
        fn record(&self, call: impl Into<String>) {
            self.calls
                .lock()
                .unwrap()
                .push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn run(status: RunStatus) -> PayrollRun {
            PayrollRun {
                id: Uuid::new_v4(),
                period_id: Uuid::new_v4(),
                version_number: 1,
                status_code: status.code().to_string(),
                totals: RunTotals {
                    gross_pay: Decimal::ZERO,
                    deductions: Decimal::ZERO,
                    net_pay: Decimal::ZERO,
                    entry_count: 0,
                },
                initiated_at: Utc::now(),
                initiated_by: "op".to_string(),
            }
        }

        fn summary() -> AuditSummary {
            AuditSummary {
                total_entries: 10,
                total_anomalies: 0,
                error_count: 0,
                warning_count: 0,
                auto_fixable_count: 0,
                manually_ignored_count: 0,
            }
        }
    }

    #[async_trait]
    impl PayrollBackend for MockBackend {
        async fn list_periods(&self) -> WorkflowResult<Vec<PayrollPeriod>> {
            self.record("list_periods");
            Ok(vec![])
        }

        async fn list_runs(&self, _period_id: Uuid) -> WorkflowResult<Vec<PayrollRun>> {
            self.record("list_runs");
            Ok(vec![])
        }

        async fn audit_summary(&self, _run_id: Uuid) -> WorkflowResult<Option<AuditSummary>> {
            self.record("audit_summary");
            Ok(Some(Self::summary()))
        }

        async fn run_audit(&self, run_id: Uuid, advanced: bool) -> WorkflowResult<AuditSummary> {
            self.record(format!("run_audit:{}:{}", run_id, advanced));
            Ok(Self::summary())
        }

        async fn update_status(
            &self,
            run_id: Uuid,
            target: RunStatus,
        ) -> WorkflowResult<PayrollRun> {
            self.record(format!("update_status:{}:{}", run_id, target.code()));
            if let Some(delay) = self.update_status_delay {
                sleep(delay).await;
            }
            Ok(Self::run(target))
        }

        async fn run_calculation(
            &self,
            run_id: Uuid,
            _options: CalculationOptions,
        ) -> WorkflowResult<CalculationOutcome> {
            self.record(format!("run_calculation:{}", run_id));
            Ok(CalculationOutcome {
                task_id: Uuid::new_v4(),
                totals: None,
                employee_errors: vec![],
            })
        }

        async fn calculation_progress(
            &self,
            task_id: Uuid,
        ) -> WorkflowResult<CalculationProgress> {
            self.record("calculation_progress");
            let next = self.progress_sequence.lock().unwrap().pop_front();
            Ok(next.unwrap_or(CalculationProgress {
                task_id,
                status: CalculationStatus::Running,
                percent_complete: 50,
                message: None,
            }))
        }

        async fn ignore_anomalies(
            &self,
            run_id: Uuid,
            anomaly_ids: &[Uuid],
            _reason: &str,
        ) -> WorkflowResult<AuditSummary> {
            self.record(format!("ignore_anomalies:{}:{}", run_id, anomaly_ids.len()));
            Ok(Self::summary())
        }

        async fn copy_previous_run(&self, period_id: Uuid) -> WorkflowResult<PayrollRun> {
            self.record(format!("copy_previous_run:{}", period_id));
            Ok(Self::run(RunStatus::Draft))
        }

        async fn import_entries(
            &self,
            period_id: Uuid,
            _payload: serde_json::Value,
        ) -> WorkflowResult<PayrollRun> {
            self.record(format!("import_entries:{}", period_id));
            Ok(Self::run(RunStatus::Draft))
        }

        async fn create_run_if_absent(&self, period_id: Uuid) -> WorkflowResult<PayrollRun> {
            self.record(format!("create_run_if_absent:{}", period_id));
            Ok(Self::run(RunStatus::Draft))
        }

        async fn generate_reports(&self, run_id: Uuid) -> WorkflowResult<()> {
            self.record(format!("generate_reports:{}", run_id));
            Ok(())
        }

        async fn generate_bank_file(&self, run_id: Uuid) -> WorkflowResult<()> {
            self.record(format!("generate_bank_file:{}", run_id));
            Ok(())
        }

        async fn archive_run(&self, run_id: Uuid) -> WorkflowResult<()> {
            self.record(format!("archive_run:{}", run_id));
            Ok(())
        }
    }

    fn engine_with(backend: MockBackend) -> (WorkflowEngine, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let engine = WorkflowEngine::new(
            Arc::clone(&backend) as Arc<dyn PayrollBackend>,
            WorkflowConfig::default(),
        );
        (engine, backend)
    }

    fn period() -> PayrollPeriod {
        PayrollPeriod {
            id: Uuid::new_v4(),
            name: "2024年05月".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            runs_count: 1,
            entries_count: 20,
        }
    }

    fn context(status: RunStatus) -> WorkflowContext {
        WorkflowContext {
            period: Some(period()),
            run: Some(MockBackend::run(status)),
            audit: None,
        }
    }

    fn dirty_audit() -> AuditSummary {
        AuditSummary {
            total_entries: 10,
            total_anomalies: 3,
            error_count: 3,
            warning_count: 0,
            auto_fixable_count: 0,
            manually_ignored_count: 1,
        }
    }

    /// WE-001: gate-blocked submit fails validation before any backend call
    #[tokio::test]
    async fn test_submit_blocked_by_gate_makes_no_backend_call() {
        let (engine, backend) = engine_with(MockBackend::default());
        let mut context = context(RunStatus::Calculated);
        context.audit = Some(dirty_audit());

        let result = engine
            .request_transition(&context, ActionKey::SubmitForReview, ActionInput::default())
            .await;

        match result {
            Err(WorkflowError::Validation { reason }) => {
                assert!(reason.contains("2 outstanding"));
                assert!(reason.contains("1 ignored"));
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
        assert!(backend.calls().is_empty());
    }

    /// WE-002: allowed submit transitions to IN_REVIEW
    #[tokio::test]
    async fn test_submit_for_review_updates_status() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::Calculated);

        let outcome = engine
            .request_transition(&context, ActionKey::SubmitForReview, ActionInput::default())
            .await
            .unwrap();

        assert_eq!(outcome.refresh, RefreshScope::VersionOnly);
        assert!(outcome.updated_run.is_some());
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("update_status:"));
        assert!(calls[0].ends_with(":IN_REVIEW"));
    }

    /// WE-003: revoke approval routes back through re-audit
    #[tokio::test]
    async fn test_revoke_approval_targets_calculated() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::ApprovedForPayment);

        engine
            .request_transition(&context, ActionKey::RevokeApproval, ActionInput::default())
            .await
            .unwrap();

        let calls = backend.calls();
        assert!(calls[0].ends_with(":PRUN_CALCULATED"));
    }

    /// WE-004: go back from the audit stage targets DRAFT
    #[tokio::test]
    async fn test_go_back_from_audit_targets_draft() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::Calculated);

        engine
            .request_transition(&context, ActionKey::GoBackOneStage, ActionInput::default())
            .await
            .unwrap();

        assert!(backend.calls()[0].ends_with(":DRAFT"));
    }

    /// WE-005: audit actions refresh the audit summary only
    #[tokio::test]
    async fn test_run_audit_refreshes_audit_only() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::Calculated);

        let outcome = engine
            .request_transition(&context, ActionKey::RunAudit, ActionInput::default())
            .await
            .unwrap();

        assert_eq!(outcome.refresh, RefreshScope::AuditOnly);
        assert!(outcome.audit.is_some());
        assert!(backend.calls()[0].contains("run_audit"));
        assert!(backend.calls()[0].ends_with(":false"));
    }

    #[tokio::test]
    async fn test_advanced_audit_selects_extended_rule_set() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::Calculated);

        engine
            .request_transition(&context, ActionKey::RunAdvancedAudit, ActionInput::default())
            .await
            .unwrap();

        assert!(backend.calls()[0].ends_with(":true"));
    }

    /// WE-006: actions from the wrong stage surface stale state
    #[tokio::test]
    async fn test_action_from_wrong_stage_is_stale() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::Draft);

        let result = engine
            .request_transition(&context, ActionKey::ApprovePayment, ActionInput::default())
            .await;

        assert!(matches!(result, Err(WorkflowError::StaleState { .. })));
        assert!(backend.calls().is_empty());
    }

    /// WE-007: bulk import requires a payload
    #[tokio::test]
    async fn test_bulk_import_requires_payload() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::Draft);

        let result = engine
            .request_transition(&context, ActionKey::BulkImport, ActionInput::default())
            .await;

        assert!(matches!(result, Err(WorkflowError::Validation { .. })));
        assert!(backend.calls().is_empty());

        let input = ActionInput {
            import_payload: Some(serde_json::json!({"rows": []})),
            calculation: None,
        };
        let outcome = engine
            .request_transition(&context, ActionKey::BulkImport, input)
            .await
            .unwrap();
        assert_eq!(outcome.refresh, RefreshScope::Everything);
    }

    /// WE-008: a slow backend call surfaces a timeout and resets loading
    #[tokio::test(start_paused = true)]
    async fn test_slow_status_update_times_out() {
        let backend = MockBackend {
            update_status_delay: Some(Duration::from_secs(120)),
            ..MockBackend::default()
        };
        let (engine, _backend) = engine_with(backend);
        let context = context(RunStatus::Calculated);

        let result = engine
            .request_transition(&context, ActionKey::SubmitForReview, ActionInput::default())
            .await;

        match result {
            Err(WorkflowError::Timeout { action, timeout_ms }) => {
                assert_eq!(action, "submit_for_review");
                assert_eq!(timeout_ms, 30_000);
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert!(!engine.is_loading(ActionKey::SubmitForReview));
    }

    #[tokio::test]
    async fn test_generate_bank_file_needs_no_refresh() {
        let (engine, backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::ApprovedForPayment);

        let outcome = engine
            .request_transition(&context, ActionKey::GenerateBankFile, ActionInput::default())
            .await
            .unwrap();

        assert_eq!(outcome.refresh, RefreshScope::None);
        assert!(backend.calls()[0].starts_with("generate_bank_file:"));
    }

    #[tokio::test]
    async fn test_blocking_reason_mirrors_gate() {
        let (engine, _backend) = engine_with(MockBackend::default());
        let mut context = context(RunStatus::Calculated);
        assert!(engine.blocking_reason(&context).is_none());

        context.audit = Some(dirty_audit());
        let reason = engine.blocking_reason(&context).unwrap();
        assert!(reason.contains("2 outstanding"));

        let approved = self::context(RunStatus::ApprovedForPayment);
        assert!(engine.blocking_reason(&approved).is_none());
    }

    /// WE-009: ensure_run_exists is a no-op for periods with runs
    #[tokio::test]
    async fn test_ensure_run_exists_skips_populated_period() {
        let (engine, backend) = engine_with(MockBackend::default());
        let populated = period();

        let created = engine.ensure_run_exists(&populated).await.unwrap();
        assert!(created.is_none());
        assert!(backend.calls().is_empty());

        let mut empty = period();
        empty.runs_count = 0;
        let created = engine.ensure_run_exists(&empty).await.unwrap();
        assert!(created.is_some());
        assert_eq!(backend.calls().len(), 1);
    }

    /// WE-010: progress polling stops on the first terminal snapshot
    #[tokio::test(start_paused = true)]
    async fn test_await_calculation_polls_to_completion() {
        let task_id = Uuid::new_v4();
        let backend = MockBackend::default();
        {
            let mut sequence = backend.progress_sequence.lock().unwrap();
            sequence.push_back(CalculationProgress {
                task_id,
                status: CalculationStatus::Queued,
                percent_complete: 0,
                message: None,
            });
            sequence.push_back(CalculationProgress {
                task_id,
                status: CalculationStatus::Running,
                percent_complete: 60,
                message: None,
            });
            sequence.push_back(CalculationProgress {
                task_id,
                status: CalculationStatus::Completed,
                percent_complete: 100,
                message: None,
            });
        }
        let (engine, backend) = engine_with(backend);

        let progress = engine.await_calculation(task_id).await.unwrap();
        assert_eq!(progress.status, CalculationStatus::Completed);
        assert_eq!(
            backend
                .calls()
                .iter()
                .filter(|c| c.as_str() == "calculation_progress")
                .count(),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_calculation_surfaces_failure() {
        let task_id = Uuid::new_v4();
        let backend = MockBackend::default();
        backend
            .progress_sequence
            .lock()
            .unwrap()
            .push_back(CalculationProgress {
                task_id,
                status: CalculationStatus::Failed,
                percent_complete: 30,
                message: Some("tax table missing for region".to_string()),
            });
        let (engine, _backend) = engine_with(backend);

        let result = engine.await_calculation(task_id).await;
        match result {
            Err(WorkflowError::CalculationFailed { message, .. }) => {
                assert!(message.contains("tax table"));
            }
            other => panic!("Expected CalculationFailed, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_calculation_gives_up_after_attempt_budget() {
        // The default mock snapshot is perpetually Running.
        let (engine, backend) = engine_with(MockBackend::default());

        let result = engine.await_calculation(Uuid::new_v4()).await;
        assert!(matches!(result, Err(WorkflowError::Timeout { .. })));
        assert_eq!(backend.calls().len(), 120);
    }

    #[tokio::test]
    async fn test_ignore_anomalies_delegates_to_backend() {
        let (engine, backend) = engine_with(MockBackend::default());
        let run_id = Uuid::new_v4();
        let anomalies = [Uuid::new_v4(), Uuid::new_v4()];

        let summary = engine
            .ignore_anomalies(run_id, &anomalies, "known rounding artifact")
            .await
            .unwrap();

        assert_eq!(summary.effective_error_count(), 0);
        assert_eq!(backend.calls()[0], format!("ignore_anomalies:{}:2", run_id));
    }

    #[tokio::test]
    async fn test_available_actions_follow_run_stage() {
        let (engine, _backend) = engine_with(MockBackend::default());
        let context = context(RunStatus::Paid);

        let actions = engine.available_actions(&context);
        let keys: Vec<ActionKey> = actions.iter().map(|a| a.key).collect();
        assert_eq!(keys, vec![ActionKey::GenerateReports, ActionKey::ArchiveData]);
        assert!(actions.iter().all(|a| a.enabled));
    }
}
