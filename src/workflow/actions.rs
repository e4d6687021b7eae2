//! Per-stage action registry.
//!
//! Each workflow stage owns a fixed, ordered list of actions. Enablement
//! is a pure predicate over the current selection context and audit
//! snapshot, re-evaluated on every query; nothing in this module holds
//! state.

use serde::{Deserialize, Serialize};

use crate::models::{AuditSummary, PayrollPeriod, PayrollRun};
use crate::workflow::{WorkflowStage, can_advance};

/// A named, user-triggerable operation scoped to one workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKey {
    /// Create a new run by copying the previous period's run.
    QuickCopyPrevious,
    /// Create or extend a run by importing entries in bulk.
    BulkImport,
    /// Invoke the external calculation engine on the selected run.
    RunCalculationEngine,
    /// Run the standard audit over the selected run.
    RunAudit,
    /// Run the advanced audit rule set over the selected run.
    RunAdvancedAudit,
    /// Compensating transition to the stage's fixed predecessor status.
    GoBackOneStage,
    /// Submit the audited run for review.
    SubmitForReview,
    /// Approve the reviewed run for payment.
    ApprovePayment,
    /// Reject the run under review and return it for re-audit.
    RejectAndReturn,
    /// Revoke payment approval, routing the run back through re-audit.
    RevokeApproval,
    /// Generate payroll reports for the selected run.
    GenerateReports,
    /// Generate the bank payment file for the selected run.
    GenerateBankFile,
    /// Mark the approved run as paid.
    MarkAsPaid,
    /// Archive the completed run's data.
    ArchiveData,
}

impl ActionKey {
    /// The stable string form of this key, used for loading-state maps,
    /// logs, and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKey::QuickCopyPrevious => "quick_copy_previous",
            ActionKey::BulkImport => "bulk_import",
            ActionKey::RunCalculationEngine => "run_calculation_engine",
            ActionKey::RunAudit => "run_audit",
            ActionKey::RunAdvancedAudit => "run_advanced_audit",
            ActionKey::GoBackOneStage => "go_back_one_stage",
            ActionKey::SubmitForReview => "submit_for_review",
            ActionKey::ApprovePayment => "approve_payment",
            ActionKey::RejectAndReturn => "reject_and_return",
            ActionKey::RevokeApproval => "revoke_approval",
            ActionKey::GenerateReports => "generate_reports",
            ActionKey::GenerateBankFile => "generate_bank_file",
            ActionKey::MarkAsPaid => "mark_as_paid",
            ActionKey::ArchiveData => "archive_data",
        }
    }

    /// Parses the stable string form back into a key.
    pub fn parse(raw: &str) -> Option<ActionKey> {
        ALL_ACTIONS.iter().copied().find(|key| key.as_str() == raw)
    }

    /// Whether a successful invocation supersedes the audit snapshot,
    /// so the caller should refetch the audit summary specifically.
    pub fn is_audit_related(&self) -> bool {
        matches!(
            self,
            ActionKey::RunAudit | ActionKey::RunAdvancedAudit
        )
    }
}

/// Every action key, in registry order.
const ALL_ACTIONS: [ActionKey; 14] = [
    ActionKey::QuickCopyPrevious,
    ActionKey::BulkImport,
    ActionKey::RunCalculationEngine,
    ActionKey::RunAudit,
    ActionKey::RunAdvancedAudit,
    ActionKey::GoBackOneStage,
    ActionKey::SubmitForReview,
    ActionKey::ApprovePayment,
    ActionKey::RejectAndReturn,
    ActionKey::RevokeApproval,
    ActionKey::GenerateReports,
    ActionKey::GenerateBankFile,
    ActionKey::MarkAsPaid,
    ActionKey::ArchiveData,
];

/// The snapshot of session state that action enablement is evaluated
/// against: the selected period, the selected run, and the latest audit
/// summary for that run (if any).
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    /// The currently selected pay period, if any.
    pub period: Option<PayrollPeriod>,
    /// The currently selected payroll run, if any.
    pub run: Option<PayrollRun>,
    /// The latest audit summary for the selected run, if one has run.
    pub audit: Option<AuditSummary>,
}

impl WorkflowContext {
    /// Whether a period is selected.
    pub fn has_period(&self) -> bool {
        self.period.is_some()
    }

    /// Whether a run is selected.
    pub fn has_run(&self) -> bool {
        self.run.is_some()
    }

    /// The workflow stage of the selected run, or the first stage when no
    /// run is selected.
    pub fn current_stage(&self) -> WorkflowStage {
        self.run
            .as_ref()
            .map(PayrollRun::stage)
            .unwrap_or(WorkflowStage::DataPreparation)
    }
}

/// A stage-scoped action with its enablement evaluated against a context.
///
/// Descriptors are stateless and recomputed on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// The action key.
    pub key: ActionKey,
    /// The stage that owns this action.
    pub stage: WorkflowStage,
    /// Whether the action is currently enabled.
    pub enabled: bool,
}

/// The fixed, ordered action list a stage owns.
pub fn actions_for(stage: WorkflowStage) -> &'static [ActionKey] {
    match stage {
        WorkflowStage::DataPreparation => &[
            ActionKey::QuickCopyPrevious,
            ActionKey::BulkImport,
            ActionKey::RunCalculationEngine,
        ],
        WorkflowStage::AuditCheck => &[
            ActionKey::RunAudit,
            ActionKey::RunAdvancedAudit,
            ActionKey::GoBackOneStage,
            ActionKey::SubmitForReview,
        ],
        WorkflowStage::AuditApproval => &[
            ActionKey::ApprovePayment,
            ActionKey::RejectAndReturn,
        ],
        WorkflowStage::PaymentPreparation => &[
            ActionKey::RevokeApproval,
            ActionKey::GenerateReports,
            ActionKey::GenerateBankFile,
            ActionKey::MarkAsPaid,
        ],
        WorkflowStage::Completion => &[
            ActionKey::GenerateReports,
            ActionKey::ArchiveData,
        ],
    }
}

/// The stage that owns an action key within the given stage's registry.
///
/// `GenerateReports` appears in two stages; ownership is resolved against
/// the stage being evaluated, so the lookup takes the current stage.
pub fn stage_owns(stage: WorkflowStage, key: ActionKey) -> bool {
    actions_for(stage).contains(&key)
}

/// Evaluates whether an action is enabled against the given context.
///
/// Pure predicate over the selection state, current stage, and audit
/// snapshot:
/// - the generation actions (copy, import) require a selected period;
/// - every other action requires a selected run;
/// - `submit_for_review` additionally requires the audit gate to allow
///   advancing out of the audit stage.
pub fn is_enabled(key: ActionKey, context: &WorkflowContext) -> bool {
    match key {
        ActionKey::QuickCopyPrevious | ActionKey::BulkImport => context.has_period(),
        ActionKey::SubmitForReview => {
            context.has_run()
                && can_advance(context.current_stage(), context.audit.as_ref()).allowed
        }
        _ => context.has_run(),
    }
}

/// Builds the evaluated descriptors for a stage against a context.
pub fn describe_actions(stage: WorkflowStage, context: &WorkflowContext) -> Vec<ActionDescriptor> {
    actions_for(stage)
        .iter()
        .map(|&key| ActionDescriptor {
            key,
            stage,
            enabled: is_enabled(key, context),
        })
        .collect()
}
