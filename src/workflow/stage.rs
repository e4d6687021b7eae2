//! Workflow stage derivation.
//!
//! This module contains the [`WorkflowStage`] enum and the mapping from a
//! persisted run status string to a stage. The stage is derived state,
//! never stored: every recomputation starts from the backend's status.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{RunStatus, normalize_status_code};

/// A step in the five-stage payroll run life-cycle.
///
/// Stages form a total order, index 0–4. The workflow is linear with no
/// cycles except the explicit compensating back-transition described by
/// [`predecessor_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Stage 0: collecting and preparing payroll data.
    DataPreparation,
    /// Stage 1: running audits against the calculated run.
    AuditCheck,
    /// Stage 2: reviewing and approving the audited run.
    AuditApproval,
    /// Stage 3: preparing payment artifacts for the approved run.
    PaymentPreparation,
    /// Stage 4: terminal stage; the run has been paid.
    Completion,
}

impl WorkflowStage {
    /// All stages in life-cycle order.
    pub const ALL: [WorkflowStage; 5] = [
        WorkflowStage::DataPreparation,
        WorkflowStage::AuditCheck,
        WorkflowStage::AuditApproval,
        WorkflowStage::PaymentPreparation,
        WorkflowStage::Completion,
    ];

    /// The ordinal index of this stage (0–4).
    pub fn index(&self) -> u8 {
        match self {
            WorkflowStage::DataPreparation => 0,
            WorkflowStage::AuditCheck => 1,
            WorkflowStage::AuditApproval => 2,
            WorkflowStage::PaymentPreparation => 3,
            WorkflowStage::Completion => 4,
        }
    }

    /// Whether this is the terminal stage. No actions re-enter the
    /// workflow once a run reaches completion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Completion)
    }
}

/// Maps a persisted run status string to its workflow stage.
///
/// Total function over all strings. Localized aliases are normalized
/// before lookup, and unrecognized status codes map to
/// [`WorkflowStage::DataPreparation`]: an unexpected backend status value
/// must never crash the guide, only under-advance it.
///
/// # Example
///
/// ```
/// use payroll_workflow::workflow::{WorkflowStage, stage_of};
///
/// assert_eq!(stage_of("PRUN_CALCULATED"), WorkflowStage::AuditCheck);
/// assert_eq!(stage_of("已计算"), WorkflowStage::AuditCheck);
/// assert_eq!(stage_of("PAID"), WorkflowStage::Completion);
/// assert_eq!(stage_of("???"), WorkflowStage::DataPreparation);
/// ```
pub fn stage_of(status_code: &str) -> WorkflowStage {
    match RunStatus::parse(status_code) {
        Some(RunStatus::Draft) => WorkflowStage::DataPreparation,
        Some(RunStatus::Calculated) => WorkflowStage::AuditCheck,
        Some(RunStatus::InReview) => WorkflowStage::AuditApproval,
        Some(RunStatus::ApprovedForPayment) => WorkflowStage::PaymentPreparation,
        Some(RunStatus::Paid) => WorkflowStage::Completion,
        None => {
            warn!(
                status = %normalize_status_code(status_code),
                "Unrecognized run status, defaulting to data preparation stage"
            );
            WorkflowStage::DataPreparation
        }
    }
}

/// The target status of the compensating back-transition from a stage.
///
/// Stage 3's predecessor is deliberately the audit stage, not the approval
/// stage: payment preparation issues are routed back through re-audit
/// rather than re-approval. This asymmetry is business policy and must be
/// preserved exactly.
///
/// Returns `None` for the first stage, which has nothing to go back to.
///
/// # Example
///
/// ```
/// use payroll_workflow::models::RunStatus;
/// use payroll_workflow::workflow::{WorkflowStage, predecessor_status};
///
/// assert_eq!(
///     predecessor_status(WorkflowStage::PaymentPreparation),
///     Some(RunStatus::Calculated)
/// );
/// assert_eq!(predecessor_status(WorkflowStage::DataPreparation), None);
/// ```
pub fn predecessor_status(stage: WorkflowStage) -> Option<RunStatus> {
    match stage {
        WorkflowStage::DataPreparation => None,
        WorkflowStage::AuditCheck => Some(RunStatus::Draft),
        WorkflowStage::AuditApproval => Some(RunStatus::Calculated),
        WorkflowStage::PaymentPreparation => Some(RunStatus::Calculated),
        WorkflowStage::Completion => Some(RunStatus::ApprovedForPayment),
    }
}
