//! Audit gate evaluation.
//!
//! This module decides whether a stage's forward transition is permitted,
//! given the latest audit summary snapshot. Only the audit-check stage is
//! gated client-side; every other stage's gating, if any, is enforced by
//! the backend on the transition endpoint and not duplicated here.

use crate::models::AuditSummary;
use crate::workflow::WorkflowStage;

/// The outcome of an audit gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Whether the forward transition is permitted.
    pub allowed: bool,
    /// Why the transition is blocked. Non-`None` exactly when `allowed`
    /// is false.
    pub reason: Option<String>,
}

impl GateDecision {
    fn open() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn blocked(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Evaluates whether the given stage may advance, based on the audit
/// snapshot.
///
/// Only [`WorkflowStage::AuditCheck`] is gated. A missing audit summary
/// (`None`) does not block: "no audit run yet" is a distinct, earlier
/// condition handled by UI affordance, not a hard block. When an audit
/// exists, advancing requires `effective_error_count == 0`.
///
/// The blocking message carries the effective error count and, when any
/// anomalies were manually ignored, the ignored count, so an operator can
/// distinguish "0 total errors" from "errors exist but were ignored".
///
/// # Example
///
/// ```
/// use payroll_workflow::models::AuditSummary;
/// use payroll_workflow::workflow::{WorkflowStage, can_advance};
///
/// let summary = AuditSummary {
///     total_entries: 10,
///     total_anomalies: 3,
///     error_count: 3,
///     warning_count: 0,
///     auto_fixable_count: 0,
///     manually_ignored_count: 1,
/// };
/// let decision = can_advance(WorkflowStage::AuditCheck, Some(&summary));
/// assert!(!decision.allowed);
/// assert!(decision.reason.unwrap().contains("2"));
/// ```
pub fn can_advance(stage: WorkflowStage, audit: Option<&AuditSummary>) -> GateDecision {
    if stage != WorkflowStage::AuditCheck {
        return GateDecision::open();
    }

    let Some(summary) = audit else {
        return GateDecision::open();
    };

    let effective = summary.effective_error_count();
    if effective == 0 {
        return GateDecision::open();
    }

    let reason = if summary.manually_ignored_count > 0 {
        format!(
            "{} outstanding audit error(s) ({} ignored) must be resolved before submitting for review",
            effective, summary.manually_ignored_count
        )
    } else {
        format!(
            "{} outstanding audit error(s) must be resolved before submitting for review",
            effective
        )
    };
    GateDecision::blocked(reason)
}
