//! Audit summary model.
//!
//! This module contains the [`AuditSummary`] type, the point-in-time audit
//! snapshot whose effective error count is the sole signal gating forward
//! progress out of the audit stage.

use serde::{Deserialize, Serialize};

/// A point-in-time audit snapshot tied to one payroll run.
///
/// Produced by invoking the audit-check action and superseded (not merged)
/// by each subsequent audit run. Absent until the first audit has run.
///
/// Ignored anomalies are tracked by id in a set server-side, so an
/// operator's explicit "ignore" decision is honored exactly once;
/// this client only reads the aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Number of payroll entries the audit inspected.
    pub total_entries: u32,
    /// Total anomalies found, across all severities.
    pub total_anomalies: u32,
    /// Number of error-severity anomalies.
    pub error_count: u32,
    /// Number of warning-severity anomalies.
    pub warning_count: u32,
    /// Number of anomalies the audit subsystem can fix automatically.
    pub auto_fixable_count: u32,
    /// Number of anomalies an operator has explicitly ignored.
    pub manually_ignored_count: u32,
}

impl AuditSummary {
    /// Errors minus those explicitly ignored by an operator, floored at 0.
    ///
    /// This derived count is the sole gating signal for leaving the audit
    /// stage.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_workflow::models::AuditSummary;
    ///
    /// let summary = AuditSummary {
    ///     total_entries: 100,
    ///     total_anomalies: 4,
    ///     error_count: 3,
    ///     warning_count: 1,
    ///     auto_fixable_count: 0,
    ///     manually_ignored_count: 1,
    /// };
    /// assert_eq!(summary.effective_error_count(), 2);
    /// ```
    pub fn effective_error_count(&self) -> u32 {
        self.error_count.saturating_sub(self.manually_ignored_count)
    }

    /// Whether the snapshot is clean enough to leave the audit stage.
    pub fn is_clean(&self) -> bool {
        self.effective_error_count() == 0
    }
}
