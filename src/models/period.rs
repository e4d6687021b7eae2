//! Pay period model.
//!
//! This module contains the [`PayrollPeriod`] type describing one calendar
//! pay cycle that owns zero or more payroll runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A calendar pay cycle.
///
/// Periods are immutable once created except for the denormalized
/// `runs_count` and `entries_count` counters maintained by the backend.
/// At most one run per period is "selected" in a UI session; that
/// selection is session-local and never persisted.
///
/// # Example
///
/// ```
/// use payroll_workflow::models::PayrollPeriod;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let period = PayrollPeriod {
///     id: Uuid::new_v4(),
///     name: "2024年05月".to_string(),
///     start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
///     runs_count: 2,
///     entries_count: 48,
/// };
/// assert!(period.has_runs());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// Unique identifier for the period.
    pub id: Uuid,
    /// Display name of the period (e.g., "2024年05月" or "2024-05").
    pub name: String,
    /// The first day of the period.
    pub start_date: NaiveDate,
    /// Number of payroll runs owned by this period.
    pub runs_count: u32,
    /// Number of payroll entries across the period's runs.
    pub entries_count: u32,
}

impl PayrollPeriod {
    /// Whether the period owns at least one payroll run.
    pub fn has_runs(&self) -> bool {
        self.runs_count > 0
    }
}
