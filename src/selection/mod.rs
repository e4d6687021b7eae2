//! Auto-selection of the working period and run version.
//!
//! A secondary state machine, distinct from the workflow but sharing its
//! data model: on load and on dependency change it picks the "best"
//! period and run version so the operator lands on the thing they most
//! likely want to act on next.

use chrono::{Datelike, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::models::{PayrollPeriod, PayrollRun, RunStatus};

/// The four accepted name formats for the current calendar year+month.
///
/// Period names are free text; a period "belongs to" a month when its
/// name contains the month rendered in any of these formats.
///
/// # Example
///
/// ```
/// use payroll_workflow::selection::month_name_candidates;
///
/// let candidates = month_name_candidates(2024, 5);
/// assert_eq!(candidates, [
///     "2024年05月".to_string(),
///     "2024年5月".to_string(),
///     "2024-05".to_string(),
///     "2024-5".to_string(),
/// ]);
/// ```
pub fn month_name_candidates(year: i32, month: u32) -> [String; 4] {
    [
        format!("{year}年{month:02}月"),
        format!("{year}年{month}月"),
        format!("{year}-{month:02}"),
        format!("{year}-{month}"),
    ]
}

/// Picks the period to auto-select for the given date.
///
/// Searches, in list order, for a period whose name contains the date's
/// year+month in any accepted format; the first match wins. When none
/// match, falls back to the first element of the (server-ordered) list.
/// Returns `None` only for an empty list.
pub fn resolve_period(periods: &[PayrollPeriod], today: NaiveDate) -> Option<&PayrollPeriod> {
    let candidates = month_name_candidates(today.year(), today.month());
    periods
        .iter()
        .find(|period| candidates.iter().any(|c| period.name.contains(c)))
        .or_else(|| periods.first())
}

/// Picks the run version to auto-select from a period's loaded versions.
///
/// Priority: a calculated run, else a draft run, else the first loaded
/// version. Calculated-but-unreviewed runs are the most common "thing to
/// act on next", so they win over both drafts and later-stage runs.
/// Returns `None` only for an empty list.
pub fn resolve_run(runs: &[PayrollRun]) -> Option<&PayrollRun> {
    runs.iter()
        .find(|run| run.has_status(RunStatus::Calculated))
        .or_else(|| runs.iter().find(|run| run.has_status(RunStatus::Draft)))
        .or_else(|| runs.first())
}

/// Session-local selection state: the chosen period and run version.
///
/// Selections are never persisted. Changing the selected period always
/// clears the selected run in the same call, so no state read can ever
/// observe a run from the old period against the new period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected_period: Option<Uuid>,
    selected_run: Option<Uuid>,
}

impl SelectionState {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected period id, if any.
    pub fn selected_period(&self) -> Option<Uuid> {
        self.selected_period
    }

    /// The selected run id, if any.
    pub fn selected_run(&self) -> Option<Uuid> {
        self.selected_run
    }

    /// Selects a period, clearing the run selection if the period
    /// actually changed.
    pub fn select_period(&mut self, period_id: Uuid) {
        if self.selected_period == Some(period_id) {
            return;
        }
        debug!(period_id = %period_id, "Period selection changed, clearing run selection");
        self.selected_period = Some(period_id);
        self.selected_run = None;
    }

    /// Selects a run version within the current period.
    pub fn select_run(&mut self, run_id: Uuid) {
        self.selected_run = Some(run_id);
    }

    /// Clears both selections.
    pub fn clear(&mut self) {
        self.selected_period = None;
        self.selected_run = None;
    }

    /// Auto-selects a period when none is selected and periods are
    /// loaded. Returns whether the selection changed.
    pub fn ensure_period(&mut self, periods: &[PayrollPeriod], today: NaiveDate) -> bool {
        if self.selected_period.is_some() || periods.is_empty() {
            return false;
        }
        match resolve_period(periods, today) {
            Some(period) => {
                debug!(period_id = %period.id, name = %period.name, "Auto-selected period");
                self.select_period(period.id);
                true
            }
            None => false,
        }
    }

    /// Auto-selects a run version when a period is selected, no run is
    /// selected, and versions are loaded. Returns whether the selection
    /// changed.
    pub fn ensure_run(&mut self, runs: &[PayrollRun]) -> bool {
        if self.selected_period.is_none() || self.selected_run.is_some() || runs.is_empty() {
            return false;
        }
        match resolve_run(runs) {
            Some(run) => {
                debug!(
                    run_id = %run.id,
                    version = run.version_number,
                    status = %run.status_code,
                    "Auto-selected run version"
                );
                self.selected_run = Some(run.id);
                true
            }
            None => false,
        }
    }
}
