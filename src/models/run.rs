//! Payroll run and run status models.
//!
//! This module contains the [`PayrollRun`] type, its monetary [`RunTotals`],
//! and the [`RunStatus`] enum with normalization of the localized status
//! aliases that the backend is known to emit alongside canonical codes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::{WorkflowStage, stage_of};

/// Canonical persisted status of a payroll run.
///
/// Exactly one status applies at any time. The workflow never branches on
/// localized display strings directly; raw backend strings are normalized
/// through [`normalize_status_code`] before any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Newly generated run, data still being prepared.
    Draft,
    /// The calculation engine has produced totals for this run.
    #[serde(rename = "PRUN_CALCULATED")]
    Calculated,
    /// Submitted for review and awaiting approval.
    InReview,
    /// Approved and ready for payment preparation.
    ApprovedForPayment,
    /// Payment has been made; the run is complete.
    Paid,
}

/// Localized display strings observed in persisted status fields, mapped
/// to their canonical codes. One-way static data: canonical codes are
/// never mapped back to display strings here.
const STATUS_ALIASES: &[(&str, &str)] = &[
    ("草稿", "DRAFT"),
    ("已计算", "PRUN_CALCULATED"),
    ("审核中", "IN_REVIEW"),
    ("待审核", "IN_REVIEW"),
    ("已审批", "APPROVED_FOR_PAYMENT"),
    ("待发放", "APPROVED_FOR_PAYMENT"),
    ("已发放", "PAID"),
];

/// Normalizes a raw status string to its canonical code.
///
/// Trims whitespace, passes canonical codes through unchanged, and maps
/// known localized aliases to their canonical code. Unknown strings are
/// returned trimmed but otherwise untouched so that downstream stage
/// mapping can apply its fail-open default.
///
/// # Example
///
/// ```
/// use payroll_workflow::models::normalize_status_code;
///
/// assert_eq!(normalize_status_code("已计算"), "PRUN_CALCULATED");
/// assert_eq!(normalize_status_code("DRAFT"), "DRAFT");
/// assert_eq!(normalize_status_code("  PAID "), "PAID");
/// assert_eq!(normalize_status_code("SOMETHING_ELSE"), "SOMETHING_ELSE");
/// ```
pub fn normalize_status_code(raw: &str) -> &str {
    let trimmed = raw.trim();
    STATUS_ALIASES
        .iter()
        .find(|(alias, _)| *alias == trimmed)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(trimmed)
}

impl RunStatus {
    /// Returns the canonical status code for this status.
    pub fn code(&self) -> &'static str {
        match self {
            RunStatus::Draft => "DRAFT",
            RunStatus::Calculated => "PRUN_CALCULATED",
            RunStatus::InReview => "IN_REVIEW",
            RunStatus::ApprovedForPayment => "APPROVED_FOR_PAYMENT",
            RunStatus::Paid => "PAID",
        }
    }

    /// Parses a raw status string, applying alias normalization first.
    ///
    /// Returns `None` for strings that are neither a canonical code nor a
    /// known alias. Callers that need the fail-open stage default should
    /// use [`stage_of`] instead.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_workflow::models::RunStatus;
    ///
    /// assert_eq!(RunStatus::parse("已计算"), Some(RunStatus::Calculated));
    /// assert_eq!(RunStatus::parse("IN_REVIEW"), Some(RunStatus::InReview));
    /// assert_eq!(RunStatus::parse("REJECTED_BY_MARS"), None);
    /// ```
    pub fn parse(raw: &str) -> Option<RunStatus> {
        match normalize_status_code(raw) {
            "DRAFT" => Some(RunStatus::Draft),
            "PRUN_CALCULATED" => Some(RunStatus::Calculated),
            "IN_REVIEW" => Some(RunStatus::InReview),
            "APPROVED_FOR_PAYMENT" => Some(RunStatus::ApprovedForPayment),
            "PAID" => Some(RunStatus::Paid),
            _ => None,
        }
    }
}

/// Monetary totals of a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Total gross pay across all entries.
    pub gross_pay: Decimal,
    /// Total deductions across all entries.
    pub deductions: Decimal,
    /// Total net pay across all entries.
    pub net_pay: Decimal,
    /// Number of payroll entries in the run.
    pub entry_count: u32,
}

impl RunTotals {
    /// Checks that `net_pay = gross_pay - deductions` within the given
    /// rounding tolerance, and that no total is negative.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_workflow::models::RunTotals;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let totals = RunTotals {
    ///     gross_pay: Decimal::from_str("1000.00").unwrap(),
    ///     deductions: Decimal::from_str("250.00").unwrap(),
    ///     net_pay: Decimal::from_str("750.01").unwrap(),
    ///     entry_count: 12,
    /// };
    /// assert!(totals.is_balanced(Decimal::from_str("0.01").unwrap()));
    /// assert!(!totals.is_balanced(Decimal::ZERO));
    /// ```
    pub fn is_balanced(&self, tolerance: Decimal) -> bool {
        if self.gross_pay < Decimal::ZERO
            || self.deductions < Decimal::ZERO
            || self.net_pay < Decimal::ZERO
        {
            return false;
        }
        let difference = self.gross_pay - self.deductions - self.net_pay;
        difference.abs() <= tolerance
    }
}

/// A versioned payroll computation over one pay period.
///
/// Runs are created by a generation action (import, copy, or manual entry)
/// in `DRAFT` status and mutated only via explicit transition requests.
/// The workflow never deletes a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique identifier for the run.
    pub id: Uuid,
    /// The pay period this run belongs to.
    pub period_id: Uuid,
    /// Version number, strictly increasing per period.
    pub version_number: u32,
    /// The persisted status string as returned by the backend.
    ///
    /// Kept raw so that unexpected backend values never fail
    /// deserialization; [`PayrollRun::status`] and [`PayrollRun::stage`]
    /// apply normalization and the fail-open stage default.
    #[serde(rename = "status")]
    pub status_code: String,
    /// Monetary totals for the run.
    pub totals: RunTotals,
    /// When the run was initiated.
    pub initiated_at: DateTime<Utc>,
    /// Operator who initiated the run.
    pub initiated_by: String,
}

impl PayrollRun {
    /// Returns the canonical status, if the persisted string is a known
    /// code or alias.
    pub fn status(&self) -> Option<RunStatus> {
        RunStatus::parse(&self.status_code)
    }

    /// Derives the workflow stage for this run from its persisted status.
    ///
    /// Unknown status strings map to the first stage rather than failing.
    pub fn stage(&self) -> WorkflowStage {
        stage_of(&self.status_code)
    }

    /// Whether this run currently carries the given canonical status.
    pub fn has_status(&self, status: RunStatus) -> bool {
        self.status() == Some(status)
    }
}
