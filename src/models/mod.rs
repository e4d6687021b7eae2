//! Core data models for the payroll workflow engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod calculation;
mod period;
mod run;

pub use audit::AuditSummary;
pub use calculation::{
    CalculationOptions, CalculationOutcome, CalculationProgress, CalculationStatus,
    EmployeeCalculationError,
};
pub use period::PayrollPeriod;
pub use run::{PayrollRun, RunStatus, RunTotals, normalize_status_code};
