//! Request types for the workflow console API.
//!
//! This module defines the JSON request structures for the
//! `/workflow/evaluate` and `/workflow/transition` endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{AuditSummary, PayrollPeriod, PayrollRun};
use crate::workflow::{ActionInput, WorkflowContext};

/// Request body for the `/workflow/evaluate` endpoint.
///
/// Carries the page's current selection snapshot; the evaluation itself
/// is stateless, so the same request always produces the same stage,
/// action list, and blocking reason (modulo in-flight loading flags).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// The currently selected pay period, if any.
    #[serde(default)]
    pub period: Option<PayrollPeriod>,
    /// The currently selected payroll run, if any.
    #[serde(default)]
    pub run: Option<PayrollRun>,
    /// The latest audit summary for the selected run, if one has run.
    #[serde(default)]
    pub audit: Option<AuditSummary>,
}

impl From<EvaluateRequest> for WorkflowContext {
    fn from(request: EvaluateRequest) -> Self {
        WorkflowContext {
            period: request.period,
            run: request.run,
            audit: request.audit,
        }
    }
}

/// Request body for the `/workflow/transition` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// The action key to dispatch (e.g., "submit_for_review").
    ///
    /// Kept as a raw string so unknown keys surface as a structured
    /// error rather than a deserialization failure.
    pub action: String,
    /// The page's current selection snapshot.
    #[serde(flatten)]
    pub context: EvaluateRequest,
    /// Payloads for the parameterized actions.
    #[serde(default)]
    pub input: ActionInput,
}
