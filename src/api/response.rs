//! Response types for the workflow console API.
//!
//! This module defines the error response structures, the evaluation
//! response, and the mapping from engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::workflow::{ActionDescriptor, ActionKey, WorkflowStage};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an unknown action error response.
    pub fn unknown_action(key: &str) -> Self {
        Self::with_details(
            "UNKNOWN_ACTION",
            format!("Unknown workflow action: {}", key),
            "The action key is not part of any workflow stage's registry",
        )
    }
}

/// Response body for the `/workflow/evaluate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    /// The workflow stage derived from the submitted run.
    pub stage: WorkflowStage,
    /// The stage's ordinal index (0–4).
    pub stage_index: u8,
    /// The stage's actions with evaluated enablement, in registry order.
    pub actions: Vec<ActionDescriptor>,
    /// Why forward progress is blocked, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_reason: Option<String>,
    /// Action keys currently in flight in this session.
    pub loading: Vec<ActionKey>,
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<WorkflowError> for ApiErrorResponse {
    fn from(error: WorkflowError) -> Self {
        match error {
            WorkflowError::Validation { reason } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("TRANSITION_BLOCKED", reason),
            },
            WorkflowError::StaleState { action, reason } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "STALE_STATE",
                    format!("Action '{}' is stale", action),
                    reason,
                ),
            },
            WorkflowError::Timeout { action, timeout_ms } => ApiErrorResponse {
                status: StatusCode::GATEWAY_TIMEOUT,
                error: ApiError::with_details(
                    "ACTION_TIMEOUT",
                    format!("Action '{}' timed out after {}ms", action, timeout_ms),
                    "The operation may still be completing; refetch to observe its effect",
                ),
            },
            WorkflowError::Remote { code, message } => ApiErrorResponse {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::with_details("BACKEND_ERROR", message, code),
            },
            WorkflowError::UnknownAction { key } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::unknown_action(&key),
            },
            WorkflowError::CalculationFailed { task_id, message } => ApiErrorResponse {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::with_details(
                    "CALCULATION_FAILED",
                    message,
                    format!("task {}", task_id),
                ),
            },
            WorkflowError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    format!("Configuration file not found: {}", path),
                ),
            },
            WorkflowError::ConfigParse { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
            WorkflowError::Internal { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details("INTERNAL_ERROR", "Internal workflow error", message),
            },
        }
    }
}
