//! HTTP request handlers for the workflow console API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::workflow::{ActionKey, WorkflowContext};

use super::request::{EvaluateRequest, TransitionRequest};
use super::response::{ApiError, ApiErrorResponse, EvaluateResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/workflow/evaluate", post(evaluate_handler))
        .route("/workflow/transition", post(transition_handler))
        .with_state(state)
}

/// Maps a JSON extraction rejection to an API error body.
fn rejection_error(correlation_id: Uuid, rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    }
}

/// Handler for POST /workflow/evaluate.
///
/// Evaluates the submitted selection snapshot into the current stage,
/// the stage's actions with enablement, and the blocking reason, if any.
async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/json")],
                Json(rejection_error(correlation_id, rejection)),
            )
                .into_response();
        }
    };

    let context: WorkflowContext = request.into();
    let stage = context.current_stage();
    let engine = state.engine();

    info!(
        correlation_id = %correlation_id,
        stage = stage.index(),
        has_run = context.has_run(),
        "Evaluated workflow state"
    );

    let response = EvaluateResponse {
        stage,
        stage_index: stage.index(),
        actions: engine.available_actions(&context),
        blocking_reason: engine.blocking_reason(&context),
        loading: engine.loading_actions(),
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(response),
    )
        .into_response()
}

/// Handler for POST /workflow/transition.
///
/// Dispatches a workflow action through the engine. Enablement is
/// re-validated at dispatch time; the response tells the caller what to
/// refetch.
async fn transition_handler(
    State(state): State<AppState>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/json")],
                Json(rejection_error(correlation_id, rejection)),
            )
                .into_response();
        }
    };

    let Some(action) = ActionKey::parse(&request.action) else {
        warn!(
            correlation_id = %correlation_id,
            action = %request.action,
            "Unknown workflow action requested"
        );
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "application/json")],
            Json(ApiError::unknown_action(&request.action)),
        )
            .into_response();
    };

    let context: WorkflowContext = request.context.into();
    info!(
        correlation_id = %correlation_id,
        action = action.as_str(),
        "Processing transition request"
    );

    match state.engine().request_transition(&context, action, request.input).await {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                action = action.as_str(),
                refresh = ?outcome.refresh,
                "Transition completed"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(outcome),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                action = action.as_str(),
                error = %err,
                "Transition failed"
            );
            let response: ApiErrorResponse = err.into();
            response.into_response()
        }
    }
}
