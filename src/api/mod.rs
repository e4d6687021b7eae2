//! HTTP API module for the workflow console.
//!
//! This module provides the REST endpoints through which the UI layer
//! queries workflow state and dispatches actions.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{EvaluateRequest, TransitionRequest};
pub use response::{ApiError, EvaluateResponse};
pub use state::AppState;
