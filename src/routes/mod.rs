//! HTTP gateway: merges every subrouter and binds the shared state.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use chrono::Local;
use serde_json::json;

use crate::backend::ReadingSource;
use crate::error::PipelineError;
use crate::monitor::Monitor;
use crate::notifications::SharedNotifications;
use crate::simulation::Simulator;

mod chart;
mod health;
mod notifications;
mod sensors;
mod simulation;

// ---

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ReadingSource>,
    pub monitor: Arc<Monitor<Local>>,
    pub notifications: SharedNotifications,
    pub simulator: Arc<Simulator>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(chart::router())
        .merge(notifications::router())
        .merge(sensors::router())
        .merge(simulation::router())
        .merge(health::router())
        .with_state(state)
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        // ---
        let status = match &self {
            PipelineError::InvalidRange(_)
            | PipelineError::MissingReferenceDate(_)
            | PipelineError::NonexistentLocalTime(_) => StatusCode::BAD_REQUEST,
            PipelineError::MissingSensor => StatusCode::NOT_FOUND,
            PipelineError::Fetch(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
