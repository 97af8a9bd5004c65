use axum::{extract::State, routing::get, Json, Router};
use tracing::error;

use super::AppState;
use crate::error::PipelineError;
use crate::models::Sensor;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/sensors", get(list))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Sensor>>, PipelineError> {
    // ---
    let sensors = state.source.list_sensors().await.inspect_err(|e| {
        error!("Failed to list sensors: {}", e);
    })?;
    Ok(Json(sensors))
}
