use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/simulation", get(status).put(toggle))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulationState {
    enabled: bool,
}

async fn status(State(state): State<AppState>) -> Json<SimulationState> {
    Json(SimulationState {
        enabled: state.simulator.is_running().await,
    })
}

async fn toggle(
    State(state): State<AppState>,
    Json(request): Json<SimulationState>,
) -> Json<SimulationState> {
    // ---
    info!("PUT /api/simulation - enabled={}", request.enabled);
    let enabled = state.simulator.set_enabled(request.enabled).await;
    Json(SimulationState { enabled })
}
