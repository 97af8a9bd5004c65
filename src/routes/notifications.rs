use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::info;

use super::AppState;
use crate::models::Notification;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/notifications", get(list))
        .route("/api/notifications/toasts", get(toasts))
        .route("/api/notifications/{id}/dismiss", post(dismiss))
        .route("/api/notifications/{id}", delete(remove))
}

async fn list(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifications.lock().await.notifications().to_vec())
}

async fn toasts(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifications.lock().await.toasts())
}

async fn dismiss(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<Notification>> {
    // ---
    info!("POST /api/notifications/{}/dismiss", id);
    let mut store = state.notifications.lock().await;
    Json(store.dismiss_toast(&id).await.to_vec())
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Json<Vec<Notification>> {
    // ---
    info!("DELETE /api/notifications/{}", id);
    let mut store = state.notifications.lock().await;
    Json(store.delete(&id).await.to_vec())
}
