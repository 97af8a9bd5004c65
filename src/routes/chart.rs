use axum::{extract::State, routing::get, Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::AppState;
use crate::error::PipelineError;
use crate::monitor::{ChartSnapshot, LatestValue, ViewSelection};
use crate::range::RangeToken;
use crate::thresholds::{Metric, Threshold};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/chart", get(chart))
        .route("/api/view", get(view).put(select_view))
        .route("/api/metrics/latest", get(latest))
        .route("/api/thresholds", get(thresholds))
}

/// Body of `PUT /api/view`.
#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    range: String,
    date: Option<NaiveDate>,
    #[serde(default)]
    detail: bool,
}

impl ViewRequest {
    /// Parse and validate against the current local time.
    fn into_selection(self) -> Result<ViewSelection, PipelineError> {
        // ---
        let selection = ViewSelection {
            range: self.range.parse::<RangeToken>()?,
            date: self.date,
            detail: self.detail,
        };
        selection.window(&Local::now())?;
        Ok(selection)
    }
}

async fn chart(State(state): State<AppState>) -> Json<ChartSnapshot> {
    Json(state.monitor.snapshot().await)
}

async fn view(State(state): State<AppState>) -> Json<ViewSelection> {
    Json(state.monitor.selection().await)
}

async fn select_view(
    State(state): State<AppState>,
    Json(request): Json<ViewRequest>,
) -> Result<Json<ChartSnapshot>, PipelineError> {
    // ---
    info!("PUT /api/view - {:?}", request);
    let selection = request.into_selection()?;

    state.monitor.select(selection).await;
    state.monitor.refresh().await;

    debug!("PUT /api/view - Returning OK");
    Ok(Json(state.monitor.snapshot().await))
}

async fn latest(State(state): State<AppState>) -> Json<Vec<LatestValue>> {
    Json(state.monitor.latest_values().await)
}

#[derive(Serialize)]
struct ThresholdEntry {
    metric: Metric,
    #[serde(flatten)]
    threshold: Threshold,
}

async fn thresholds() -> Json<Vec<ThresholdEntry>> {
    Json(
        Metric::ALL
            .into_iter()
            .map(|metric| ThresholdEntry {
                metric,
                threshold: metric.threshold(),
            })
            .collect(),
    )
}
