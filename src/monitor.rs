//! The live dashboard view.
//!
//! Holds the current selection and the chart state a display reads, and runs
//! the fetch → normalize → aggregate → alert pipeline. Refreshes come from
//! both the poll timer and the change feed and may overlap; each one takes a
//! ticket from a [`RefreshSequencer`] and a result is only shown if nothing
//! newer has been shown already.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::aggregate::{aggregate, Mode};
use crate::alerts::AlertEvaluator;
use crate::backend::ReadingSource;
use crate::error::Result;
use crate::models::{ChartPoint, NormalizedReading};
use crate::normalize::normalize_all;
use crate::notifications::SharedNotifications;
use crate::range::{is_history, resolve, RangeToken, TimeWindow};
use crate::thresholds::{Metric, Threshold};

// ---

/// Monotonic guard against out-of-order refresh completions.
#[derive(Debug, Default)]
pub struct RefreshSequencer {
    issued: AtomicU64,
    committed: AtomicU64,
}

impl RefreshSequencer {
    // ---
    /// Take a ticket for a refresh that is about to start.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record `ticket` as shown; `false` if a newer ticket was already shown.
    pub fn commit(&self, ticket: u64) -> bool {
        self.committed.fetch_max(ticket, Ordering::SeqCst) < ticket
    }
}

/// What the dashboard is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSelection {
    pub range: RangeToken,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Show every reading instead of the range's default aggregation.
    #[serde(default)]
    pub detail: bool,
}

impl ViewSelection {
    pub fn mode(&self) -> Mode {
        if self.detail {
            Mode::Detail
        } else {
            self.range.default_mode()
        }
    }

    /// Resolve this selection's query window at `now`.
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<TimeWindow> {
        resolve(self.range, self.date, now)
    }
}

impl Default for ViewSelection {
    fn default() -> Self {
        Self {
            range: RangeToken::Last24h,
            date: None,
            detail: false,
        }
    }
}

/// Display state of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStatus {
    Loading,
    Empty,
    Ready,
}

/// Snapshot handed to the display surface.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub status: ChartStatus,
    pub selection: ViewSelection,
    pub mode: Mode,
    pub updated_at: Option<DateTime<Utc>>,
    pub points: Vec<ChartPoint>,
}

/// Newest non-null value of one metric, for the metric cards.
#[derive(Debug, Clone, Serialize)]
pub struct LatestValue {
    pub metric: Metric,
    pub value: Option<f64>,
    pub threshold: Threshold,
}

struct ViewState {
    selection: ViewSelection,
    loading: bool,
    updated_at: Option<DateTime<Utc>>,
    readings: Vec<NormalizedReading>,
    points: Vec<ChartPoint>,
    evaluator: AlertEvaluator,
}

pub struct Monitor<Tz: TimeZone> {
    source: Arc<dyn ReadingSource>,
    notifications: SharedNotifications,
    tz: Tz,
    sequencer: RefreshSequencer,
    state: Mutex<ViewState>,
}

impl<Tz> Monitor<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Display + Send + Sync,
{
    // ---
    pub fn new(
        source: Arc<dyn ReadingSource>,
        notifications: SharedNotifications,
        tz: Tz,
        staleness: chrono::Duration,
    ) -> Self {
        Self {
            source,
            notifications,
            tz,
            sequencer: RefreshSequencer::default(),
            state: Mutex::new(ViewState {
                selection: ViewSelection::default(),
                loading: true,
                updated_at: None,
                readings: Vec::new(),
                points: Vec::new(),
                evaluator: AlertEvaluator::new(staleness),
            }),
        }
    }

    /// Switch to `selection`; the chart is loading until the next refresh.
    pub async fn select(&self, selection: ViewSelection) {
        // ---
        let mut state = self.state.lock().await;
        tracing::info!(
            "View changed to {} (date: {:?}, detail: {})",
            selection.range,
            selection.date,
            selection.detail
        );
        state.selection = selection;
        state.loading = true;
    }

    pub async fn selection(&self) -> ViewSelection {
        self.state.lock().await.selection.clone()
    }

    pub async fn snapshot(&self) -> ChartSnapshot {
        // ---
        let state = self.state.lock().await;
        let status = if state.loading {
            ChartStatus::Loading
        } else if state.points.is_empty() {
            ChartStatus::Empty
        } else {
            ChartStatus::Ready
        };
        ChartSnapshot {
            status,
            selection: state.selection.clone(),
            mode: state.selection.mode(),
            updated_at: state.updated_at,
            points: state.points.clone(),
        }
    }

    /// Newest non-null value per metric within the current window.
    pub async fn latest_values(&self) -> Vec<LatestValue> {
        // ---
        let state = self.state.lock().await;
        Metric::ALL
            .into_iter()
            .map(|metric| LatestValue {
                metric,
                value: state
                    .readings
                    .iter()
                    .rev()
                    .find_map(|r| r.values.get(metric)),
                threshold: metric.threshold(),
            })
            .collect()
    }

    pub async fn refresh(&self) {
        self.refresh_at(Utc::now()).await;
    }

    /// Run the pipeline for the current selection as of `now`.
    ///
    /// Backend failures are logged and leave the previous chart in place.
    pub async fn refresh_at(&self, now: DateTime<Utc>) {
        // ---
        let selection = self.selection().await;
        let ticket = self.sequencer.begin();
        let local_now = now.with_timezone(&self.tz);

        let window = match selection.window(&local_now) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!("Cannot refresh view: {}", e);
                self.settle_failed(&selection).await;
                return;
            }
        };

        let raw = match self.source.fetch_readings(window).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Failed to fetch readings: {}", e);
                self.settle_failed(&selection).await;
                return;
            }
        };

        let readings = normalize_all(&raw);
        let points = aggregate(&readings, selection.mode(), &self.tz);

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.selection != selection {
            tracing::debug!("Discarding refresh #{}: selection changed", ticket);
            return;
        }
        if !self.sequencer.commit(ticket) {
            tracing::debug!("Discarding refresh #{}: newer result already shown", ticket);
            return;
        }

        tracing::debug!(
            "Refresh #{} produced {} points from {} readings",
            ticket,
            points.len(),
            readings.len()
        );
        state.readings = readings;
        state.points = points;
        state.loading = false;
        state.updated_at = Some(now);

        let actions = if is_history(selection.range, selection.date, &local_now) {
            Vec::new()
        } else {
            state.evaluator.evaluate(state.readings.last(), now)
        };
        drop(guard);

        if !actions.is_empty() {
            self.notifications.lock().await.apply(actions, now).await;
        }
    }

    /// Stop loading after a failed refresh, unless the view has moved on.
    async fn settle_failed(&self, selection: &ViewSelection) {
        let mut state = self.state.lock().await;
        if state.selection == *selection {
            state.loading = false;
        }
    }

    /// Refresh every `period` until the handle is aborted.
    pub fn spawn_poller(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        // ---
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                monitor.refresh().await;
            }
        })
    }
}
