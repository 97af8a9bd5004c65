//! Fabricated readings for demos and bench testing.
//!
//! While enabled, the simulator writes one random reading every period for
//! the first registered sensor, through the same insert path real sensors
//! use. It turns itself off if no sensor is registered.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::backend::ReadingSource;
use crate::error::{PipelineError, Result};
use crate::models::{NewReading, NotificationDraft, NotificationKind};
use crate::notifications::SharedNotifications;

// ---

const SIMULATION_NOTICE_ID: &str = "sim-active";
const SIMULATION_SOURCE: &str = "CLIENT-SIMULATOR";

pub struct Simulator {
    source: Arc<dyn ReadingSource>,
    notifications: SharedNotifications,
    period: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Simulator {
    // ---
    pub fn new(
        source: Arc<dyn ReadingSource>,
        notifications: SharedNotifications,
        period: Duration,
    ) -> Self {
        Self {
            source,
            notifications,
            period,
            task: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }

    /// Start or stop the generator; returns whether it is now running.
    pub async fn set_enabled(self: &Arc<Self>, enabled: bool) -> bool {
        // ---
        let mut task = self.task.lock().await;
        match (enabled, task.is_some()) {
            (true, false) => {
                tracing::info!("Starting simulation (every {:?})", self.period);
                *task = Some(self.spawn_loop());
                drop(task);
                self.notifications
                    .lock()
                    .await
                    .upsert(
                        NotificationDraft {
                            custom_id: SIMULATION_NOTICE_ID.to_string(),
                            kind: NotificationKind::Info,
                            title: "Simulation active".to_string(),
                            message: "Generating sensor readings...".to_string(),
                            sensor: None,
                        },
                        Utc::now(),
                    )
                    .await;
                true
            }
            (false, true) => {
                if let Some(handle) = task.take() {
                    handle.abort();
                }
                drop(task);
                tracing::info!("Simulation stopped");
                self.notifications
                    .lock()
                    .await
                    .delete(SIMULATION_NOTICE_ID)
                    .await;
                false
            }
            (_, running) => running,
        }
    }

    /// Insert one fabricated reading for the first registered sensor.
    pub async fn tick(&self) -> Result<NewReading> {
        // ---
        let sensor = self
            .source
            .list_sensors()
            .await?
            .into_iter()
            .next()
            .ok_or(PipelineError::MissingSensor)?;

        let reading = NewReading {
            sensor_id: sensor.id,
            sensor_serial_number: sensor.serial_number,
            timestamp: Utc::now(),
            source: SIMULATION_SOURCE.to_string(),
            quality_score: 100,
            data: fabricate(&mut rand::thread_rng()),
        };

        tracing::debug!("Simulated reading: {}", reading.data);
        self.source.insert_reading(&reading).await?;
        Ok(reading)
    }

    fn spawn_loop(self: &Arc<Self>) -> JoinHandle<()> {
        // ---
        let simulator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(simulator.period);
            loop {
                ticker.tick().await;
                match simulator.tick().await {
                    Ok(_) => {}
                    Err(PipelineError::MissingSensor) => {
                        tracing::error!("No sensors registered, disabling simulation");
                        simulator.task.lock().await.take();
                        simulator
                            .notifications
                            .lock()
                            .await
                            .delete(SIMULATION_NOTICE_ID)
                            .await;
                        return;
                    }
                    Err(e) => tracing::error!("Simulation insert failed: {}", e),
                }
            }
        })
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Random payload within plausible field ranges.
///
/// Soil moisture is written under both the legacy and current key.
fn fabricate<R: Rng>(rng: &mut R) -> Value {
    // ---
    let soil = round_to(rng.gen_range(15.0..95.0), 1);
    json!({
        "temperature": round_to(rng.gen_range(5.0..40.0), 1),
        "humidity": round_to(rng.gen_range(30.0..90.0), 1),
        "soil_humidity": soil,
        "soil_moisture": soil,
        "ph": round_to(rng.gen_range(4.5..8.5), 2),
        "solar_radiation": round_to(rng.gen_range(0.0..1300.0), 0),
    })
}
