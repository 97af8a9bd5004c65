//! Seams to the hosted data store.
//!
//! The pipeline only talks to these traits; [`PgBackend`] implements them
//! over PostgreSQL and the unit tests use an in-memory double.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewReading, Notification, RawReading, Sensor};
use crate::range::TimeWindow;

mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::PgBackend;

// ---

/// Read/write access to sensor readings and the sensor registry.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Readings inside `window`, ascending by timestamp.
    async fn fetch_readings(&self, window: TimeWindow) -> Result<Vec<RawReading>>;

    /// Registered sensors, ordered by id.
    async fn list_sensors(&self) -> Result<Vec<Sensor>>;

    async fn insert_reading(&self, reading: &NewReading) -> Result<()>;
}

/// Persistent mirror of the notification registry, keyed by `custom_id`.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    /// All notifications, newest first.
    async fn load_notifications(&self) -> Result<Vec<Notification>>;

    /// Insert or overwrite by `custom_id`.
    async fn upsert_notification(&self, notification: &Notification) -> Result<()>;

    async fn hide_toast(&self, custom_id: &str) -> Result<()>;

    async fn delete_notification(&self, custom_id: &str) -> Result<()>;
}
