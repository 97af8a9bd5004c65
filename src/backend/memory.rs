//! In-memory backend double for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{NotificationBackend, ReadingSource};
use crate::error::{PipelineError, Result};
use crate::models::{NewReading, Notification, RawReading, Sensor, SyncStatus};
use crate::range::TimeWindow;

// ---

#[derive(Default)]
pub(crate) struct MemoryBackend {
    pub readings: Mutex<Vec<RawReading>>,
    pub sensors: Mutex<Vec<Sensor>>,
    pub inserted: Mutex<Vec<NewReading>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub failing: AtomicBool,
}

impl MemoryBackend {
    // ---
    pub fn with_readings(readings: Vec<RawReading>) -> Self {
        let backend = Self::default();
        *backend.readings.lock().unwrap() = readings;
        backend
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PipelineError::Fetch(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReadingSource for MemoryBackend {
    async fn fetch_readings(&self, window: TimeWindow) -> Result<Vec<RawReading>> {
        self.check()?;
        let mut rows: Vec<_> = self
            .readings
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.timestamp >= window.from && r.timestamp <= window.to)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }

    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        self.check()?;
        Ok(self.sensors.lock().unwrap().clone())
    }

    async fn insert_reading(&self, reading: &NewReading) -> Result<()> {
        self.check()?;
        self.inserted.lock().unwrap().push(reading.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationBackend for MemoryBackend {
    async fn load_notifications(&self) -> Result<Vec<Notification>> {
        self.check()?;
        let mut rows = self.notifications.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn upsert_notification(&self, notification: &Notification) -> Result<()> {
        self.check()?;
        let mut stored = notification.clone();
        stored.sync = SyncStatus::Confirmed;
        let mut rows = self.notifications.lock().unwrap();
        match rows.iter_mut().find(|n| n.custom_id == stored.custom_id) {
            Some(existing) => *existing = stored,
            None => rows.push(stored),
        }
        Ok(())
    }

    async fn hide_toast(&self, custom_id: &str) -> Result<()> {
        self.check()?;
        for n in self.notifications.lock().unwrap().iter_mut() {
            if n.custom_id == custom_id {
                n.show_toast = false;
            }
        }
        Ok(())
    }

    async fn delete_notification(&self, custom_id: &str) -> Result<()> {
        self.check()?;
        self.notifications
            .lock()
            .unwrap()
            .retain(|n| n.custom_id != custom_id);
        Ok(())
    }
}
