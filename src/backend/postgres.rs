use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{NotificationBackend, ReadingSource};
use crate::error::Result;
use crate::models::{
    NewReading, Notification, NotificationKind, RawReading, Sensor, SyncStatus,
};
use crate::range::TimeWindow;

// ---

/// PostgreSQL implementation of the backend traits.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `notifications` row as stored; `kind` is plain text.
#[derive(sqlx::FromRow)]
struct NotificationRow {
    custom_id: String,
    kind: String,
    title: String,
    message: String,
    sensor: Option<String>,
    show_toast: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            custom_id: row.custom_id,
            kind: NotificationKind::parse(&row.kind),
            title: row.title,
            message: row.message,
            sensor: row.sensor,
            show_toast: row.show_toast,
            created_at: row.created_at,
            sync: SyncStatus::Confirmed,
        }
    }
}

#[async_trait]
impl ReadingSource for PgBackend {
    // ---
    async fn fetch_readings(&self, window: TimeWindow) -> Result<Vec<RawReading>> {
        // ---
        let rows = sqlx::query_as::<_, RawReading>(
            r#"
            SELECT id, timestamp, data
            FROM sensor_readings
            WHERE timestamp >= $1 AND timestamp <= $2
            ORDER BY timestamp ASC
            "#,
        )
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            "Fetched {} readings between {} and {}",
            rows.len(),
            window.from,
            window.to
        );
        Ok(rows)
    }

    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        // ---
        let sensors = sqlx::query_as::<_, Sensor>(
            r#"
            SELECT id, serial_number, location, kind, modbus_address, status
            FROM sensors
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sensors)
    }

    async fn insert_reading(&self, reading: &NewReading) -> Result<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO sensor_readings (
                sensor_id, sensor_serial_number, timestamp,
                source, quality_score, data
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reading.sensor_id)
        .bind(&reading.sensor_serial_number)
        .bind(reading.timestamp)
        .bind(&reading.source)
        .bind(reading.quality_score)
        .bind(&reading.data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl NotificationBackend for PgBackend {
    // ---
    async fn load_notifications(&self) -> Result<Vec<Notification>> {
        // ---
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT custom_id, kind, title, message, sensor, show_toast, created_at
            FROM notifications
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn upsert_notification(&self, n: &Notification) -> Result<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO notifications (
                custom_id, kind, title, message, sensor, show_toast, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (custom_id) DO UPDATE SET
                kind       = EXCLUDED.kind,
                title      = EXCLUDED.title,
                message    = EXCLUDED.message,
                sensor     = EXCLUDED.sensor,
                show_toast = EXCLUDED.show_toast,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&n.custom_id)
        .bind(n.kind.as_str())
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.sensor)
        .bind(n.show_toast)
        .bind(n.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn hide_toast(&self, custom_id: &str) -> Result<()> {
        // ---
        sqlx::query("UPDATE notifications SET show_toast = FALSE WHERE custom_id = $1")
            .bind(custom_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_notification(&self, custom_id: &str) -> Result<()> {
        // ---
        sqlx::query("DELETE FROM notifications WHERE custom_id = $1")
            .bind(custom_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
