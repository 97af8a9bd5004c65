//! Data models for the dashboard pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thresholds::Metric;

// ---

/// Sensor sample exactly as stored in `sensor_readings`.
#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct RawReading {
    // ---
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub data: Option<serde_json::Value>,
}

/// One optional value per monitored metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    // ---
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub solar_radiation: Option<f64>,
    pub ph: Option<f64>,
}

impl MetricValues {
    // ---
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::SolarRadiation => self.solar_radiation,
            Metric::Ph => self.ph,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Temperature => &mut self.temperature,
            Metric::Humidity => &mut self.humidity,
            Metric::SoilMoisture => &mut self.soil_moisture,
            Metric::SolarRadiation => &mut self.solar_radiation,
            Metric::Ph => &mut self.ph,
        };
        *slot = value;
    }
}

/// Reading with canonical field names, derived from a [`RawReading`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReading {
    // ---
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: MetricValues,
}

/// One chart sample after aggregation.
///
/// `id` is the source reading id in detail and hourly mode and absent for
/// daily averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    // ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: MetricValues,
}

/// Severity/category of a notification, used by the display to pick a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Error,
    Warning,
    Info,
    Success,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
        }
    }

    /// Parse a stored kind; unknown values degrade to `Info`.
    pub fn parse(s: &str) -> Self {
        match s {
            "error" => NotificationKind::Error,
            "warning" => NotificationKind::Warning,
            "success" => NotificationKind::Success,
            _ => NotificationKind::Info,
        }
    }
}

/// Whether the backend has acknowledged the last local write of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    #[default]
    Confirmed,
}

/// Alert or informational record shown as a toast and in the popover list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    // ---
    pub custom_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub sensor: Option<String>,
    pub show_toast: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sync: SyncStatus,
}

/// Fields a producer supplies when raising a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    // ---
    pub custom_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub sensor: Option<String>,
}

impl NotificationDraft {
    /// Stamp the draft into a visible, not-yet-confirmed notification.
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            custom_id: self.custom_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            sensor: self.sensor,
            show_toast: true,
            created_at: now,
            sync: SyncStatus::Pending,
        }
    }
}

/// Reading to be inserted into `sensor_readings`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReading {
    // ---
    pub sensor_id: i64,
    pub sensor_serial_number: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub quality_score: i32,
    pub data: serde_json::Value,
}

/// Row of the sensor registry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Sensor {
    // ---
    pub id: i64,
    pub serial_number: String,
    pub location: Option<String>,
    pub kind: Option<String>,
    pub modbus_address: Option<i32>,
    pub status: String,
}
