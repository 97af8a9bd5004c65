//! Monitored metrics and their crop thresholds.
//!
//! Every metric the dashboard knows about is a variant of [`Metric`]; the
//! threshold table is a total `match` over that enum, so adding a metric
//! fails to compile until it has a threshold, a JSON key and a display
//! precision.

use serde::{Deserialize, Serialize};

// ---

/// A sensor quantity shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    SoilMoisture,
    SolarRadiation,
    Ph,
}

impl Metric {
    /// All metrics, in threshold-table order.
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::SoilMoisture,
        Metric::Ph,
        Metric::SolarRadiation,
    ];

    /// Canonical field name used in JSON payloads and chart points.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::SoilMoisture => "soil_moisture",
            Metric::SolarRadiation => "solar_radiation",
            Metric::Ph => "ph",
        }
    }

    /// Stable notification id for this metric's out-of-range alert.
    pub fn alert_id(self) -> String {
        format!("alert-{}", self.key())
    }

    /// Round a value to the precision the dashboard displays.
    pub fn round_display(self, value: f64) -> f64 {
        match self {
            Metric::Temperature | Metric::Humidity | Metric::SoilMoisture => {
                (value * 10.0).round() / 10.0
            }
            Metric::Ph => (value * 100.0).round() / 100.0,
            Metric::SolarRadiation => value.round(),
        }
    }

    /// Acceptable range and labels for this metric.
    pub fn threshold(self) -> Threshold {
        match self {
            Metric::Temperature => Threshold::new(10.0, 35.0, "Temperature", "°C"),
            Metric::Humidity => Threshold::new(40.0, 80.0, "Air Humidity", "%"),
            Metric::SoilMoisture => Threshold::new(20.0, 90.0, "Soil Moisture", "%"),
            Metric::Ph => Threshold::new(5.5, 7.5, "pH", ""),
            Metric::SolarRadiation => Threshold::new(100.0, 1200.0, "Radiation", "W/m²"),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Inclusive acceptable range for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub min: f64,
    pub max: f64,
    pub label: &'static str,
    pub unit: &'static str,
}

impl Threshold {
    const fn new(min: f64, max: f64, label: &'static str, unit: &'static str) -> Self {
        Self {
            min,
            max,
            label,
            unit,
        }
    }

    /// `true` when `value` lies within `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_threshold_edges_are_inclusive() {
        // ---
        let ph = Metric::Ph.threshold();
        assert!(ph.contains(5.5));
        assert!(ph.contains(7.5));
        assert!(!ph.contains(5.49));
        assert!(!ph.contains(7.51));
    }

    #[test]
    fn test_alert_ids_are_derived_from_metric_key() {
        // ---
        assert_eq!(Metric::Ph.alert_id(), "alert-ph");
        assert_eq!(Metric::SoilMoisture.alert_id(), "alert-soil_moisture");
    }

    #[test]
    fn test_display_rounding() {
        // ---
        assert_eq!(Metric::Temperature.round_display(21.349), 21.3);
        assert_eq!(Metric::Ph.round_display(6.876), 6.88);
        assert_eq!(Metric::SolarRadiation.round_display(812.5), 813.0);
    }

    #[test]
    fn test_every_metric_has_a_sane_range() {
        // ---
        for metric in Metric::ALL {
            let t = metric.threshold();
            assert!(t.min < t.max, "{metric} has an empty range");
            assert!(!t.label.is_empty());
        }
    }
}
