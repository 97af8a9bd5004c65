//! Raw reading → normalized reading.
//!
//! The payload column has been written by several generations of sensor
//! firmware. Each canonical metric is looked up under a fixed list of keys,
//! oldest spelling first; the first present value that reads as a number
//! wins, whether stored as a JSON number or a numeric string. Values are not
//! validated or clamped here.

use serde_json::Value;

use crate::models::{MetricValues, NormalizedReading, RawReading};
use crate::thresholds::Metric;

// ---

/// Payload keys consulted for a metric, in priority order.
fn source_keys(metric: Metric) -> &'static [&'static str] {
    match metric {
        Metric::Temperature => &["temperature"],
        Metric::Humidity => &["humidity"],
        Metric::SoilMoisture => &["soil_humidity", "soil_moisture"],
        Metric::SolarRadiation => &["solar_radiation"],
        Metric::Ph => &["ph"],
    }
}

/// A JSON number, or a string holding one.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

impl RawReading {
    // ---
    /// Normalize this reading; `None` when the payload is absent.
    pub fn normalize(&self) -> Option<NormalizedReading> {
        // ---
        let data = self.data.as_ref().filter(|d| !d.is_null())?;

        let mut values = MetricValues::default();
        for metric in Metric::ALL {
            let value = source_keys(metric)
                .iter()
                .find_map(|key| data.get(*key).and_then(as_number));
            values.set(metric, value);
        }

        Some(NormalizedReading {
            id: self.id,
            timestamp: self.timestamp,
            values,
        })
    }
}

/// Normalize a batch, dropping readings with no payload.
pub fn normalize_all(raw: &[RawReading]) -> Vec<NormalizedReading> {
    // ---
    let normalized: Vec<_> = raw.iter().filter_map(RawReading::normalize).collect();
    if normalized.len() < raw.len() {
        tracing::debug!(
            "Dropped {} readings without payload",
            raw.len() - normalized.len()
        );
    }
    normalized
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn raw(data: Option<Value>) -> RawReading {
        // ---
        RawReading {
            id: 7,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
            data,
        }
    }

    #[test]
    fn test_canonical_fields() {
        // ---
        let r = raw(Some(json!({
            "temperature": 22.4,
            "humidity": 55,
            "soil_moisture": 40.5,
            "solar_radiation": 800,
            "ph": 6.8
        })))
        .normalize()
        .unwrap();

        assert_eq!(r.id, 7);
        assert_eq!(r.values.temperature, Some(22.4));
        assert_eq!(r.values.humidity, Some(55.0));
        assert_eq!(r.values.soil_moisture, Some(40.5));
        assert_eq!(r.values.solar_radiation, Some(800.0));
        assert_eq!(r.values.ph, Some(6.8));
    }

    #[test]
    fn test_soil_aliases_yield_same_value() {
        // ---
        let legacy = raw(Some(json!({ "soil_humidity": 33.0 }))).normalize().unwrap();
        let current = raw(Some(json!({ "soil_moisture": 33.0 }))).normalize().unwrap();
        let both = raw(Some(json!({ "soil_humidity": 33.0, "soil_moisture": 33.0 })))
            .normalize()
            .unwrap();

        assert_eq!(legacy.values.soil_moisture, Some(33.0));
        assert_eq!(current.values.soil_moisture, Some(33.0));
        assert_eq!(both.values.soil_moisture, Some(33.0));
    }

    #[test]
    fn test_first_non_null_alias_wins() {
        // ---
        let r = raw(Some(json!({ "soil_humidity": null, "soil_moisture": 61.0 })))
            .normalize()
            .unwrap();
        assert_eq!(r.values.soil_moisture, Some(61.0));

        let r = raw(Some(json!({ "soil_humidity": 12.0, "soil_moisture": 61.0 })))
            .normalize()
            .unwrap();
        assert_eq!(r.values.soil_moisture, Some(12.0));
    }

    #[test]
    fn test_missing_payload_is_dropped() {
        // ---
        assert!(raw(None).normalize().is_none());
        assert!(raw(Some(Value::Null)).normalize().is_none());

        let batch = vec![raw(None), raw(Some(json!({ "ph": 7.0 })))];
        assert_eq!(normalize_all(&batch).len(), 1);
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        // ---
        let r = raw(Some(json!({ "temperature": -400.0, "ph": 42 })))
            .normalize()
            .unwrap();
        assert_eq!(r.values.temperature, Some(-400.0));
        assert_eq!(r.values.ph, Some(42.0));
        assert_eq!(r.values.humidity, None);
    }

    #[test]
    fn test_non_numeric_values_are_absent() {
        // ---
        let r = raw(Some(json!({ "temperature": "hot" }))).normalize().unwrap();
        assert_eq!(r.values.temperature, None);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        // ---
        let r = raw(Some(json!({
            "temperature": "22.5",
            "soil_humidity": "40",
            "ph": " 6.1 ",
            "humidity": "NaN"
        })))
        .normalize()
        .unwrap();

        assert_eq!(r.values.temperature, Some(22.5));
        assert_eq!(r.values.soil_moisture, Some(40.0));
        assert_eq!(r.values.ph, Some(6.1));
        assert_eq!(r.values.humidity, None);
    }

    #[test]
    fn test_unparsable_alias_falls_through() {
        // ---
        let r = raw(Some(json!({ "soil_humidity": "wet", "soil_moisture": 61 })))
            .normalize()
            .unwrap();
        assert_eq!(r.values.soil_moisture, Some(61.0));
    }
}
