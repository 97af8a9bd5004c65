//! Threshold evaluation of the newest reading.
//!
//! Evaluation is edge-triggered: it runs once per new reading and never polls.
//! Each metric's alert has a fixed id, so a metric that stays out of range
//! keeps updating one notification instead of stacking new ones.

use chrono::{DateTime, Duration, Utc};

use crate::models::{NormalizedReading, NotificationDraft, NotificationKind};
use crate::thresholds::Metric;

// ---

/// Change requested of the notification store.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertAction {
    /// Upsert this alert.
    Raise(NotificationDraft),
    /// Delete the alert with this id, if present.
    Clear(String),
}

/// Evaluates readings against [`Metric::threshold`].
#[derive(Debug)]
pub struct AlertEvaluator {
    last_evaluated: Option<i64>,
    staleness: Duration,
}

impl AlertEvaluator {
    // ---
    /// Readings older than `staleness` at evaluation time are ignored.
    pub fn new(staleness: Duration) -> Self {
        Self {
            last_evaluated: None,
            staleness,
        }
    }

    /// Evaluate `latest`, returning the store changes it implies.
    ///
    /// Returns nothing when there is no reading, when this reading id was
    /// already evaluated, or when the reading is stale.
    pub fn evaluate(
        &mut self,
        latest: Option<&NormalizedReading>,
        now: DateTime<Utc>,
    ) -> Vec<AlertAction> {
        // ---
        let Some(reading) = latest else {
            return Vec::new();
        };
        if self.last_evaluated == Some(reading.id) {
            return Vec::new();
        }
        self.last_evaluated = Some(reading.id);

        let age = now - reading.timestamp;
        if age > self.staleness {
            tracing::debug!(
                "Skipping alert evaluation for stale reading {} ({}s old)",
                reading.id,
                age.num_seconds()
            );
            return Vec::new();
        }

        Metric::ALL
            .into_iter()
            .filter_map(|metric| {
                let value = reading.values.get(metric)?;
                let threshold = metric.threshold();

                if threshold.contains(value) {
                    return Some(AlertAction::Clear(metric.alert_id()));
                }

                tracing::warn!(
                    "ALERT: {} out of range ({} not in [{}, {}])",
                    threshold.label,
                    value,
                    threshold.min,
                    threshold.max
                );
                Some(AlertAction::Raise(NotificationDraft {
                    custom_id: metric.alert_id(),
                    kind: NotificationKind::Error,
                    title: format!("⚠️ {} alert", threshold.label),
                    message: format!(
                        "Current reading ({:.1}{}) out of range.",
                        value, threshold.unit
                    ),
                    sensor: Some(metric.key().to_string()),
                }))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::MetricValues;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 19, 12, 0, 0).unwrap()
    }

    fn ph_reading(id: i64, ph: f64, timestamp: DateTime<Utc>) -> NormalizedReading {
        NormalizedReading {
            id,
            timestamp,
            values: MetricValues {
                ph: Some(ph),
                ..Default::default()
            },
        }
    }

    fn evaluator() -> AlertEvaluator {
        AlertEvaluator::new(Duration::minutes(5))
    }

    #[test]
    fn test_out_of_range_raises_then_recovery_clears() {
        // ---
        let mut ev = evaluator();

        let actions = ev.evaluate(Some(&ph_reading(1, 9.0, now())), now());
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            AlertAction::Raise(draft) => {
                assert_eq!(draft.custom_id, "alert-ph");
                assert_eq!(draft.kind, NotificationKind::Error);
                assert_eq!(draft.sensor.as_deref(), Some("ph"));
                assert!(draft.message.contains("9.0"));
            }
            other => panic!("expected raise, got {other:?}"),
        }

        let actions = ev.evaluate(Some(&ph_reading(2, 7.0, now())), now());
        assert_eq!(actions, vec![AlertAction::Clear("alert-ph".to_string())]);
    }

    #[test]
    fn test_same_reading_is_evaluated_once() {
        // ---
        let mut ev = evaluator();
        let r = ph_reading(1, 9.0, now());

        assert_eq!(ev.evaluate(Some(&r), now()).len(), 1);
        assert!(ev.evaluate(Some(&r), now()).is_empty());
    }

    #[test]
    fn test_stale_reading_never_acts() {
        // ---
        let mut ev = evaluator();
        let old = now() - Duration::minutes(10);

        assert!(ev.evaluate(Some(&ph_reading(1, 9.0, old)), now()).is_empty());
        assert!(ev.evaluate(Some(&ph_reading(2, 7.0, old)), now()).is_empty());
    }

    #[test]
    fn test_stale_reading_is_still_marked_evaluated() {
        // ---
        let mut ev = evaluator();
        let r = ph_reading(1, 9.0, now() - Duration::minutes(10));

        assert!(ev.evaluate(Some(&r), now()).is_empty());
        // Even once it would be fresh relative to an earlier clock, the id is spent.
        assert!(ev
            .evaluate(Some(&r), now() - Duration::minutes(8))
            .is_empty());
    }

    #[test]
    fn test_absent_reading_is_noop() {
        // ---
        assert!(evaluator().evaluate(None, now()).is_empty());
    }

    #[test]
    fn test_only_present_metrics_are_evaluated() {
        // ---
        let mut ev = evaluator();
        let r = NormalizedReading {
            id: 5,
            timestamp: now(),
            values: MetricValues {
                temperature: Some(38.0),
                humidity: Some(60.0),
                solar_radiation: Some(50.0),
                ..Default::default()
            },
        };

        let actions = ev.evaluate(Some(&r), now());
        assert_eq!(actions.len(), 3);
        assert!(actions.contains(&AlertAction::Clear("alert-humidity".to_string())));
        let raised: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                AlertAction::Raise(d) => Some(d.custom_id.as_str()),
                AlertAction::Clear(_) => None,
            })
            .collect();
        assert_eq!(raised.len(), 2);
        assert!(raised.contains(&"alert-temperature"));
        assert!(raised.contains(&"alert-solar_radiation"));
    }

    #[test]
    fn test_boundary_values_are_in_range() {
        // ---
        let mut ev = evaluator();
        let actions = ev.evaluate(Some(&ph_reading(1, 7.5, now())), now());
        assert_eq!(actions, vec![AlertAction::Clear("alert-ph".to_string())]);
    }
}
