//! Normalized readings → chart points.
//!
//! Input must already be sorted ascending by timestamp. Labels and bucket
//! keys are computed in the caller's time zone.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChartPoint, MetricValues, NormalizedReading};
use crate::thresholds::Metric;

// ---

/// Resolution of the chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every reading, labelled `HH:MM`.
    Detail,
    /// First reading per hour, plus the newest reading.
    Hourly,
    /// Per-day averages, labelled `DD/MM`.
    Daily,
}

/// Build the chart series for `readings` in `mode`.
pub fn aggregate<Tz>(readings: &[NormalizedReading], mode: Mode, tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // ---
    let points = match mode {
        Mode::Detail => readings.iter().map(|r| time_point(r, tz)).collect(),
        Mode::Hourly => hourly(readings, tz),
        Mode::Daily => daily(readings, tz),
    };
    tracing::trace!(
        "Aggregated {} readings into {} points ({:?})",
        readings.len(),
        points.len(),
        mode
    );
    points
}

fn time_point<Tz>(reading: &NormalizedReading, tz: &Tz) -> ChartPoint
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ChartPoint {
        id: Some(reading.id),
        name: reading.timestamp.with_timezone(tz).format("%H:%M").to_string(),
        timestamp: reading.timestamp,
        values: reading.values,
    }
}

fn hourly<Tz>(readings: &[NormalizedReading], tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // ---
    let hour_key = |r: &NormalizedReading| {
        let local = r.timestamp.with_timezone(tz);
        (local.date_naive(), local.hour())
    };

    let mut representatives: HashMap<(NaiveDate, u32), i64> = HashMap::new();
    let mut points = Vec::new();

    for reading in readings {
        if let Entry::Vacant(slot) = representatives.entry(hour_key(reading)) {
            slot.insert(reading.id);
            points.push(time_point(reading, tz));
        }
    }

    // Keep the live value visible even mid-hour.
    if let Some(last) = readings.last() {
        if representatives.get(&hour_key(last)) != Some(&last.id) {
            points.push(time_point(last, tz));
        }
    }

    points
}

/// Running per-metric sums for one calendar day.
struct DayBucket {
    first_seen: DateTime<Utc>,
    sums: [f64; Metric::ALL.len()],
    counts: [u32; Metric::ALL.len()],
}

impl DayBucket {
    fn new(first_seen: DateTime<Utc>) -> Self {
        Self {
            first_seen,
            sums: [0.0; Metric::ALL.len()],
            counts: [0; Metric::ALL.len()],
        }
    }

    fn add(&mut self, values: &MetricValues) {
        for (i, metric) in Metric::ALL.iter().enumerate() {
            if let Some(v) = values.get(*metric) {
                self.sums[i] += v;
                self.counts[i] += 1;
            }
        }
    }

    fn means(&self) -> MetricValues {
        let mut values = MetricValues::default();
        for (i, metric) in Metric::ALL.iter().enumerate() {
            let mean = (self.counts[i] > 0)
                .then(|| metric.round_display(self.sums[i] / f64::from(self.counts[i])));
            values.set(*metric, mean);
        }
        values
    }
}

fn daily<Tz>(readings: &[NormalizedReading], tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // ---
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    let mut days: Vec<(NaiveDate, DayBucket)> = Vec::new();

    for reading in readings {
        let day = reading.timestamp.with_timezone(tz).date_naive();
        let slot = *index.entry(day).or_insert_with(|| {
            days.push((day, DayBucket::new(reading.timestamp)));
            days.len() - 1
        });
        days[slot].1.add(&reading.values);
    }

    let mut points: Vec<ChartPoint> = days
        .into_iter()
        .map(|(day, bucket)| ChartPoint {
            id: None,
            name: day.format("%d/%m").to_string(),
            timestamp: bucket.first_seen,
            values: bucket.means(),
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}
