//! Symbolic time ranges and the query windows they resolve to.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::Mode;
use crate::error::{PipelineError, Result};

// ---

/// Time range selectable on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeToken {
    #[serde(rename = "24h")]
    Last24h,
    #[serde(rename = "7d")]
    Last7d,
    #[serde(rename = "30d")]
    Last30d,
    #[serde(rename = "day")]
    SingleDay,
    #[serde(rename = "month")]
    SingleMonth,
}

impl RangeToken {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeToken::Last24h => "24h",
            RangeToken::Last7d => "7d",
            RangeToken::Last30d => "30d",
            RangeToken::SingleDay => "day",
            RangeToken::SingleMonth => "month",
        }
    }

    /// Look-back for relative ranges.
    fn hours_back(self) -> Option<i64> {
        match self {
            RangeToken::Last24h => Some(24),
            RangeToken::Last7d => Some(168),
            RangeToken::Last30d => Some(720),
            RangeToken::SingleDay | RangeToken::SingleMonth => None,
        }
    }

    /// Aggregation used when the detail view is off.
    pub fn default_mode(self) -> Mode {
        match self {
            RangeToken::Last24h | RangeToken::SingleDay => Mode::Hourly,
            RangeToken::Last7d | RangeToken::Last30d | RangeToken::SingleMonth => Mode::Daily,
        }
    }
}

impl FromStr for RangeToken {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "24h" | "last-24h" => Ok(RangeToken::Last24h),
            "7d" | "last-7d" => Ok(RangeToken::Last7d),
            "30d" | "last-30d" => Ok(RangeToken::Last30d),
            "day" | "single-day" | "custom" => Ok(RangeToken::SingleDay),
            "month" | "single-month" => Ok(RangeToken::SingleMonth),
            other => Err(PipelineError::InvalidRange(other.to_string())),
        }
    }
}

impl std::fmt::Display for RangeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query window `[from, to)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Resolve `token` to a concrete window.
///
/// Calendar ranges are computed in the time zone of `now`; `reference` is
/// required for `day` and `month` and ignored otherwise.
pub fn resolve<Tz: TimeZone>(
    token: RangeToken,
    reference: Option<NaiveDate>,
    now: &DateTime<Tz>,
) -> Result<TimeWindow> {
    // ---
    if let Some(hours) = token.hours_back() {
        let to = now.with_timezone(&Utc);
        return Ok(TimeWindow {
            from: to - Duration::hours(hours),
            to,
        });
    }

    let date = reference.ok_or_else(|| PipelineError::MissingReferenceDate(token.to_string()))?;
    let tz = now.timezone();

    let (first, last) = match token {
        RangeToken::SingleMonth => month_bounds(date),
        _ => (date, date),
    };

    Ok(TimeWindow {
        from: local_instant(&tz, first, start_of_day(first))?,
        to: local_instant(&tz, last, end_of_day(last))?,
    })
}

/// `true` when a `day` selection looks at a date other than today.
///
/// Alerts are only evaluated for live data, never for history.
pub fn is_history<Tz: TimeZone>(
    token: RangeToken,
    reference: Option<NaiveDate>,
    now: &DateTime<Tz>,
) -> bool {
    token == RangeToken::SingleDay && reference.is_some_and(|d| d != now.date_naive())
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// First and last calendar day of `date`'s month.
fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    // ---
    let first = date.with_day(1).unwrap_or(date);
    let next_month = first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(first);
    let last = next_month.pred_opt().unwrap_or(first);
    (first, last)
}

fn local_instant<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    local: NaiveDateTime,
) -> Result<DateTime<Utc>> {
    // ---
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(PipelineError::NonexistentLocalTime(date))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{FixedOffset, Timelike};

    fn mexico_city() -> FixedOffset {
        FixedOffset::west_opt(6 * 3600).unwrap()
    }

    #[test]
    fn test_relative_ranges() {
        // ---
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        for (token, hours) in [
            (RangeToken::Last24h, 24),
            (RangeToken::Last7d, 168),
            (RangeToken::Last30d, 720),
        ] {
            let w = resolve(token, None, &now).unwrap();
            assert_eq!(w.to, now);
            assert_eq!(w.to - w.from, Duration::hours(hours));
        }
    }

    #[test]
    fn test_single_day_stays_inside_local_day() {
        // ---
        let tz = mexico_city();
        let now = tz.with_ymd_and_hms(2025, 6, 20, 9, 30, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let w = resolve(RangeToken::SingleDay, Some(day), &now).unwrap();
        let from = w.from.with_timezone(&tz);
        let to = w.to.with_timezone(&tz);

        assert_eq!(from.date_naive(), day);
        assert_eq!(to.date_naive(), day);
        assert_eq!((from.hour(), from.minute(), from.second()), (0, 0, 0));
        assert_eq!((to.hour(), to.minute(), to.second()), (23, 59, 59));
        assert_eq!(w.to - w.from, Duration::hours(24) - Duration::milliseconds(1));
    }

    #[test]
    fn test_single_month_covers_whole_month() {
        // ---
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let ref_date = NaiveDate::from_ymd_opt(2024, 2, 17).unwrap();

        let w = resolve(RangeToken::SingleMonth, Some(ref_date), &now).unwrap();
        assert_eq!(w.from, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(
            w.to,
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_december_month_rolls_over_year() {
        // ---
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        let ref_date = NaiveDate::from_ymd_opt(2024, 12, 3).unwrap();

        let w = resolve(RangeToken::SingleMonth, Some(ref_date), &now).unwrap();
        assert_eq!(w.to.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_calendar_ranges_need_a_date() {
        // ---
        let now = Utc::now();
        assert!(matches!(
            resolve(RangeToken::SingleDay, None, &now),
            Err(PipelineError::MissingReferenceDate(_))
        ));
    }

    #[test]
    fn test_token_parsing() {
        // ---
        assert_eq!("24h".parse::<RangeToken>().unwrap(), RangeToken::Last24h);
        assert_eq!("last-7d".parse::<RangeToken>().unwrap(), RangeToken::Last7d);
        assert_eq!("custom".parse::<RangeToken>().unwrap(), RangeToken::SingleDay);
        assert_eq!("single-month".parse::<RangeToken>().unwrap(), RangeToken::SingleMonth);
        assert!(matches!(
            "fortnight".parse::<RangeToken>(),
            Err(PipelineError::InvalidRange(t)) if t == "fortnight"
        ));
    }

    #[test]
    fn test_history_detection() {
        // ---
        let now = Utc.with_ymd_and_hms(2025, 6, 20, 9, 0, 0).unwrap();
        let today = now.date_naive();
        let yesterday = today.pred_opt().unwrap();

        assert!(!is_history(RangeToken::SingleDay, Some(today), &now));
        assert!(is_history(RangeToken::SingleDay, Some(yesterday), &now));
        assert!(!is_history(RangeToken::Last24h, Some(yesterday), &now));
        assert!(!is_history(RangeToken::SingleMonth, Some(yesterday), &now));
    }

    #[test]
    fn test_default_modes() {
        // ---
        assert_eq!(RangeToken::Last24h.default_mode(), Mode::Hourly);
        assert_eq!(RangeToken::SingleDay.default_mode(), Mode::Hourly);
        assert_eq!(RangeToken::Last7d.default_mode(), Mode::Daily);
        assert_eq!(RangeToken::SingleMonth.default_mode(), Mode::Daily);
    }
}
