//! Error taxonomy for the dashboard data pipeline.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by the fetch/normalize/aggregate/alert pipeline.
///
/// Backend failures (`Fetch`) are logged and swallowed at their call sites;
/// the remaining variants are caller errors and fail fast.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Backend read or write failed.
    #[error("backend request failed: {0}")]
    Fetch(#[from] sqlx::Error),

    /// Unrecognized time-range token.
    #[error("invalid time range '{0}'")]
    InvalidRange(String),

    /// `day` and `month` ranges need a reference date.
    #[error("time range '{0}' requires a reference date")]
    MissingReferenceDate(String),

    /// Local midnight does not exist on this date (DST gap).
    #[error("local midnight does not exist on {0}")]
    NonexistentLocalTime(NaiveDate),

    /// The simulator found no sensor row to attach readings to.
    #[error("no sensor registered")]
    MissingSensor,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
