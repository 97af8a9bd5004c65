//! Data core of the agricultural sensor dashboard.
//!
//! Raw readings flow through [`normalize`], [`range`] and [`aggregate`] into
//! chart points; the newest reading goes through [`alerts`] into the
//! [`notifications`] store. [`monitor`] ties the pipeline to the live view,
//! [`feed`] and the poll timer drive it, and [`routes`] exposes it over HTTP.

pub mod aggregate;
pub mod alerts;
pub mod backend;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod monitor;
pub mod normalize;
pub mod notifications;
pub mod range;
pub mod routes;
pub mod schema;
pub mod simulation;
pub mod thresholds;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use models::{ChartPoint, NormalizedReading, Notification, RawReading};
