//! Application entry point for the `agro-sensorflow` dashboard service.
//!
//! This binary orchestrates the full startup sequence, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the schema and change-feed triggers if they do not exist
//! - Loading notifications and the first chart
//! - Starting the poll timer and the change-feed subscriber
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `HTTP_PORT` (optional) – API port (default: 8080)
//! - `POLL_INTERVAL_SECS`, `SIMULATION_INTERVAL_SECS`, `ALERT_STALENESS_SECS`
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Everything runs on a single-threaded runtime: refreshes, feed events and
//! requests interleave only at await points.
use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use chrono::Local;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use agro_sensorflow::backend::PgBackend;
use agro_sensorflow::monitor::Monitor;
use agro_sensorflow::notifications::NotificationStore;
use agro_sensorflow::routes::{self, AppState};
use agro_sensorflow::simulation::Simulator;
use agro_sensorflow::{config, feed, schema};

// ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database: {}", cfg.masked_db_url());

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to database '{}': {}",
                cfg.masked_db_url(),
                e
            )
        })?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    let backend = Arc::new(PgBackend::new(pool.clone()));
    let notifications = NotificationStore::new(backend.clone()).into_shared();
    notifications.lock().await.reload().await;

    let staleness = chrono::Duration::from_std(cfg.alert_staleness)?;
    let monitor = Arc::new(Monitor::new(
        backend.clone(),
        notifications.clone(),
        Local,
        staleness,
    ));
    let simulator = Arc::new(Simulator::new(
        backend.clone(),
        notifications.clone(),
        cfg.simulation_interval,
    ));

    // The first poller tick fires immediately and loads the initial chart.
    let poller = monitor.spawn_poller(cfg.poll_interval);
    let feed = feed::spawn(&pool, monitor.clone(), notifications.clone()).await?;

    let app: Router = routes::router(AppState {
        source: backend,
        monitor,
        notifications,
        simulator: simulator.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down background tasks");
    simulator.set_enabled(false).await;
    poller.abort();
    feed.abort();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, falling back to `AXUM_LOG_LEVEL`
///
/// Called once at startup before any logging macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
