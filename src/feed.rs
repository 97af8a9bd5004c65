//! Change feed over PostgreSQL `LISTEN/NOTIFY`.
//!
//! Triggers installed by [`crate::schema`] publish one notification per row
//! change. Payloads are only used for logging: any readings event refreshes
//! the monitor and any notifications event reloads the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::monitor::Monitor;
use crate::notifications::SharedNotifications;

// ---

pub const READINGS_CHANNEL: &str = "sensor_readings_changes";
pub const NOTIFICATIONS_CHANNEL: &str = "notifications_changes";

/// What a feed event asks the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    ReadingsChanged,
    NotificationsChanged,
}

impl FeedEvent {
    pub fn from_channel(channel: &str) -> Option<Self> {
        match channel {
            READINGS_CHANNEL => Some(FeedEvent::ReadingsChanged),
            NOTIFICATIONS_CHANNEL => Some(FeedEvent::NotificationsChanged),
            _ => None,
        }
    }
}

/// Subscribe to both channels and dispatch events until aborted.
///
/// Connection loss is logged; the listener reconnects on the next receive.
pub async fn spawn(
    pool: &PgPool,
    monitor: Arc<Monitor<Local>>,
    notifications: SharedNotifications,
) -> anyhow::Result<JoinHandle<()>> {
    // ---
    let mut listener = PgListener::connect_with(pool).await?;
    listener
        .listen_all([READINGS_CHANNEL, NOTIFICATIONS_CHANNEL])
        .await?;
    tracing::info!(
        "Subscribed to change feed ({}, {})",
        READINGS_CHANNEL,
        NOTIFICATIONS_CHANNEL
    );

    Ok(tokio::spawn(async move {
        loop {
            let message = match listener.recv().await {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!("Change feed error: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            tracing::debug!(
                "Feed event on {}: {}",
                message.channel(),
                message.payload()
            );
            match FeedEvent::from_channel(message.channel()) {
                Some(FeedEvent::ReadingsChanged) => {
                    // Refreshes may overlap; the monitor's sequencer orders them.
                    let monitor = Arc::clone(&monitor);
                    tokio::spawn(async move { monitor.refresh().await });
                }
                Some(FeedEvent::NotificationsChanged) => {
                    notifications.lock().await.reload().await;
                }
                None => tracing::warn!("Ignoring event on unknown channel {}", message.channel()),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_channel_mapping() {
        // ---
        assert_eq!(
            FeedEvent::from_channel(READINGS_CHANNEL),
            Some(FeedEvent::ReadingsChanged)
        );
        assert_eq!(
            FeedEvent::from_channel(NOTIFICATIONS_CHANNEL),
            Some(FeedEvent::NotificationsChanged)
        );
        assert_eq!(FeedEvent::from_channel("sensors_changes"), None);
    }
}
