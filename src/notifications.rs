//! Registry of active notifications.
//!
//! The store is the optimistic source of truth: every mutation is applied
//! locally first and then mirrored to the backend. A failed mirror is logged
//! and the entry is left [`SyncStatus::Pending`]; nothing is rolled back.
//! External changes arrive through [`NotificationStore::reload`], which
//! replaces local state wholesale (last writer wins).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::alerts::AlertAction;
use crate::backend::NotificationBackend;
use crate::models::{Notification, NotificationDraft, SyncStatus};

// ---

/// Store handle shared between the monitor, simulator, feed and routes.
pub type SharedNotifications = Arc<Mutex<NotificationStore>>;

pub struct NotificationStore {
    backend: Arc<dyn NotificationBackend>,
    entries: Vec<Notification>,
}

impl NotificationStore {
    // ---
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self {
            backend,
            entries: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedNotifications {
        Arc::new(Mutex::new(self))
    }

    /// All entries, most recent first.
    pub fn notifications(&self) -> &[Notification] {
        &self.entries
    }

    /// Entries that should still be shown as toasts.
    pub fn toasts(&self) -> Vec<Notification> {
        self.entries
            .iter()
            .filter(|n| n.show_toast)
            .cloned()
            .collect()
    }

    /// Insert a notification, or overwrite the one with the same `custom_id`
    /// in place.
    pub async fn upsert(
        &mut self,
        draft: NotificationDraft,
        now: DateTime<Utc>,
    ) -> &[Notification] {
        // ---
        let notification = draft.into_notification(now);
        let id = notification.custom_id.clone();

        match self.position(&id) {
            Some(i) => self.entries[i] = notification.clone(),
            None => self.entries.insert(0, notification.clone()),
        }

        match self.backend.upsert_notification(&notification).await {
            Ok(()) => self.mark_confirmed(&id),
            Err(e) => tracing::error!("Failed to save notification '{}': {}", id, e),
        }
        &self.entries
    }

    /// Hide the toast for `custom_id`; the entry stays in the list.
    pub async fn dismiss_toast(&mut self, custom_id: &str) -> &[Notification] {
        // ---
        let Some(i) = self.position(custom_id) else {
            return &self.entries;
        };
        self.entries[i].show_toast = false;
        self.entries[i].sync = SyncStatus::Pending;

        match self.backend.hide_toast(custom_id).await {
            Ok(()) => self.mark_confirmed(custom_id),
            Err(e) => tracing::error!("Failed to dismiss notification '{}': {}", custom_id, e),
        }
        &self.entries
    }

    /// Remove `custom_id` from the registry.
    ///
    /// The backend delete is issued even when the id is not held locally, so
    /// a row this store never loaded still goes away.
    pub async fn delete(&mut self, custom_id: &str) -> &[Notification] {
        // ---
        if let Some(i) = self.position(custom_id) {
            self.entries.remove(i);
        }

        if let Err(e) = self.backend.delete_notification(custom_id).await {
            tracing::error!("Failed to delete notification '{}': {}", custom_id, e);
        }
        &self.entries
    }

    /// Re-derive the whole registry from the backend.
    pub async fn reload(&mut self) -> &[Notification] {
        // ---
        match self.backend.load_notifications().await {
            Ok(entries) => {
                tracing::debug!("Reloaded {} notifications", entries.len());
                self.entries = entries;
            }
            Err(e) => tracing::error!("Failed to load notifications: {}", e),
        }
        &self.entries
    }

    /// Apply the output of the alert evaluator.
    pub async fn apply(&mut self, actions: Vec<AlertAction>, now: DateTime<Utc>) {
        // ---
        for action in actions {
            match action {
                AlertAction::Raise(draft) => {
                    self.upsert(draft, now).await;
                }
                AlertAction::Clear(id) => {
                    self.delete(&id).await;
                }
            }
        }
    }

    fn position(&self, custom_id: &str) -> Option<usize> {
        self.entries.iter().position(|n| n.custom_id == custom_id)
    }

    fn mark_confirmed(&mut self, custom_id: &str) {
        if let Some(i) = self.position(custom_id) {
            self.entries[i].sync = SyncStatus::Confirmed;
        }
    }
}
