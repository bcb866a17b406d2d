//! Notification REST operations and the live feed.
//!
//! The feed is the union of a pull source (paginated fetch) and a push
//! source (live channel events), held as a capped newest-first window
//! plus an unread counter that tracks the server-wide unread total
//! rather than the visible window.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use client_core::error::ClientError;

use crate::http::ApiClient;
use crate::models::notification::{Notification, NotificationPage, NotificationQuery};
use crate::push::PushChannel;

pub struct NotificationsApi {
    api: Arc<ApiClient>,
}

impl NotificationsApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &NotificationQuery) -> Result<NotificationPage, ClientError> {
        self.api.get_query("/user/notifications", query).await
    }

    pub async fn mark_as_read(&self, id: &str) -> Result<(), ClientError> {
        self.api
            .patch_empty(&format!("/user/notifications/{}/read", id))
            .await
    }

    pub async fn mark_all_as_read(&self) -> Result<(), ClientError> {
        self.api.patch_empty("/user/notifications/read-all").await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.api
            .delete_empty(&format!("/user/notifications/{}", id))
            .await
    }
}

/// Client-held aggregate of the feed.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// Visible window, newest first.
    pub notifications: Vec<Notification>,
    /// Server-wide unread total, synced independently of the window.
    pub unread_count: u64,
}

impl FeedState {
    /// Applies a pushed notification: prepend, cap the window, bump
    /// the counter. A notification whose id is already present leaves
    /// both the window and the counter untouched — it was counted when
    /// it first arrived. Returns whether the event was fresh.
    fn apply_push(&mut self, notification: Notification, cap: usize) -> bool {
        if self
            .notifications
            .iter()
            .any(|held| held.id == notification.id)
        {
            return false;
        }
        self.notifications.insert(0, notification);
        self.notifications.truncate(cap);
        self.unread_count += 1;
        true
    }
}

/// Merges fetched pages and pushed events into one ordered,
/// deduplicated view with optimistic mark-read mutations.
pub struct NotificationFeed {
    api: NotificationsApi,
    state: Mutex<FeedState>,
    window_size: usize,
}

impl NotificationFeed {
    pub fn new(api: Arc<ApiClient>, window_size: usize) -> Self {
        Self {
            api: NotificationsApi::new(api),
            state: Mutex::new(FeedState::default()),
            window_size,
        }
    }

    /// Snapshot of the current window and counter.
    pub async fn state(&self) -> FeedState {
        self.state.lock().await.clone()
    }

    /// Replaces the window with a freshly fetched page and syncs the
    /// counter from the server-reported unread total.
    ///
    /// The feed lock is held across the fetch, so a push arriving
    /// while the load is in flight lands after the replacement instead
    /// of being clobbered by it. A failed fetch leaves the held window
    /// untouched.
    pub async fn load(&self, page: u32, limit: u32) -> Result<FeedState, ClientError> {
        let mut state = self.state.lock().await;
        let fetched = self
            .api
            .list(&NotificationQuery {
                page: Some(page),
                limit: Some(limit),
                ..Default::default()
            })
            .await?;

        state.notifications = fetched.notifications;
        state.unread_count = fetched.unread_count;
        Ok(state.clone())
    }

    /// Handles a live event from the push channel.
    pub async fn on_push(&self, notification: Notification) {
        let mut state = self.state.lock().await;
        let id = notification.id.clone();
        if state.apply_push(notification, self.window_size) {
            tracing::debug!(id = %id, unread = state.unread_count, "notification received");
        }
    }

    /// Flips the local flag and counter first, then confirms with the
    /// backend. On rejection the change is undone by inverse update,
    /// so pushes that landed in between keep their count.
    pub async fn mark_as_read(&self, id: &str) -> Result<(), ClientError> {
        let flipped = {
            let mut state = self.state.lock().await;
            match state
                .notifications
                .iter_mut()
                .find(|held| held.id == id && !held.read)
            {
                Some(held) => {
                    held.read = true;
                    state.unread_count = state.unread_count.saturating_sub(1);
                    true
                }
                None => false,
            }
        };

        match self.api.mark_as_read(id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if flipped {
                    let mut state = self.state.lock().await;
                    if let Some(held) = state.notifications.iter_mut().find(|held| held.id == id) {
                        held.read = false;
                    }
                    state.unread_count += 1;
                    tracing::warn!(id, error = %err, "mark-as-read rolled back");
                }
                Err(err)
            }
        }
    }

    /// Marks the whole window read and zeroes the counter, then
    /// confirms with the backend. On failure the flags stay read (the
    /// operation is idempotent server-side) and the counter's
    /// authoritative value comes back with the next load.
    pub async fn mark_all_as_read(&self) -> Result<(), ClientError> {
        {
            let mut state = self.state.lock().await;
            for held in state.notifications.iter_mut() {
                held.read = true;
            }
            state.unread_count = 0;
        }

        self.api.mark_all_as_read().await
    }

    /// Deletes server-side first; the entry leaves the window only
    /// once the server confirms.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete(id).await?;

        let mut state = self.state.lock().await;
        if let Some(pos) = state.notifications.iter().position(|held| held.id == id) {
            let removed = state.notifications.remove(pos);
            if !removed.read {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Forwards live events from the channel into the feed until the
    /// channel closes.
    pub fn listen(self: &Arc<Self>, channel: &dyn PushChannel) -> JoinHandle<()> {
        let mut events = channel.subscribe();
        let feed = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(notification) => feed.on_push(notification).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "notification events dropped, feed may be stale");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
