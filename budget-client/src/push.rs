//! Push-channel abstraction for live notification delivery.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;

use client_core::error::ClientError;

use crate::models::notification::Notification;

/// Persistent, authenticated event channel delivering notifications
/// pushed by the server.
///
/// The transport itself is owned by the embedding application; the SDK
/// drives the lifecycle (connect with the current access token on
/// sign-in, disconnect on sign-out) and consumes the event stream.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Opens the channel, presenting the access token for
    /// authentication. Connecting while already connected is a no-op.
    async fn connect(&self, access_token: &str) -> Result<(), ClientError>;

    /// Closes the channel. Safe to call when not connected.
    async fn disconnect(&self);

    /// Subscribes to `notification` events. Every subscriber receives
    /// every event delivered while the channel is connected.
    fn subscribe(&self) -> broadcast::Receiver<Notification>;
}

/// Channel adapter for transports that hand decoded notification
/// events into the process. Doubles as the channel used in tests.
pub struct LocalPushChannel {
    sender: broadcast::Sender<Notification>,
    connected: Mutex<Option<String>>,
}

impl LocalPushChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            connected: Mutex::new(None),
        }
    }

    /// Token presented on the last connect, if the channel is open.
    pub fn connected_token(&self) -> Option<String> {
        self.connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivers an event to all current subscribers. Events published
    /// while the channel is closed are dropped.
    pub fn publish(&self, notification: Notification) {
        if self.connected_token().is_none() {
            tracing::debug!(id = %notification.id, "dropping event published while disconnected");
            return;
        }
        // send only errors when there are no subscribers; nothing to do then
        let _ = self.sender.send(notification);
    }
}

#[async_trait]
impl PushChannel for LocalPushChannel {
    async fn connect(&self, access_token: &str) -> Result<(), ClientError> {
        let mut connected = self
            .connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if connected.is_none() {
            tracing::info!("push channel connected");
        }
        *connected = Some(access_token.to_string());
        Ok(())
    }

    async fn disconnect(&self) {
        let mut connected = self
            .connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if connected.take().is_some() {
            tracing::info!("push channel disconnected");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}
