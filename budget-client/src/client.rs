//! Top-level assembly of the SDK.

use std::sync::Arc;

use client_core::error::ClientError;
use client_core::storage::KeyValueStore;

use crate::config::Settings;
use crate::http::ApiClient;
use crate::push::PushChannel;
use crate::services::{AuthService, BudgetsApi, NotificationFeed};
use crate::session::SessionStore;

/// Everything a UI consumer needs: auth lifecycle, the generic
/// authenticated request surface, the notification feed and the
/// budget operations, all sharing one session.
pub struct BudgetClient {
    api: Arc<ApiClient>,
    push: Arc<dyn PushChannel>,
    pub auth: AuthService,
    pub notifications: Arc<NotificationFeed>,
    pub budgets: BudgetsApi,
}

impl BudgetClient {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn KeyValueStore>,
        push: Arc<dyn PushChannel>,
    ) -> Result<Self, ClientError> {
        let session = SessionStore::new(store);
        let api = Arc::new(ApiClient::new(&settings.api, session)?);
        let auth = AuthService::new(Arc::clone(&api), Arc::clone(&push));
        let notifications = Arc::new(NotificationFeed::new(
            Arc::clone(&api),
            settings.notifications.window_size,
        ));
        let budgets = BudgetsApi::new(Arc::clone(&api));

        Ok(Self {
            api,
            push,
            auth,
            notifications,
            budgets,
        })
    }

    /// Generic authenticated request surface.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        self.api.session()
    }

    /// Starts forwarding push events into the notification feed.
    pub fn listen_for_notifications(&self) -> tokio::task::JoinHandle<()> {
        self.notifications.listen(self.push.as_ref())
    }
}
