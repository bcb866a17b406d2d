//! Process-wide holder of the authenticated principal.

use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;

use client_core::error::ClientError;
use client_core::storage::KeyValueStore;

use crate::models::api::AuthTokens;
use crate::models::user::User;

const TOKENS_KEY: &str = "auth_tokens";
const USER_KEY: &str = "auth_user";

/// The authenticated principal: token pair plus identity record.
#[derive(Debug, Clone)]
pub struct Session {
    pub tokens: AuthTokens,
    pub user: User,
}

#[derive(Default)]
struct SessionState {
    tokens: Option<AuthTokens>,
    user: Option<User>,
}

/// Single source of truth for "is there a usable session".
///
/// Reads come from an in-memory snapshot, so they are synchronous and
/// always observe a consistent token pair; writes replace the pair as
/// one assignment under the write guard and then persist through the
/// key-value boundary.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Builds the store, picking up a previously persisted session.
    ///
    /// Entries that fail to deserialize are discarded rather than
    /// surfaced: a corrupt entry degrades to "signed out".
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let tokens = read_entry::<AuthTokens>(store.as_ref(), TOKENS_KEY);
        let user = read_entry::<User>(store.as_ref(), USER_KEY);
        Self {
            state: Arc::new(RwLock::new(SessionState { tokens, user })),
            store,
        }
    }

    pub fn tokens(&self) -> Option<AuthTokens> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.tokens.clone()
    }

    pub fn user(&self) -> Option<User> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.user.clone()
    }

    /// Both halves of the session read under one guard.
    pub fn session(&self) -> Option<Session> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match (&state.tokens, &state.user) {
            (Some(tokens), Some(user)) => Some(Session {
                tokens: tokens.clone(),
                user: user.clone(),
            }),
            _ => None,
        }
    }

    /// Overwrites the token pair. The in-memory snapshot is updated
    /// first, so a persistence failure never leaves readers with a
    /// mixed pair.
    pub fn set_tokens(&self, tokens: AuthTokens) -> Result<(), ClientError> {
        let encoded = serde_json::to_string(&tokens)?;
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.tokens = Some(tokens);
        }
        self.store.set(TOKENS_KEY, &encoded)
    }

    pub fn set_user(&self, user: User) -> Result<(), ClientError> {
        let encoded = serde_json::to_string(&user)?;
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.user = Some(user);
        }
        self.store.set(USER_KEY, &encoded)
    }

    /// Removes tokens and user as a single observable operation. Used
    /// on sign-out and on irrecoverable refresh failure; persistence
    /// failures are logged, the in-memory session is gone regardless.
    pub fn clear(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.tokens = None;
            state.user = None;
        }
        for key in [TOKENS_KEY, USER_KEY] {
            if let Err(err) = self.store.remove(key) {
                tracing::warn!(key, error = %err, "failed to remove persisted session entry");
            }
        }
    }
}

fn read_entry<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding malformed session entry");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read persisted session entry");
            None
        }
    }
}
