// ABOUTME: Owner of the in-memory auth state, mirrored to the persistent session store
// ABOUTME: Reloads itself when another context changes the token or user keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{broadcast::error::RecvError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::store::{KeyValueStore, StoreError};
use crate::constants::storage_keys;
use crate::models::{AuthState, UserRef};

/// Single owner of the background process's [`AuthState`].
///
/// Mutations update memory first and then mirror to the store, so readers in
/// this process never wait on the storage round trip.
pub struct AuthStateManager {
    state: RwLock<AuthState>,
    store: Arc<dyn KeyValueStore>,
}

impl AuthStateManager {
    /// Manager starting logged out; call [`Self::load`] to pick up a stored session
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: RwLock::new(AuthState::logged_out()),
            store,
        }
    }

    /// Rebuild the in-memory state from the store
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    pub async fn load(&self) -> Result<AuthState, StoreError> {
        let stored = read_stored_state(self.store.as_ref()).await?;
        *self.state.write().await = stored.clone();
        debug!(logged_in = stored.is_logged_in(), "Loaded auth state from store");
        Ok(stored)
    }

    /// Current in-memory state
    pub async fn current(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// Current state, falling back to the store when memory says logged out.
    ///
    /// Covers a process that restarted since the last login.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    pub async fn current_or_load(&self) -> Result<AuthState, StoreError> {
        let current = self.current().await;
        if current.is_logged_in() {
            return Ok(current);
        }
        self.load().await
    }

    /// Replace the state and mirror it to the store
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails; memory is already updated
    pub async fn set(&self, state: AuthState) -> Result<(), StoreError> {
        *self.state.write().await = state.clone();
        self.persist(&state).await
    }

    /// Swap the token, keeping the current user
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails
    pub async fn set_token(&self, token: &str) -> Result<AuthState, StoreError> {
        let updated = {
            let mut state = self.state.write().await;
            *state = state.with_token(token);
            state.clone()
        };
        self.persist(&updated).await?;
        Ok(updated)
    }

    /// Log out locally and remove the stored session
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.set(AuthState::logged_out()).await
    }

    async fn persist(&self, state: &AuthState) -> Result<(), StoreError> {
        match (state.token(), state.user()) {
            (Some(token), Some(user)) => {
                let mut entries = Map::new();
                entries.insert(storage_keys::TOKEN.to_owned(), Value::from(token));
                entries.insert(storage_keys::USER.to_owned(), serde_json::to_value(user)?);
                self.store.set(entries).await
            }
            _ => {
                self.store
                    .remove(&[storage_keys::TOKEN, storage_keys::USER])
                    .await
            }
        }
    }

    /// React to writes made by other contexts.
    ///
    /// Whenever `token` or `user` changes in the store, the state is reloaded;
    /// `on_change` runs only if the reloaded state differs from what this
    /// manager already held, so the manager's own writes do not echo back.
    pub fn on_external_change<F>(self: &Arc<Self>, on_change: F) -> JoinHandle<()>
    where
        F: Fn(AuthState) + Send + Sync + 'static,
    {
        let manager = Arc::clone(self);
        let mut changes = self.store.subscribe();

        tokio::spawn(async move {
            loop {
                let change = match changes.recv().await {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed storage change notifications, reloading");
                        manager.reload_and_notify(&on_change).await;
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if change.key == storage_keys::TOKEN || change.key == storage_keys::USER {
                    manager.reload_and_notify(&on_change).await;
                }
            }
            debug!("Storage change stream closed");
        })
    }

    async fn reload_and_notify<F>(&self, on_change: &F)
    where
        F: Fn(AuthState),
    {
        let before = self.current().await;
        match self.load().await {
            Ok(after) if after != before => {
                info!(logged_in = after.is_logged_in(), "Auth state changed externally");
                on_change(after);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to reload auth state after storage change"),
        }
    }
}

async fn read_stored_state(store: &dyn KeyValueStore) -> Result<AuthState, StoreError> {
    let mut values = store
        .get(&[storage_keys::TOKEN, storage_keys::USER])
        .await?;

    let token = match values.remove(storage_keys::TOKEN) {
        Some(Value::String(token)) => Some(token),
        _ => None,
    };
    let user = values
        .remove(storage_keys::USER)
        .and_then(|value| match serde_json::from_value::<UserRef>(value) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed stored user");
                None
            }
        });

    Ok(AuthState::from_parts(token, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::{JsonStore, StorageArea};
    use serde_json::json;

    fn store() -> Arc<JsonStore> {
        Arc::new(JsonStore::in_memory(StorageArea::Local))
    }

    #[tokio::test]
    async fn load_requires_token_and_user() {
        let store = store();
        let manager = AuthStateManager::new(store.clone());

        let mut entries = Map::new();
        entries.insert("token".to_owned(), json!("abc"));
        store.set(entries).await.unwrap();
        assert!(!manager.load().await.unwrap().is_logged_in());

        let mut entries = Map::new();
        entries.insert("user".to_owned(), json!({"email": "reader@example.com"}));
        store.set(entries).await.unwrap();
        let state = manager.load().await.unwrap();
        assert!(state.is_logged_in());
        assert_eq!(state.token(), Some("abc"));
    }

    #[tokio::test]
    async fn set_and_clear_mirror_to_store() {
        let store = store();
        let manager = AuthStateManager::new(store.clone());

        manager
            .set(AuthState::logged_in("tok", UserRef::with_email("a@b.c")))
            .await
            .unwrap();
        let stored = store.get(&["token", "user"]).await.unwrap();
        assert_eq!(stored["token"], "tok");
        assert_eq!(stored["user"]["email"], "a@b.c");

        manager.clear().await.unwrap();
        assert!(store.get(&["token", "user"]).await.unwrap().is_empty());
        assert_eq!(manager.current().await, AuthState::logged_out());
    }

    #[tokio::test]
    async fn set_token_keeps_user() {
        let manager = AuthStateManager::new(store());
        manager
            .set(AuthState::logged_in("old", UserRef::with_email("a@b.c")))
            .await
            .unwrap();

        let updated = manager.set_token("new").await.unwrap();
        assert_eq!(updated.token(), Some("new"));
        assert_eq!(updated.user().map(|u| u.email.as_str()), Some("a@b.c"));
    }

    #[tokio::test]
    async fn malformed_user_is_logged_out() {
        let store = store();
        let mut entries = Map::new();
        entries.insert("token".to_owned(), json!("abc"));
        entries.insert("user".to_owned(), json!("not-an-object"));
        store.set(entries).await.unwrap();

        let manager = AuthStateManager::new(store);
        assert!(!manager.load().await.unwrap().is_logged_in());
    }
}
