// ABOUTME: Key-value store abstraction for session data with change notifications
// ABOUTME: JsonStore backs it with an in-memory map, optionally persisted to a JSON file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! # Session Storage
//!
//! Two storage areas exist: `Local` survives restarts and holds `token` and
//! `user`; `Session` is ephemeral and holds `session` and `jwtToken` relayed
//! from the web app. Every mutation emits one [`StorageChange`] per key whose
//! value actually changed.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::constants::bus::EVENT_CHANNEL_CAPACITY;

/// Which storage area a value lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// Survives restarts
    Local,
    /// Cleared with the process
    Session,
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// One key changed in a storage area
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    /// Area the key lives in
    pub area: StorageArea,
    /// Changed key
    pub key: String,
    /// Value before the change
    pub old_value: Option<Value>,
    /// Value after the change, `None` when removed
    pub new_value: Option<Value>,
}

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("storage I/O error at {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Backing file is not a JSON object, or a value failed to serialize
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Asynchronous key-value storage area
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Area this store represents
    fn area(&self) -> StorageArea;

    /// Values for the requested keys; missing keys are absent from the map
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    /// Write every entry
    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError>;

    /// Remove the given keys
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Remove everything
    async fn clear(&self) -> Result<(), StoreError>;

    /// Change notifications for mutations made after subscribing
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Map-backed store, optionally mirrored to a JSON file
pub struct JsonStore {
    area: StorageArea,
    path: Option<PathBuf>,
    data: RwLock<Map<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonStore {
    /// Store that never touches disk
    #[must_use]
    pub fn in_memory(area: StorageArea) -> Self {
        let (changes, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            area,
            path: None,
            data: RwLock::new(Map::new()),
            changes,
        }
    }

    /// Store persisted at `path`, loading existing contents if the file exists
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a JSON object
    pub async fn open(area: StorageArea, path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Map::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(%area, path = %path.display(), keys = data.len(), "Opened session store");

        let (changes, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            area,
            path: Some(path),
            data: RwLock::new(data),
            changes,
        })
    }

    /// Backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, data: &Map<String, Value>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }

    fn notify(&self, changes: Vec<StorageChange>) {
        for change in changes {
            // No subscribers is normal
            let _ = self.changes.send(change);
        }
    }

    fn change(&self, key: &str, old_value: Option<Value>, new_value: Option<Value>) -> StorageChange {
        StorageChange {
            area: self.area,
            key: key.to_owned(),
            old_value,
            new_value,
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonStore {
    fn area(&self) -> StorageArea {
        self.area
    }

    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let data = self.data.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|value| ((*key).to_owned(), value.clone())))
            .collect())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        let mut changes = Vec::new();
        for (key, value) in entries {
            if data.get(&key) == Some(&value) {
                continue;
            }
            let old = data.insert(key.clone(), value.clone());
            changes.push(self.change(&key, old, Some(value)));
        }
        if changes.is_empty() {
            return Ok(());
        }
        self.persist(&data).await?;
        drop(data);
        self.notify(changes);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        let changes: Vec<_> = keys
            .iter()
            .filter_map(|key| data.remove(*key).map(|old| self.change(key, Some(old), None)))
            .collect();
        if changes.is_empty() {
            return Ok(());
        }
        self.persist(&data).await?;
        drop(data);
        self.notify(changes);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if data.is_empty() {
            return Ok(());
        }
        let changes: Vec<_> = std::mem::take(&mut *data)
            .into_iter()
            .map(|(key, old)| self.change(&key, Some(old), None))
            .collect();
        if let Err(e) = self.persist(&data).await {
            warn!(area = %self.area, error = %e, "Failed to persist cleared store");
            return Err(e);
        }
        drop(data);
        self.notify(changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
