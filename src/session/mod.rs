// ABOUTME: Session module root: storage contract, auth state owner and token refresh
// ABOUTME: Re-exports the types the pipeline and background router depend on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

/// Key-value storage areas with change notifications
pub mod store;

/// In-memory auth state mirrored to the store
pub mod manager;

/// Single-flight token refresh
pub mod refresh;

pub use manager::AuthStateManager;
pub use refresh::{TokenRefreshCoordinator, TokenStatus};
pub use store::{JsonStore, KeyValueStore, StorageArea, StorageChange, StoreError};
