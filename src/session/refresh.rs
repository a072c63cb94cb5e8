// ABOUTME: Token validity checks and single-flight refresh against the auth endpoint
// ABOUTME: Concurrent callers share one in-flight refresh and observe the same outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! # Token Refresh
//!
//! A token is usable while its decoded `exp` is in the future. An expired
//! or undecodable token is refreshed before use. While a refresh is in
//! flight the coordinator is in the `Refreshing` state and holds a shared
//! handle to the pending result; every caller arriving in that state awaits
//! the same handle instead of issuing another HTTP call.
//!
//! A failed refresh clears the session and publishes `SESSION_CLEAR` once,
//! from inside the shared future, so the number of waiters does not matter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::manager::AuthStateManager;
use crate::api::SummaryApi;
use crate::bus::{CrossContextBus, ExtensionMessage};
use crate::clock::Clock;
use crate::errors::RefreshFailure;
use crate::models::{AuthState, RefreshResponse, TokenClaims};

type RefreshOutcome = Result<String, RefreshFailure>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Refresh slot: idle, or holding the one in-flight refresh
enum RefreshState {
    Idle,
    Refreshing {
        generation: u64,
        pending: PendingRefresh,
    },
}

/// Usability of the current token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// No session stored
    Missing,
    /// `exp` is in the future
    Valid,
    /// `exp` has passed or the claims could not be decoded
    Expired,
    /// A refresh is in flight
    Refreshing,
}

/// Hands out usable tokens, refreshing at most once at a time
pub struct TokenRefreshCoordinator {
    auth: Arc<AuthStateManager>,
    api: Arc<dyn SummaryApi>,
    bus: CrossContextBus,
    clock: Arc<dyn Clock>,
    state: Mutex<RefreshState>,
    next_generation: AtomicU64,
}

impl TokenRefreshCoordinator {
    /// Coordinator over the given session, API and bus
    #[must_use]
    pub fn new(
        auth: Arc<AuthStateManager>,
        api: Arc<dyn SummaryApi>,
        bus: CrossContextBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auth,
            api,
            bus,
            clock,
            state: Mutex::new(RefreshState::Idle),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Whether `token` can be sent as-is
    #[must_use]
    pub fn is_usable(&self, token: &str) -> bool {
        match TokenClaims::decode(token) {
            Ok(claims) => !claims.is_expired_at(self.clock.now_secs()),
            Err(e) => {
                debug!(error = %e, "Token claims not decodable, treating as expired");
                false
            }
        }
    }

    /// Current token status
    pub async fn status(&self) -> TokenStatus {
        if self.is_refreshing() {
            return TokenStatus::Refreshing;
        }
        match self.session().await.token() {
            None => TokenStatus::Missing,
            Some(token) if self.is_usable(token) => TokenStatus::Valid,
            Some(_) => TokenStatus::Expired,
        }
    }

    /// A token that is valid right now, refreshing first if needed
    ///
    /// # Errors
    ///
    /// `NoSession` when nobody is logged in; any other variant means a
    /// refresh was attempted, failed, and the session has been cleared
    pub async fn ensure_valid_token(&self) -> Result<String, RefreshFailure> {
        let session = self.session().await;
        let Some(token) = session.token() else {
            return Err(RefreshFailure::NoSession);
        };
        if self.is_usable(token) {
            return Ok(token.to_owned());
        }
        debug!("Session token expired");
        self.refresh(token.to_owned()).await
    }

    /// Replacement for a token the server just rejected with 401.
    ///
    /// If the stored token already differs from `rejected` and is usable,
    /// someone else refreshed in the meantime and that token is returned
    /// without another call.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_valid_token`]
    pub async fn refresh_rejected(&self, rejected: &str) -> Result<String, RefreshFailure> {
        let session = self.session().await;
        match session.token() {
            None => Err(RefreshFailure::NoSession),
            Some(current) if current != rejected && self.is_usable(current) => {
                debug!("Token already replaced since rejection");
                Ok(current.to_owned())
            }
            Some(current) => self.refresh(current.to_owned()).await,
        }
    }

    /// Refresh regardless of expiry (explicit `REFRESH_TOKEN` request)
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_valid_token`]
    pub async fn force_refresh(&self) -> Result<String, RefreshFailure> {
        let session = self.session().await;
        let Some(token) = session.token() else {
            return Err(RefreshFailure::NoSession);
        };
        self.refresh(token.to_owned()).await
    }

    async fn session(&self) -> AuthState {
        self.auth.current_or_load().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read session from store");
            AuthState::logged_out()
        })
    }

    fn is_refreshing(&self) -> bool {
        let slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*slot, RefreshState::Refreshing { .. })
    }

    /// Join the in-flight refresh or start one
    async fn refresh(&self, stale: String) -> RefreshOutcome {
        let (generation, pending) = {
            let mut slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let in_flight = match &*slot {
                RefreshState::Refreshing {
                    generation,
                    pending,
                } => Some((*generation, pending.clone())),
                RefreshState::Idle => None,
            };
            if let Some((generation, pending)) = in_flight {
                debug!(generation, "Joining in-flight token refresh");
                (generation, pending)
            } else {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let pending = run_refresh(
                    Arc::clone(&self.api),
                    Arc::clone(&self.auth),
                    self.bus.clone(),
                    stale,
                )
                .boxed()
                .shared();
                *slot = RefreshState::Refreshing {
                    generation,
                    pending: pending.clone(),
                };
                (generation, pending)
            }
        };

        let outcome = pending.await;

        let mut slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(&*slot, RefreshState::Refreshing { generation: g, .. } if *g == generation) {
            *slot = RefreshState::Idle;
        }
        drop(slot);

        outcome
    }
}

/// The one HTTP refresh call plus its side effects
async fn run_refresh(
    api: Arc<dyn SummaryApi>,
    auth: Arc<AuthStateManager>,
    bus: CrossContextBus,
    stale: String,
) -> RefreshOutcome {
    info!("Refreshing session token");

    let failure = match api.refresh_token(&stale).await {
        Ok(reply) if reply.is_success() => match reply.json::<RefreshResponse>() {
            Ok(RefreshResponse { token, .. }) if !token.is_empty() => {
                if let Err(e) = auth.set_token(&token).await {
                    warn!(error = %e, "Refreshed token could not be persisted");
                }
                bus.publish(ExtensionMessage::TokenRefreshed {
                    token: token.clone(),
                });
                info!("Session token refreshed");
                return Ok(token);
            }
            Ok(_) => RefreshFailure::InvalidResponse {
                details: "empty token".to_owned(),
            },
            Err(e) => RefreshFailure::InvalidResponse {
                details: e.to_string(),
            },
        },
        Ok(reply) if reply.status == 404 => RefreshFailure::Unsupported,
        Ok(reply) => RefreshFailure::Rejected {
            status: reply.status,
        },
        Err(e) => RefreshFailure::from(e),
    };

    warn!(error = %failure, "Token refresh failed, clearing session");
    if let Err(e) = auth.clear().await {
        warn!(error = %e, "Failed to clear stored session");
    }
    bus.publish(ExtensionMessage::SessionClear);
    Err(failure)
}
