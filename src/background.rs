// ABOUTME: Background process context routing extension messages to the core components
// ABOUTME: Owns the session, limiter, token coordinator, pipeline, bus and registered surfaces
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! # Background Context
//!
//! One [`BackgroundContext`] exists per background-process lifetime. It is
//! rebuilt from the persistent store on start and holds the only in-memory
//! auth state. Incoming messages from other contexts are applied here and
//! then relayed on the bus; the bus itself never decides anything.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{HttpApiClient, SummaryApi};
use crate::bus::{CrossContextBus, ExtensionMessage};
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::constants::storage_keys;
use crate::errors::{RefreshFailure, StoreError, SummarizeError};
use crate::models::{
    AuthState, LoginRequest, LoginResponse, PlanType, SummaryResult, Theme, TokenClaims, UserRef,
};
use crate::pipeline::{classify_failure, RegenerateTrigger, RequestPipeline, SelectionTrigger};
use crate::rate_limiting::RateLimiter;
use crate::session::{AuthStateManager, KeyValueStore, TokenRefreshCoordinator, TokenStatus};
use crate::surface::PageSurface;

/// Reply to a message from another context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    /// Whether the message was applied
    pub success: bool,
    /// Fresh token, for `REFRESH_TOKEN`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    /// Applied
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            token: None,
            error: None,
        }
    }

    /// Applied, with a token
    #[must_use]
    pub const fn with_token(token: String) -> Self {
        Self {
            success: true,
            token: Some(token),
            error: None,
        }
    }

    /// Not applied
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            token: None,
            error: Some(error.into()),
        }
    }
}

/// What the popup shows about the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Whether a usable session exists
    pub logged_in: bool,
    /// Signed-in account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Token usability after any refresh the check performed
    pub token_status: TokenStatus,
    /// Token expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Subscription tier, when the server reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanType>,
}

/// Background process state and message router
pub struct BackgroundContext {
    session_store: Arc<dyn KeyValueStore>,
    api: Arc<dyn SummaryApi>,
    auth: Arc<AuthStateManager>,
    tokens: Arc<TokenRefreshCoordinator>,
    bus: CrossContextBus,
    pipeline: RequestPipeline,
    surfaces: RwLock<Vec<Arc<dyn PageSurface>>>,
}

impl BackgroundContext {
    /// Wire every component together
    #[must_use]
    pub fn new(
        api: Arc<dyn SummaryApi>,
        local_store: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn KeyValueStore>,
        limiter: RateLimiter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let bus = CrossContextBus::new();
        let auth = Arc::new(AuthStateManager::new(local_store));
        let tokens = Arc::new(TokenRefreshCoordinator::new(
            Arc::clone(&auth),
            Arc::clone(&api),
            bus.clone(),
            clock,
        ));
        let pipeline = RequestPipeline::new(
            Arc::new(limiter),
            Arc::clone(&tokens),
            Arc::clone(&api),
            bus.clone(),
        );

        Self {
            session_store,
            api,
            auth,
            tokens,
            bus,
            pipeline,
            surfaces: RwLock::new(Vec::new()),
        }
    }

    /// Context talking HTTP to the configured server with the configured limits
    #[must_use]
    pub fn from_config(
        config: &ClientConfig,
        local_store: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter = RateLimiter::from_rules(Arc::clone(&clock), config.rate_limit_rules());
        Self::new(
            Arc::new(HttpApiClient::from_config(config)),
            local_store,
            session_store,
            limiter,
            clock,
        )
    }

    /// Load the stored session into memory
    ///
    /// # Errors
    ///
    /// Returns an error if the persistent store cannot be read
    pub async fn start(&self) -> Result<AuthState, StoreError> {
        let state = self.auth.load().await?;
        info!(logged_in = state.is_logged_in(), "Background context started");
        Ok(state)
    }

    /// Relay auth changes made by other contexts through the store as
    /// `AUTH_STATE_CHANGE`
    pub fn watch_storage(&self) -> JoinHandle<()> {
        let bus = self.bus.clone();
        self.auth.on_external_change(move |auth_state| {
            bus.publish(ExtensionMessage::AuthStateChange { auth_state });
        })
    }

    /// Message bus
    #[must_use]
    pub const fn bus(&self) -> &CrossContextBus {
        &self.bus
    }

    /// Auth state owner
    #[must_use]
    pub const fn auth(&self) -> &Arc<AuthStateManager> {
        &self.auth
    }

    /// Token coordinator
    #[must_use]
    pub const fn tokens(&self) -> &Arc<TokenRefreshCoordinator> {
        &self.tokens
    }

    /// Request pipeline
    #[must_use]
    pub const fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Register a page surface for theme broadcasts
    pub async fn register_surface(&self, surface: Arc<dyn PageSurface>) {
        self.surfaces.write().await.push(surface);
    }

    /// Context-menu "summarize selection"
    ///
    /// # Errors
    ///
    /// The pipeline's terminal error, already rendered on `surface`
    pub async fn on_context_menu(
        &self,
        trigger: &SelectionTrigger,
        surface: &dyn PageSurface,
    ) -> Result<SummaryResult, SummarizeError> {
        self.pipeline.summarize(trigger, surface).await
    }

    /// Regenerate from the overlay
    ///
    /// # Errors
    ///
    /// The pipeline's terminal error, already rendered on `surface`
    pub async fn on_regenerate(
        &self,
        trigger: &RegenerateTrigger,
        surface: &dyn PageSurface,
    ) -> Result<SummaryResult, SummarizeError> {
        self.pipeline.regenerate(trigger, surface).await
    }

    /// Apply a message from another context and relay it on the bus
    pub async fn handle_message(&self, message: ExtensionMessage) -> MessageResponse {
        let event_type = message.event_type();
        debug!(%event_type, "Handling extension message");

        let response = match &message {
            ExtensionMessage::AuthStateChange { auth_state } => {
                self.apply_state(auth_state.clone()).await
            }
            ExtensionMessage::SessionUpdate { session, jwt_token } => {
                self.apply_session_update(session, jwt_token).await
            }
            ExtensionMessage::SessionClear => self.apply_session_clear().await,
            ExtensionMessage::RefreshToken => {
                return match self.tokens.force_refresh().await {
                    Ok(token) => MessageResponse::with_token(token),
                    Err(failure) => MessageResponse::failed(failure.to_string()),
                };
            }
            ExtensionMessage::ThemeChange { theme } => {
                self.apply_theme(*theme).await;
                MessageResponse::ok()
            }
            ExtensionMessage::TokenRefreshed { token } => self.apply_refreshed_token(token).await,
            ExtensionMessage::RefreshUsage => MessageResponse::ok(),
        };

        if response.success {
            self.bus.publish(message);
        }
        response
    }

    async fn apply_state(&self, state: AuthState) -> MessageResponse {
        match self.auth.set(state).await {
            Ok(()) => MessageResponse::ok(),
            Err(e) => store_failure(&e),
        }
    }

    /// Adopt a session relayed from the web app.
    ///
    /// Memory is updated before either store write so the next request sees
    /// the new token without waiting on storage.
    async fn apply_session_update(&self, session: &Value, jwt_token: &str) -> MessageResponse {
        let user_value = session.get("user").unwrap_or(session).clone();
        let state = match serde_json::from_value::<UserRef>(user_value) {
            Ok(user) => AuthState::logged_in(jwt_token, user),
            Err(e) => {
                debug!(error = %e, "Session carries no user, keeping current user");
                self.auth.current().await.with_token(jwt_token)
            }
        };
        info!(logged_in = state.is_logged_in(), "Session update received");

        let persisted = self.auth.set(state).await;

        let mut entries = Map::new();
        entries.insert(storage_keys::SESSION.to_owned(), session.clone());
        entries.insert(storage_keys::JWT_TOKEN.to_owned(), Value::from(jwt_token));
        let relayed = self.session_store.set(entries).await;

        match persisted.and(relayed) {
            Ok(()) => MessageResponse::ok(),
            Err(e) => store_failure(&e),
        }
    }

    async fn apply_session_clear(&self) -> MessageResponse {
        info!("Session cleared by another context");
        let cleared = self.session_store.clear().await;
        let logged_out = self.auth.clear().await;
        match cleared.and(logged_out) {
            Ok(()) => MessageResponse::ok(),
            Err(e) => store_failure(&e),
        }
    }

    async fn apply_refreshed_token(&self, token: &str) -> MessageResponse {
        if self.auth.current().await.token() == Some(token) {
            return MessageResponse::ok();
        }
        match self.auth.set_token(token).await {
            Ok(_) => MessageResponse::ok(),
            Err(e) => store_failure(&e),
        }
    }

    async fn apply_theme(&self, theme: Theme) {
        let surfaces = self.surfaces.read().await.clone();
        debug!(%theme, surfaces = surfaces.len(), "Applying theme");
        for surface in surfaces {
            surface.apply_theme(theme).await;
        }
    }

    /// Sign in with email and password
    ///
    /// # Errors
    ///
    /// `Auth` for rejected credentials, `Network` when the server is
    /// unreachable, otherwise the classified server error
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthState, SummarizeError> {
        let credentials = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let reply = self.api.login(&credentials).await?;

        if matches!(reply.status, 400 | 401) {
            return Err(SummarizeError::Auth {
                reason: reply
                    .error_message()
                    .unwrap_or_else(|| "Invalid email or password".to_owned()),
            });
        }
        if !reply.is_success() {
            return Err(classify_failure(&reply));
        }

        let response: LoginResponse = reply.json().map_err(|e| {
            warn!(error = %e, "Login response did not match the expected shape");
            SummarizeError::Server {
                status: reply.status,
                message: "The server returned an unexpected response. Please try again.".to_owned(),
            }
        })?;

        let user = response.user.unwrap_or_else(|| UserRef::with_email(email));
        let state = AuthState::logged_in(response.token, user);
        if let Err(e) = self.auth.set(state.clone()).await {
            warn!(error = %e, "Logged in but the session could not be persisted");
        }
        info!("Logged in");
        self.bus.publish(ExtensionMessage::AuthStateChange {
            auth_state: state.clone(),
        });
        Ok(state)
    }

    /// Sign out locally
    ///
    /// # Errors
    ///
    /// Returns an error if either store cannot be cleared
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.auth.clear().await?;
        self.session_store.clear().await?;
        info!("Logged out");
        self.bus.publish(ExtensionMessage::AuthStateChange {
            auth_state: AuthState::logged_out(),
        });
        Ok(())
    }

    /// Check the session the way the popup does on open: make sure the token
    /// is usable (refreshing if needed) and look up the plan
    pub async fn session_status(&self) -> SessionStatus {
        let before = self.tokens.status().await;
        match self.tokens.ensure_valid_token().await {
            Ok(token) => {
                let state = self.auth.current().await;
                SessionStatus {
                    logged_in: true,
                    email: state.user().map(|user| user.email.clone()),
                    token_status: TokenStatus::Valid,
                    expires_at: TokenClaims::decode(&token)
                        .ok()
                        .and_then(|claims| claims.expires_at()),
                    plan: self.pipeline.plan_type(&token).await,
                }
            }
            Err(failure) => {
                debug!(error = %failure, ?before, "No usable session");
                let token_status = match failure {
                    RefreshFailure::NoSession => TokenStatus::Missing,
                    _ => TokenStatus::Expired,
                };
                SessionStatus {
                    logged_in: false,
                    email: None,
                    token_status,
                    expires_at: None,
                    plan: None,
                }
            }
        }
    }
}

fn store_failure(error: &StoreError) -> MessageResponse {
    warn!(error = %error, "Failed to update session storage");
    MessageResponse::failed("Failed to update session storage")
}
