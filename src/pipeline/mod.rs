// ABOUTME: Summarize, regenerate and save request flows from validation to delivery
// ABOUTME: Validate, rate limit, authenticate, send with one 401 retry, classify, deliver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! # Request Pipeline
//!
//! One invocation runs its steps strictly in order:
//!
//! ```text
//! Validate -> RateLimitCheck -> Authenticate -> Send -> (Success | error)
//! ```
//!
//! The only automatic recovery anywhere is inside `Send`: a 401 triggers one
//! token refresh and one resend. Everything else is surfaced as-is.

/// Reply classification
pub mod classify;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::api::{ApiReply, SummaryApi};
use crate::bus::{CrossContextBus, ExtensionMessage};
use crate::constants::rate_limits;
use crate::errors::{ApiError, SummarizeError, ValidationFailure};
use crate::models::{
    EnumOption, PlanType, SaveSummaryRequest, SummaryOptions, SummaryRequest, SummaryResponse,
    SummaryResult, UserLimits, UserSettings,
};
use crate::rate_limiting::RateLimiter;
use crate::session::TokenRefreshCoordinator;
use crate::surface::PageSurface;

pub use classify::classify_failure;

/// Resends allowed after a 401
const MAX_REAUTH_ATTEMPTS: u8 = 1;

/// Selection handed over by the context menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTrigger {
    /// Selected text, untrimmed
    pub text: String,
    /// Page the selection came from
    pub source_url: Option<String>,
}

/// Regenerate request from the overlay's pro controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerateTrigger {
    /// Text summarized the first time
    pub original_text: String,
    /// Page the text came from
    pub source_url: Option<String>,
    /// Tone override
    pub tone: String,
    /// Difficulty override
    pub difficulty: String,
}

/// Successful invocation: the result and the token that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Summary for display
    pub result: SummaryResult,
    /// Bearer token used for the successful call
    pub token: String,
}

/// Orchestrates summarize, regenerate and save requests
pub struct RequestPipeline {
    limiter: Arc<RateLimiter>,
    tokens: Arc<TokenRefreshCoordinator>,
    api: Arc<dyn SummaryApi>,
    bus: CrossContextBus,
}

impl RequestPipeline {
    /// Pipeline sharing the limiter, token coordinator, API and bus
    #[must_use]
    pub fn new(
        limiter: Arc<RateLimiter>,
        tokens: Arc<TokenRefreshCoordinator>,
        api: Arc<dyn SummaryApi>,
        bus: CrossContextBus,
    ) -> Self {
        Self {
            limiter,
            tokens,
            api,
            bus,
        }
    }

    /// Summarize a selection and render the outcome on `surface`.
    ///
    /// On success the summary and token go to the surface and `REFRESH_USAGE`
    /// is published; on failure the surface gets the user-facing message.
    ///
    /// # Errors
    ///
    /// Returns the terminal error after it has been rendered
    pub async fn summarize(
        &self,
        trigger: &SelectionTrigger,
        surface: &dyn PageSurface,
    ) -> Result<SummaryResult, SummarizeError> {
        let span = info_span!("summarize", request_id = %Uuid::new_v4());
        let outcome = self.run_summarize(trigger).instrument(span).await;
        self.deliver(outcome, surface).await
    }

    /// Summarize again with explicit tone and difficulty, rendering on `surface`
    ///
    /// # Errors
    ///
    /// Returns the terminal error after it has been rendered. A non-pro
    /// account gets the server's pro-feature rejection, never a retry.
    pub async fn regenerate(
        &self,
        trigger: &RegenerateTrigger,
        surface: &dyn PageSurface,
    ) -> Result<SummaryResult, SummarizeError> {
        let span = info_span!("regenerate", request_id = %Uuid::new_v4());
        let outcome = self.run_regenerate(trigger).instrument(span).await;
        self.deliver(outcome, surface).await
    }

    /// Summarize without rendering
    ///
    /// # Errors
    ///
    /// Any terminal error of the state machine
    pub async fn run_summarize(
        &self,
        trigger: &SelectionTrigger,
    ) -> Result<Delivery, SummarizeError> {
        let text = ValidationFailure::check(&trigger.text)?;

        self.admit(rate_limits::SUMMARIZE_ACTION)?;

        let token = self.authenticate().await?;

        let settings = self.user_settings(&token).await;
        let plan = self.plan_type(&token).await;
        let pro = plan.is_some_and(PlanType::is_pro);

        let request = SummaryRequest {
            text: text.to_owned(),
            source_url: trigger.source_url.clone(),
            length: Some(settings.preferred_summary_length),
            tone: pro.then_some(settings.summary_tone),
            difficulty: pro.then_some(settings.summary_difficulty),
        };
        debug!(pro, characters = text.chars().count(), "Sending summarize request");

        let api = &self.api;
        let request = &request;
        let (reply, token) = self
            .send_with_reauth(token, |token| async move {
                api.summarize(&token, request).await
            })
            .await?;

        let result = summary_result(&reply, text, trigger.source_url.clone())?;
        info!("Summary generated");
        Ok(Delivery { result, token })
    }

    /// Regenerate without rendering
    ///
    /// # Errors
    ///
    /// Any terminal error of the state machine
    pub async fn run_regenerate(
        &self,
        trigger: &RegenerateTrigger,
    ) -> Result<Delivery, SummarizeError> {
        let text = ValidationFailure::check(&trigger.original_text)?;

        self.admit(rate_limits::REGENERATE_ACTION)?;

        let token = self.authenticate().await?;

        let request = SummaryRequest {
            text: text.to_owned(),
            source_url: None,
            length: None,
            tone: Some(trigger.tone.clone()),
            difficulty: Some(trigger.difficulty.clone()),
        };
        debug!(tone = %trigger.tone, difficulty = %trigger.difficulty, "Sending regenerate request");

        let api = &self.api;
        let request = &request;
        let (reply, token) = self
            .send_with_reauth(token, |token| async move {
                api.summarize(&token, request).await
            })
            .await?;

        let result = summary_result(&reply, text, trigger.source_url.clone())?;
        info!("Summary regenerated");
        Ok(Delivery { result, token })
    }

    /// Save a displayed summary to the user's account.
    ///
    /// The source URL is dropped when the user's settings say so.
    ///
    /// # Errors
    ///
    /// Local cooldown, auth failure, or the classified server rejection
    pub async fn save(&self, result: &SummaryResult) -> Result<(), SummarizeError> {
        self.admit(rate_limits::SAVE_ACTION)?;

        let token = self.authenticate().await?;
        let settings = self.user_settings(&token).await;
        let request = SaveSummaryRequest::from_result(result, settings.save_source_url);

        let api = &self.api;
        let request = &request;
        let (reply, _) = self
            .send_with_reauth(token, |token| async move {
                api.save_summary(&token, request).await
            })
            .await?;

        if reply.is_success() {
            info!("Summary saved");
            Ok(())
        } else {
            Err(classify_failure(&reply))
        }
    }

    /// Tone and difficulty choices for pro accounts; `None` for everyone
    /// else or when the options cannot be fetched
    pub async fn summary_options(&self) -> Option<SummaryOptions> {
        let token = self.tokens.ensure_valid_token().await.ok()?;
        if !self.plan_type(&token).await.is_some_and(PlanType::is_pro) {
            return None;
        }

        match self.api.enum_values(&token).await {
            Ok(reply) if reply.is_success() => match reply.json::<Vec<EnumOption>>() {
                Ok(enums) => Some(SummaryOptions::from_enums(&enums)),
                Err(e) => {
                    warn!(error = %e, "Unreadable summary options");
                    None
                }
            },
            Ok(reply) => {
                warn!(status = reply.status, "Summary options request rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "Summary options request failed");
                None
            }
        }
    }

    /// Current account settings, or the defaults if they cannot be fetched
    pub async fn user_settings(&self, token: &str) -> UserSettings {
        match self.api.user_settings(token).await {
            Ok(reply) if reply.is_success() => reply.json().unwrap_or_else(|e| {
                warn!(error = %e, "Unreadable user settings, using defaults");
                UserSettings::default()
            }),
            Ok(reply) => {
                warn!(status = reply.status, "User settings unavailable, using defaults");
                UserSettings::default()
            }
            Err(e) => {
                warn!(error = %e, "User settings request failed, using defaults");
                UserSettings::default()
            }
        }
    }

    /// Account plan, or `None` if it cannot be determined
    pub async fn plan_type(&self, token: &str) -> Option<PlanType> {
        match self.api.user_limits(token).await {
            Ok(reply) if reply.is_success() => reply
                .json::<UserLimits>()
                .map(|limits| limits.plan_type)
                .map_err(|e| debug!(error = %e, "Unreadable user limits"))
                .ok(),
            Ok(reply) => {
                debug!(status = reply.status, "User limits unavailable");
                None
            }
            Err(e) => {
                debug!(error = %e, "User limits request failed");
                None
            }
        }
    }

    /// Local limiter check, reporting how long until the next admission
    fn admit(&self, action: &str) -> Result<(), SummarizeError> {
        if self.limiter.admit(action) {
            return Ok(());
        }
        let retry_after = self
            .limiter
            .status(action)
            .map_or(Duration::ZERO, |status| status.retry_after);
        info!(
            action,
            retry_after_ms = retry_after.as_millis() as u64,
            "Rejected by local rate limiter"
        );
        Err(SummarizeError::local_rate_limit(action, retry_after))
    }

    async fn authenticate(&self) -> Result<String, SummarizeError> {
        self.tokens.ensure_valid_token().await.map_err(|failure| {
            info!(error = %failure, "Authentication failed");
            SummarizeError::from(failure)
        })
    }

    /// Send, and after a 401 refresh the token and send once more.
    ///
    /// Returns the first non-401 reply together with the token that got it.
    async fn send_with_reauth<F, Fut>(
        &self,
        mut token: String,
        send: F,
    ) -> Result<(ApiReply, String), SummarizeError>
    where
        F: Fn(String) -> Fut + Send + Sync,
        Fut: Future<Output = Result<ApiReply, ApiError>> + Send,
    {
        let mut reauth_attempts = 0;
        loop {
            let reply = send(token.clone()).await.map_err(|e| {
                warn!(error = %e, "Request did not complete");
                SummarizeError::from(e)
            })?;

            if reply.status != 401 {
                return Ok((reply, token));
            }
            if reauth_attempts >= MAX_REAUTH_ATTEMPTS {
                warn!("Request unauthorized after token refresh");
                return Err(SummarizeError::session_expired());
            }

            reauth_attempts += 1;
            info!("Request unauthorized, refreshing token and retrying once");
            token = self
                .tokens
                .refresh_rejected(&token)
                .await
                .map_err(SummarizeError::from)?;
        }
    }

    async fn deliver(
        &self,
        outcome: Result<Delivery, SummarizeError>,
        surface: &dyn PageSurface,
    ) -> Result<SummaryResult, SummarizeError> {
        match outcome {
            Ok(Delivery { result, token }) => {
                surface.show_summary(&result, &token).await;
                self.bus.publish(ExtensionMessage::RefreshUsage);
                Ok(result)
            }
            Err(error) => {
                debug!(kind = %error.kind(), error = %error, "Delivering error to page");
                surface.show_error(&error.user_message()).await;
                Err(error)
            }
        }
    }
}

/// Turn a reply into a displayable result, classifying anything but 2xx
fn summary_result(
    reply: &ApiReply,
    text: &str,
    source_url: Option<String>,
) -> Result<SummaryResult, SummarizeError> {
    if !reply.is_success() {
        return Err(classify_failure(reply));
    }
    let response: SummaryResponse = reply.json().map_err(|e| {
        warn!(error = %e, "Summary response did not match the expected shape");
        SummarizeError::Server {
            status: reply.status,
            message: "The server returned an unexpected response. Please try again.".to_owned(),
        }
    })?;

    Ok(SummaryResult {
        summary: response.summary,
        source_url,
        character_count: text.chars().count(),
        original_text: text.to_owned(),
        usage: response.usage,
    })
}
