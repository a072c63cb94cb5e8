// ABOUTME: Shared test utilities for LightRead integration tests
// ABOUTME: Token builders, a recording page surface and a wiremock-backed harness
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::panic
)]
//! Shared test utilities for `lightread`

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lightread::api::HttpApiClient;
use lightread::background::BackgroundContext;
use lightread::clock::{Clock, ManualClock};
use lightread::models::{AuthState, SummaryResult, Theme, UserRef};
use lightread::rate_limiting::RateLimiter;
use lightread::session::{JsonStore, StorageArea};
use lightread::surface::PageSurface;
use serde_json::json;
use wiremock::MockServer;

static INIT_LOGGER: Once = Once::new();

/// Fixed "now" for every test: 2023-11-14T22:13:20Z
pub const NOW_MILLIS: u64 = 1_700_000_000_000;

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(std::env::var("TEST_LOG").unwrap_or_else(|_| "warn".to_owned()))
            .with_test_writer()
            .try_init();
    });
}

/// Unsigned `header.payload.signature` token carrying `exp` and a marker
pub fn make_token(exp: i64, marker: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({"exp": exp, "sub": "user-1", "marker": marker})
            .to_string()
            .as_bytes(),
    );
    format!("{header}.{payload}.signature")
}

/// Token valid for an hour after [`NOW_MILLIS`]
pub fn valid_token(marker: &str) -> String {
    make_token((NOW_MILLIS / 1000) as i64 + 3600, marker)
}

/// Token that expired one second before [`NOW_MILLIS`]
pub fn expired_token(marker: &str) -> String {
    make_token((NOW_MILLIS / 1000) as i64 - 1, marker)
}

/// Text long enough to pass validation
pub fn article_text() -> String {
    "LightRead turns long passages into short summaries. ".repeat(4)
}

/// What a surface was asked to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Summary { summary: String, token: String },
    Error(String),
    Theme(Theme),
}

/// Page surface that records every call
#[derive(Default)]
pub struct RecordingSurface {
    rendered: Mutex<Vec<Rendered>>,
}

impl RecordingSurface {
    pub fn rendered(&self) -> Vec<Rendered> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> usize {
        self.rendered()
            .iter()
            .filter(|r| matches!(r, Rendered::Summary { .. }))
            .count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.rendered()
            .into_iter()
            .filter_map(|r| match r {
                Rendered::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PageSurface for RecordingSurface {
    async fn show_summary(&self, result: &SummaryResult, token: &str) {
        self.rendered.lock().unwrap().push(Rendered::Summary {
            summary: result.summary.clone(),
            token: token.to_owned(),
        });
    }

    async fn show_error(&self, message: &str) {
        self.rendered
            .lock()
            .unwrap()
            .push(Rendered::Error(message.to_owned()));
    }

    async fn apply_theme(&self, theme: Theme) {
        self.rendered.lock().unwrap().push(Rendered::Theme(theme));
    }
}

/// Background context wired to a mock server and a frozen clock
pub struct Harness {
    pub server: MockServer,
    pub clock: Arc<ManualClock>,
    pub local: Arc<JsonStore>,
    pub session: Arc<JsonStore>,
    pub context: BackgroundContext,
}

impl Harness {
    /// Logged-out context against a fresh mock server
    pub async fn new() -> Self {
        Self::with_client(reqwest::Client::new()).await
    }

    /// Logged-out context whose API calls go through `client`
    pub async fn with_client(client: reqwest::Client) -> Self {
        init_test_logging();
        let server = MockServer::start().await;
        let clock = Arc::new(ManualClock::at_millis(NOW_MILLIS));
        let local = Arc::new(JsonStore::in_memory(StorageArea::Local));
        let session = Arc::new(JsonStore::in_memory(StorageArea::Session));

        let api = Arc::new(HttpApiClient::new(client, server.uri()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let context = BackgroundContext::new(
            api,
            local.clone(),
            session.clone(),
            RateLimiter::with_default_rules(dyn_clock.clone()),
            dyn_clock,
        );

        Self {
            server,
            clock,
            local,
            session,
            context,
        }
    }

    /// Context already logged in with `token`
    pub async fn logged_in(token: &str) -> Self {
        Self::new().await.log_in(token).await
    }

    /// Store a logged-in session for `token`
    pub async fn log_in(self, token: &str) -> Self {
        self.context
            .auth()
            .set(AuthState::logged_in(
                token,
                UserRef::with_email("reader@example.com"),
            ))
            .await
            .unwrap();
        self
    }
}
