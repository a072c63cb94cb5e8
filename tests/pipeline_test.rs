// ABOUTME: End-to-end tests of the summarize, regenerate and save flows against a mock API
// ABOUTME: Covers validation, local rate limiting, the single 401 retry and error classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{article_text, valid_token, Harness, RecordingSurface, Rendered};
use lightread::api::HttpApiClient;
use lightread::background::BackgroundContext;
use lightread::bus::{EventType, ExtensionMessage};
use lightread::clock::{Clock, ManualClock};
use lightread::errors::{ErrorKind, RateLimitScope, SummarizeError, ValidationFailure};
use lightread::models::{AuthState, SummaryResult, UserRef};
use lightread::pipeline::{RegenerateTrigger, SelectionTrigger};
use lightread::rate_limiting::RateLimiter;
use lightread::session::{JsonStore, StorageArea};
use lightread::utils::http_client::create_client_with_timeout;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn selection(text: &str) -> SelectionTrigger {
    SelectionTrigger {
        text: text.to_owned(),
        source_url: Some("https://example.com/article".to_owned()),
    }
}

async fn mount_summary(harness: &Harness, summary: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": summary,
            "usage": {
                "daily_summaries": {"current": 1, "limit": 10},
                "text_length": {"current": 208, "limit": 5000}
            }
        })))
        .expect(times)
        .mount(&harness.server)
        .await;
}

#[tokio::test]
async fn test_successful_summary_is_delivered() {
    let token = valid_token("current");
    let harness = Harness::logged_in(&token).await;
    mount_summary(&harness, "X", 1).await;

    let mut usage = harness.context.bus().subscribe(EventType::RefreshUsage);
    let surface = RecordingSurface::default();
    let text = format!("  {}  ", article_text());

    let result = harness
        .context
        .on_context_menu(&selection(&text), &surface)
        .await
        .unwrap();

    assert_eq!(result.summary, "X");
    assert_eq!(result.original_text, article_text().trim());
    assert_eq!(result.character_count, article_text().trim().chars().count());
    assert_eq!(result.source_url.as_deref(), Some("https://example.com/article"));
    assert_eq!(result.usage.unwrap().daily_summaries.limit, 10);
    assert_eq!(
        surface.rendered(),
        vec![Rendered::Summary {
            summary: "X".to_owned(),
            token
        }]
    );
    assert_eq!(usage.try_recv(), Some(ExtensionMessage::RefreshUsage));
}

#[tokio::test]
async fn test_validation_rejects_before_network() {
    let harness = Harness::logged_in(&valid_token("current")).await;
    mount_summary(&harness, "unused", 0).await;
    let surface = RecordingSurface::default();

    let err = harness
        .context
        .on_context_menu(&selection("short"), &surface)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SummarizeError::Validation(ValidationFailure::TooShort { length: 5, min: 100 })
    );

    let err = harness
        .context
        .on_context_menu(&selection(&"a".repeat(50_001)), &surface)
        .await
        .unwrap_err();
    assert!(err.user_message().contains("too long"));

    let err = harness
        .context
        .on_context_menu(&selection("   \n\t "), &surface)
        .await
        .unwrap_err();
    assert!(err.user_message().contains("empty"));

    assert_eq!(surface.errors().len(), 3);
    assert_eq!(surface.summaries(), 0);
}

#[tokio::test]
async fn test_validation_accepts_exact_bounds() {
    let harness = Harness::logged_in(&valid_token("current")).await;
    mount_summary(&harness, "ok", 2).await;
    let pipeline = harness.context.pipeline();

    assert!(pipeline.run_summarize(&selection(&"a".repeat(100))).await.is_ok());
    assert!(pipeline
        .run_summarize(&selection(&"a".repeat(50_000)))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_sixth_trigger_is_rate_limited_locally() {
    let harness = Harness::logged_in(&valid_token("current")).await;
    mount_summary(&harness, "summary", 5).await;
    let surface = RecordingSurface::default();
    let text = article_text();

    let mut outcomes = Vec::new();
    for _ in 0..6 {
        harness.clock.advance(Duration::from_millis(1_500));
        outcomes.push(harness.context.on_context_menu(&selection(&text), &surface).await);
    }

    assert!(outcomes[..5].iter().all(Result::is_ok));
    let err = outcomes[5].clone().unwrap_err();
    assert!(matches!(
        err,
        SummarizeError::RateLimited {
            scope: RateLimitScope::Local { .. },
            ..
        }
    ));
    assert_eq!(surface.summaries(), 5);
    assert_eq!(surface.errors().len(), 1);
}

#[tokio::test]
async fn test_unauthorized_is_retried_once_with_fresh_token() {
    let stale = valid_token("stale");
    let fresh = valid_token("fresh");
    let harness = Harness::logged_in(&stale).await;

    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(header("authorization", format!("Bearer {stale}").as_str()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid token"})))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("authorization", format!("Bearer {stale}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": fresh})))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(header("authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "after retry"})))
        .expect(1)
        .mount(&harness.server)
        .await;

    let surface = RecordingSurface::default();
    let result = harness
        .context
        .on_context_menu(&selection(&article_text()), &surface)
        .await
        .unwrap();

    assert_eq!(result.summary, "after retry");
    assert_eq!(
        surface.rendered(),
        vec![Rendered::Summary {
            summary: "after retry".to_owned(),
            token: fresh
        }]
    );
}

#[tokio::test]
async fn test_second_unauthorized_is_auth_error_without_third_call() {
    let harness = Harness::logged_in(&valid_token("stale")).await;

    Mock::given(method("POST"))
        .and(path("/summarize"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": valid_token("fresh")})))
        .expect(1)
        .mount(&harness.server)
        .await;

    let surface = RecordingSurface::default();
    let err = harness
        .context
        .on_context_menu(&selection(&article_text()), &surface)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(surface.errors(), vec![err.user_message()]);
}

#[tokio::test]
async fn test_logged_out_requires_login() {
    let harness = Harness::new().await;
    mount_summary(&harness, "unused", 0).await;
    let surface = RecordingSurface::default();

    let err = harness
        .context
        .on_context_menu(&selection(&article_text()), &surface)
        .await
        .unwrap_err();

    assert_eq!(err, SummarizeError::login_required());
    assert_eq!(surface.errors(), vec!["Please login to use LightRead".to_owned()]);
}

#[tokio::test]
async fn test_server_status_classification() {
    let cases = [
        (429_u16, json!({"error": "Daily summary limit reached"}), ErrorKind::RateLimit),
        (500, json!({"error": "Failed to generate summary"}), ErrorKind::Server),
        (403, json!({"code": "PRO_FEATURE"}), ErrorKind::ProFeature),
        (400, json!({"error": "Text exceeds plan limit"}), ErrorKind::Request),
    ];

    for (status, body, kind) in cases {
        let harness = Harness::logged_in(&valid_token("current")).await;
        Mock::given(method("POST"))
            .and(path("/summarize"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&harness.server)
            .await;

        let err = harness
            .context
            .pipeline()
            .run_summarize(&selection(&article_text()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind, "status {status}");
    }
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::at_millis(common::NOW_MILLIS));
    let context = BackgroundContext::new(
        Arc::new(HttpApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9")),
        Arc::new(JsonStore::in_memory(StorageArea::Local)),
        Arc::new(JsonStore::in_memory(StorageArea::Session)),
        RateLimiter::with_default_rules(clock.clone()),
        clock,
    );
    context
        .auth()
        .set(AuthState::logged_in(
            valid_token("current"),
            UserRef::with_email("reader@example.com"),
        ))
        .await
        .unwrap();

    let surface = RecordingSurface::default();
    let err = context
        .on_context_menu(&selection(&article_text()), &surface)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!surface.errors()[0].contains("127.0.0.1"));
}

#[tokio::test]
async fn test_pro_plan_sends_tone_and_difficulty() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("GET"))
        .and(path("/user/limits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"plan_type": "pro"})))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "preferred_summary_length": "short",
            "summary_tone": "casual",
            "summary_difficulty": "simple"
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_partial_json(json!({
            "length": "short",
            "override_tone": "casual",
            "override_difficulty": "simple"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "pro"})))
        .expect(1)
        .mount(&harness.server)
        .await;

    let delivery = harness
        .context
        .pipeline()
        .run_summarize(&selection(&article_text()))
        .await
        .unwrap();
    assert_eq!(delivery.result.summary, "pro");
}

#[tokio::test]
async fn test_settings_failure_falls_back_to_defaults_without_overrides() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("GET"))
        .and(path("/user/settings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/limits"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.server)
        .await;
    mount_summary(&harness, "default", 1).await;

    harness
        .context
        .pipeline()
        .run_summarize(&selection(&article_text()))
        .await
        .unwrap();

    let requests = harness.server.received_requests().await.unwrap();
    let summarize = requests
        .iter()
        .find(|request| request.url.path() == "/summarize")
        .unwrap();
    let body: Value = serde_json::from_slice(&summarize.body).unwrap();
    assert_eq!(body["length"], "medium");
    assert!(body.get("override_tone").is_none());
    assert!(body.get("override_difficulty").is_none());
}

#[tokio::test]
async fn test_one_bad_setting_keeps_the_others() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("GET"))
        .and(path("/user/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "preferred_summary_length": "short",
            "summary_tone": null,
            "theme": "sepia"
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_partial_json(json!({"length": "short"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "short one"})))
        .expect(1)
        .mount(&harness.server)
        .await;

    let delivery = harness
        .context
        .pipeline()
        .run_summarize(&selection(&article_text()))
        .await
        .unwrap();
    assert_eq!(delivery.result.summary, "short one");
}

#[tokio::test]
async fn test_unreadable_usage_still_delivers_summary() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("POST"))
        .and(path("/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "X",
            "usage": {"daily_summaries": {"current": 1, "limit": null}}
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let surface = RecordingSurface::default();
    let result = harness
        .context
        .on_context_menu(&selection(&article_text()), &surface)
        .await
        .unwrap();

    assert_eq!(result.summary, "X");
    assert!(result.usage.is_none());
    assert_eq!(surface.summaries(), 1);
    assert!(surface.errors().is_empty());
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let client = create_client_with_timeout(Duration::from_millis(200), Duration::from_millis(200));
    let harness = Harness::with_client(client)
        .await
        .log_in(&valid_token("current"))
        .await;

    Mock::given(method("POST"))
        .and(path("/summarize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"summary": "too late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let surface = RecordingSurface::default();
    let err = harness
        .context
        .on_context_menu(&selection(&article_text()), &surface)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    let shown = surface.errors();
    assert_eq!(shown, vec![err.user_message()]);
    assert!(!shown[0].contains("timed out"));
    assert!(!shown[0].contains("127.0.0.1"));
    assert_eq!(surface.summaries(), 0);
}

#[tokio::test]
async fn test_regenerate_for_free_plan_surfaces_pro_feature() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_partial_json(json!({"override_tone": "formal"})))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "Pro feature",
            "code": "PRO_FEATURE"
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let surface = RecordingSurface::default();
    let trigger = RegenerateTrigger {
        original_text: article_text(),
        source_url: None,
        tone: "formal".to_owned(),
        difficulty: "advanced".to_owned(),
    };
    let err = harness
        .context
        .on_regenerate(&trigger, &surface)
        .await
        .unwrap_err();

    assert_eq!(err, SummarizeError::pro_feature());
    assert_eq!(surface.errors(), vec![SummarizeError::pro_feature().user_message()]);
}

#[tokio::test]
async fn test_regenerate_has_its_own_cooldown() {
    let harness = Harness::logged_in(&valid_token("current")).await;
    mount_summary(&harness, "again", 2).await;
    let pipeline = harness.context.pipeline();
    let trigger = RegenerateTrigger {
        original_text: article_text(),
        source_url: None,
        tone: "casual".to_owned(),
        difficulty: "simple".to_owned(),
    };

    assert!(pipeline.run_regenerate(&trigger).await.is_ok());
    harness.clock.advance(Duration::from_millis(3_000));
    let err = pipeline.run_regenerate(&trigger).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(
        err.user_message(),
        "Too many requests. Please wait 9 seconds before trying again."
    );

    harness.clock.advance(Duration::from_millis(9_000));
    assert!(pipeline.run_regenerate(&trigger).await.is_ok());
}

#[tokio::test]
async fn test_save_honours_source_url_preference() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("GET"))
        .and(path("/user/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"save_source_url": false})))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summaries/save"))
        .and(body_partial_json(json!({"summary": "X", "source_url": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s1"})))
        .expect(1)
        .mount(&harness.server)
        .await;

    let result = SummaryResult {
        summary: "X".to_owned(),
        source_url: Some("https://example.com/article".to_owned()),
        character_count: 208,
        original_text: article_text(),
        usage: None,
    };
    let pipeline = harness.context.pipeline();
    pipeline.save(&result).await.unwrap();

    let err = pipeline.save(&result).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
}

#[tokio::test]
async fn test_summary_options_only_for_pro() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("GET"))
        .and(path("/user/limits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"plan_type": "free"})))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc/get_enum_values"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    assert!(harness.context.pipeline().summary_options().await.is_none());
}

#[tokio::test]
async fn test_summary_options_for_pro() {
    let harness = Harness::logged_in(&valid_token("current")).await;

    Mock::given(method("GET"))
        .and(path("/user/limits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"plan_type": "enterprise"})))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc/get_enum_values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"enum_name": "summary_tone", "enum_values": ["neutral", "casual"]},
            {"enum_name": "summary_difficulty", "enum_values": ["simple", "normal"]}
        ])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let options = harness.context.pipeline().summary_options().await.unwrap();
    assert_eq!(options.tones, ["neutral", "casual"]);
    assert_eq!(options.difficulties, ["simple", "normal"]);
}
