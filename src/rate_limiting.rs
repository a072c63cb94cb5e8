// ABOUTME: Sliding-window rate limiter keyed by action name
// ABOUTME: Keeps admitted timestamps per key and prunes the ones outside the window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! # Local Rate Limiting
//!
//! Each action key (`summarize`, `save`, `regenerate`) owns a rule and a
//! queue of admission timestamps. An attempt is admitted when fewer than
//! `max_requests` timestamps fall inside the trailing window; admitted
//! attempts are recorded, rejected ones leave the state untouched.
//!
//! State is in-memory only and resets with the process.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::constants::rate_limits;

/// Limit for one action key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Admissions allowed inside one window
    pub max_requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl RateLimitRule {
    /// Rule admitting `max_requests` per `window_ms`
    #[must_use]
    pub const fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }
}

/// Snapshot of one key's window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Admissions left in the current window
    pub remaining: u32,
    /// Time until the next admission is possible, zero when one is possible now
    pub retry_after: Duration,
}

/// Sliding-window limiter shared by every request flow
pub struct RateLimiter {
    rules: HashMap<String, RateLimitRule>,
    windows: DashMap<String, VecDeque<u64>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Limiter with no rules; every key is admitted until a rule is added
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rules: HashMap::new(),
            windows: DashMap::new(),
            clock,
        }
    }

    /// Limiter with the built-in rules: 5 summarize calls per minute, one
    /// save and one regenerate per 12 seconds
    #[must_use]
    pub fn with_default_rules(clock: Arc<dyn Clock>) -> Self {
        let cooldown = RateLimitRule::new(1, rate_limits::ACTION_COOLDOWN_MS);
        Self::new(clock)
            .with_rule(
                rate_limits::SUMMARIZE_ACTION,
                RateLimitRule::new(
                    rate_limits::SUMMARIZE_MAX_REQUESTS,
                    rate_limits::SUMMARIZE_WINDOW_MS,
                ),
            )
            .with_rule(rate_limits::SAVE_ACTION, cooldown)
            .with_rule(rate_limits::REGENERATE_ACTION, cooldown)
    }

    /// Limiter built from `(key, rule)` pairs
    #[must_use]
    pub fn from_rules<'a>(
        clock: Arc<dyn Clock>,
        rules: impl IntoIterator<Item = (&'a str, RateLimitRule)>,
    ) -> Self {
        rules
            .into_iter()
            .fold(Self::new(clock), |limiter, (key, rule)| limiter.with_rule(key, rule))
    }

    /// Add or replace the rule for a key
    #[must_use]
    pub fn with_rule(mut self, key: &str, rule: RateLimitRule) -> Self {
        self.rules.insert(key.to_owned(), rule);
        self
    }

    /// Try to admit one attempt for `key` at the current time
    pub fn admit(&self, key: &str) -> bool {
        self.admit_at(key, self.clock.now_millis())
    }

    /// Try to admit one attempt for `key` at `now_ms`.
    ///
    /// Keys without a rule are always admitted. The check and the record
    /// happen under the key's entry lock, so concurrent attempts cannot
    /// both take the last slot.
    pub fn admit_at(&self, key: &str, now_ms: u64) -> bool {
        let Some(rule) = self.rules.get(key) else {
            debug!(key, "No rate limit rule configured, admitting");
            return true;
        };

        let mut window = self.windows.entry(key.to_owned()).or_default();
        prune(&mut window, rule, now_ms);

        if window.len() >= rule.max_requests as usize {
            debug!(
                key,
                admitted = window.len(),
                max = rule.max_requests,
                "Rate limit reached"
            );
            return false;
        }

        window.push_back(now_ms);
        true
    }

    /// Remaining capacity and retry delay for a key, without recording anything
    #[must_use]
    pub fn status(&self, key: &str) -> Option<RateLimitStatus> {
        let rule = self.rules.get(key)?;
        let now_ms = self.clock.now_millis();

        let Some(mut window) = self.windows.get_mut(key) else {
            return Some(RateLimitStatus {
                remaining: rule.max_requests,
                retry_after: Duration::ZERO,
            });
        };
        prune(&mut window, rule, now_ms);

        let used = window.len() as u32;
        let remaining = rule.max_requests.saturating_sub(used);
        let retry_after = if remaining > 0 {
            Duration::ZERO
        } else {
            window.front().map_or(Duration::ZERO, |oldest| {
                Duration::from_millis(oldest.saturating_add(rule.window_ms).saturating_sub(now_ms))
            })
        };

        Some(RateLimitStatus {
            remaining,
            retry_after,
        })
    }
}

/// Drop timestamps at least one window old
fn prune(window: &mut VecDeque<u64>, rule: &RateLimitRule, now_ms: u64) {
    while let Some(&oldest) = window.front() {
        if now_ms.saturating_sub(oldest) >= rule.window_ms {
            window.pop_front();
        } else {
            break;
        }
    }
}
