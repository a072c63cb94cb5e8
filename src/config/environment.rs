// ABOUTME: Environment configuration for the LightRead client: server URL, timeouts, limits
// ABOUTME: Loads an optional .env file, parses LIGHTREAD_* variables and validates the result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! Environment-based configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use url::Url;

use crate::constants::{network, rate_limits};
use crate::rate_limiting::RateLimitRule;

/// Client configuration resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the summarization API
    pub server_url: String,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Sliding window for the summarize action
    pub summarize_limit: RateLimitRule,
    /// Cooldown applied to save and regenerate
    pub action_cooldown: RateLimitRule,
    /// Directory holding the persistent session file
    pub storage_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: network::DEFAULT_SERVER_URL.to_owned(),
            request_timeout: Duration::from_secs(network::DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(network::DEFAULT_CONNECT_TIMEOUT_SECS),
            summarize_limit: RateLimitRule::new(
                rate_limits::SUMMARIZE_MAX_REQUESTS,
                rate_limits::SUMMARIZE_WINDOW_MS,
            ),
            action_cooldown: RateLimitRule::new(1, rate_limits::ACTION_COOLDOWN_MS),
            storage_dir: default_storage_dir(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse or the resulting
    /// configuration fails validation
    pub fn from_env() -> Result<Self> {
        info!("Loading client configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }

        let summarize_max: u32 = env_var_or(
            "LIGHTREAD_SUMMARIZE_MAX_REQUESTS",
            &rate_limits::SUMMARIZE_MAX_REQUESTS.to_string(),
        )
        .parse()
        .context("Invalid LIGHTREAD_SUMMARIZE_MAX_REQUESTS value")?;
        let summarize_window_ms: u64 = env_var_or(
            "LIGHTREAD_SUMMARIZE_WINDOW_MS",
            &rate_limits::SUMMARIZE_WINDOW_MS.to_string(),
        )
        .parse()
        .context("Invalid LIGHTREAD_SUMMARIZE_WINDOW_MS value")?;
        let cooldown_ms: u64 = env_var_or(
            "LIGHTREAD_ACTION_COOLDOWN_MS",
            &rate_limits::ACTION_COOLDOWN_MS.to_string(),
        )
        .parse()
        .context("Invalid LIGHTREAD_ACTION_COOLDOWN_MS value")?;

        let config = Self {
            server_url: env_var_or("LIGHTREAD_SERVER_URL", network::DEFAULT_SERVER_URL),
            request_timeout: Duration::from_secs(
                env_var_or(
                    "LIGHTREAD_REQUEST_TIMEOUT_SECS",
                    &network::DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid LIGHTREAD_REQUEST_TIMEOUT_SECS value")?,
            ),
            connect_timeout: Duration::from_secs(
                env_var_or(
                    "LIGHTREAD_CONNECT_TIMEOUT_SECS",
                    &network::DEFAULT_CONNECT_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid LIGHTREAD_CONNECT_TIMEOUT_SECS value")?,
            ),
            summarize_limit: RateLimitRule::new(summarize_max, summarize_window_ms),
            action_cooldown: RateLimitRule::new(1, cooldown_ms),
            storage_dir: env::var("LIGHTREAD_STORAGE_DIR")
                .map_or_else(|_| default_storage_dir(), PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns an error for a non-HTTP server URL, a zero timeout, or a rate
    /// limit rule that could never admit anything
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.server_url)
            .with_context(|| format!("Invalid LIGHTREAD_SERVER_URL: {}", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("LIGHTREAD_SERVER_URL must use http or https, got {}", url.scheme());
        }
        if self.request_timeout.is_zero() || self.connect_timeout.is_zero() {
            bail!("Request and connect timeouts must be greater than zero");
        }
        for (name, rule) in [
            ("summarize", self.summarize_limit),
            ("cooldown", self.action_cooldown),
        ] {
            if rule.max_requests == 0 || rule.window_ms == 0 {
                bail!("Rate limit rule '{name}' must allow at least one request per non-empty window");
            }
        }
        Ok(())
    }

    /// Limiter rules keyed by action name
    #[must_use]
    pub fn rate_limit_rules(&self) -> Vec<(&'static str, RateLimitRule)> {
        vec![
            (rate_limits::SUMMARIZE_ACTION, self.summarize_limit),
            (rate_limits::SAVE_ACTION, self.action_cooldown),
            (rate_limits::REGENERATE_ACTION, self.action_cooldown),
        ]
    }

    /// File backing the persistent (local) store
    #[must_use]
    pub fn local_store_path(&self) -> PathBuf {
        self.storage_dir.join("local.json")
    }
}

/// Get an environment variable or a default
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn default_storage_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lightread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "LIGHTREAD_SERVER_URL",
        "LIGHTREAD_REQUEST_TIMEOUT_SECS",
        "LIGHTREAD_CONNECT_TIMEOUT_SECS",
        "LIGHTREAD_SUMMARIZE_MAX_REQUESTS",
        "LIGHTREAD_SUMMARIZE_WINDOW_MS",
        "LIGHTREAD_ACTION_COOLDOWN_MS",
        "LIGHTREAD_STORAGE_DIR",
    ];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear_vars();
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.server_url, network::DEFAULT_SERVER_URL);
        assert_eq!(config.summarize_limit, RateLimitRule::new(5, 60_000));
        assert_eq!(config.action_cooldown, RateLimitRule::new(1, 12_000));
    }

    #[test]
    #[serial]
    fn overrides_from_environment() {
        clear_vars();
        env::set_var("LIGHTREAD_SERVER_URL", "https://api.lightread.test");
        env::set_var("LIGHTREAD_SUMMARIZE_MAX_REQUESTS", "10");
        env::set_var("LIGHTREAD_STORAGE_DIR", "/tmp/lightread-config-test");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.server_url, "https://api.lightread.test");
        assert_eq!(config.summarize_limit.max_requests, 10);
        assert_eq!(
            config.local_store_path(),
            PathBuf::from("/tmp/lightread-config-test/local.json")
        );
        clear_vars();
    }

    #[test]
    #[serial]
    fn rejects_unparseable_numbers() {
        clear_vars();
        env::set_var("LIGHTREAD_SUMMARIZE_WINDOW_MS", "soon");
        let err = ClientConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("LIGHTREAD_SUMMARIZE_WINDOW_MS"));
        clear_vars();
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ClientConfig {
            server_url: "ftp://example.com".to_owned(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        config.server_url = "http://localhost:3000".to_owned();
        config.summarize_limit = RateLimitRule::new(0, 60_000);
        assert!(config.validate().is_err());

        config.summarize_limit = RateLimitRule::new(5, 60_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rules_cover_every_action() {
        let rules = ClientConfig::default().rate_limit_rules();
        let keys: Vec<_> = rules.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, ["summarize", "save", "regenerate"]);
    }
}
