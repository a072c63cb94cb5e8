// ABOUTME: HTTP client construction with request and connect timeouts
// ABOUTME: Falls back to a default client if the configured builder fails
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::constants::network;

/// Create an HTTP client with custom timeouts
///
/// Returns a default client if the configured one cannot be built.
#[must_use]
pub fn create_client_with_timeout(timeout: Duration, connect_timeout: Duration) -> Client {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(network::USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}
