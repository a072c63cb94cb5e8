// ABOUTME: Shared utility module root
// ABOUTME: Currently hosts HTTP client construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

/// HTTP client construction with timeouts
pub mod http_client;
