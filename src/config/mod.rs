// ABOUTME: Configuration module root for the LightRead client
// ABOUTME: Re-exports the environment-driven ClientConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

/// Environment variable parsing and validation
pub mod environment;

pub use environment::ClientConfig;
