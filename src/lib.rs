// ABOUTME: Main library entry point for the LightRead background orchestration core
// ABOUTME: Wires session storage, token refresh, rate limiting and the summarize pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

#![deny(unsafe_code)]

//! # LightRead
//!
//! Background-process core of the LightRead summarizer. A page selection
//! travels through a fixed pipeline before it reaches the remote API:
//!
//! 1. **Validate** the trimmed text against the size bounds
//! 2. **Rate limit** the action locally (sliding window per action key)
//! 3. **Authenticate** with a valid token, refreshing it at most once at a
//!    time no matter how many requests discover the expiry together
//! 4. **Send** the request, retrying exactly once after a 401
//! 5. **Classify** the outcome into one user-facing error taxonomy
//!
//! Session state lives in a persistent key-value store and is mirrored in
//! memory by [`session::AuthStateManager`]. Other contexts (popup, page
//! overlays) are kept in sync through [`bus::CrossContextBus`].
//!
//! ## Architecture
//!
//! - **session**: store abstraction, auth state manager, refresh coordinator
//! - **rate_limiting**: sliding-window limiter keyed by action
//! - **api**: remote API trait and its `reqwest` implementation
//! - **pipeline**: the summarize / regenerate / save request flows
//! - **bus**: typed cross-context messages
//! - **background**: message router tying everything together

/// Wall-clock abstraction used for token expiry and rate-limit windows
pub mod clock;

/// Error types for the orchestration layer
pub mod errors;

/// Environment-driven client configuration
pub mod config;

/// Structured logging setup
pub mod logging;

/// Shared helpers
pub mod utils;

/// Sliding-window rate limiter
pub mod rate_limiting;

/// Persistent session storage, auth state and token refresh
pub mod session;

/// Remote summarization API client
pub mod api;

/// Cross-context message bus
pub mod bus;

/// Page-side rendering seam
pub mod surface;

/// Summarize, regenerate and save request flows
pub mod pipeline;

/// Background message router
pub mod background;

pub use lightread_core::{constants, models};
