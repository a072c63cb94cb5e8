// ABOUTME: Error taxonomy for the summarize pipeline and its collaborators
// ABOUTME: Re-exports the user-facing SummarizeError and the narrower auth errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

//! # Error Types
//!
//! - `SummarizeError` - terminal states of a pipeline invocation, each
//!   convertible to a short message for the page surface
//! - `ValidationFailure` - why a selection was rejected before any I/O
//! - `RefreshFailure` - outcome of a failed token refresh, shared by every
//!   caller waiting on the same refresh
//! - `ClaimsError` - why a token payload could not be decoded

/// Token refresh and claim decoding errors
pub mod auth;

/// Pipeline error taxonomy
pub mod summarize;

pub use auth::{ClaimsError, RefreshFailure};
pub use summarize::{ErrorKind, RateLimitScope, SummarizeError, ValidationFailure};
