// ABOUTME: Core types and constants for the LightRead background core
// ABOUTME: Foundation crate with the error taxonomy, data models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

#![deny(unsafe_code)]

//! # LightRead Core
//!
//! Foundation crate providing the shared types of the LightRead background
//! process. It has no I/O of its own: everything here is plain data, error
//! types and constants that the orchestration crate builds on.
//!
//! ## Modules
//!
//! - **errors**: User-facing error taxonomy (`SummarizeError`) and the
//!   narrower refresh/claims errors that feed into it
//! - **constants**: Text bounds, rate-limit defaults, endpoints, storage keys
//! - **models**: Auth state, token claims, summary request/result, settings

/// Error taxonomy for the summarize pipeline and its collaborators
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models shared by every background component
pub mod models;
