// ABOUTME: Page-side rendering seam for summaries, errors and theme changes
// ABOUTME: The overlay itself lives outside this crate; this trait is all the core sees
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use async_trait::async_trait;

use crate::models::{SummaryResult, Theme};

/// Something that can paint the summary overlay into a page.
///
/// Errors arrive here already converted to a short user-facing message.
#[async_trait]
pub trait PageSurface: Send + Sync {
    /// Show a summary. `token` is the bearer token that produced it, for
    /// save and regenerate actions started from the overlay.
    async fn show_summary(&self, result: &SummaryResult, token: &str);

    /// Show an error message in the same overlay
    async fn show_error(&self, message: &str);

    /// Switch the overlay theme
    async fn apply_theme(&self, theme: Theme);
}
