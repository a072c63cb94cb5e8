// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
// ABOUTME: Terminal implementation of the page surface
// ABOUTME: Summaries go to stdout, errors to stderr

use async_trait::async_trait;
use lightread::models::{SummaryResult, Theme};
use lightread::surface::PageSurface;
use tracing::debug;

use super::display::display_summary;

/// Renders the overlay as plain terminal output
pub struct ConsoleSurface;

#[async_trait]
impl PageSurface for ConsoleSurface {
    async fn show_summary(&self, result: &SummaryResult, _token: &str) {
        display_summary(result);
    }

    async fn show_error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    async fn apply_theme(&self, theme: Theme) {
        debug!(%theme, "Terminal output ignores theme changes");
    }
}
