// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
// ABOUTME: Output formatting helpers for lightread-cli
// ABOUTME: Consistent display of summaries, session status and summary options

use lightread::background::SessionStatus;
use lightread::models::{SummaryOptions, SummaryResult};

/// Print a summary with its source and usage
pub fn display_summary(result: &SummaryResult) {
    println!("{}", result.summary);
    println!("{}", "-".repeat(60));
    if let Some(url) = &result.source_url {
        println!("Source: {url}");
    }
    println!("Characters summarized: {}", result.character_count);
    if let Some(usage) = &result.usage {
        println!(
            "Daily summaries: {}/{}",
            usage.daily_summaries.current, usage.daily_summaries.limit
        );
    }
}

/// Print the session status
pub fn display_status(status: &SessionStatus) {
    if !status.logged_in {
        println!("Not logged in. Run `lightread-cli login` to sign in.");
        return;
    }
    println!("Logged in as {}", status.email.as_deref().unwrap_or("unknown"));
    if let Some(expires) = status.expires_at {
        println!("Token expires: {}", expires.format("%Y-%m-%d %H:%M UTC"));
    }
    match status.plan {
        Some(plan) => println!("Plan: {plan}"),
        None => println!("Plan: unavailable"),
    }
}

/// Print regenerate choices
pub fn display_options(options: &SummaryOptions) {
    println!("Tones: {}", options.tones.join(", "));
    println!("Difficulties: {}", options.difficulties.join(", "));
}
