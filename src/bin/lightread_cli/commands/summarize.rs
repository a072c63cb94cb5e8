// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
// ABOUTME: Summarize, regenerate and options commands for lightread-cli
// ABOUTME: Runs the request pipeline against a console surface

use std::process::ExitCode;

use lightread::background::BackgroundContext;
use lightread::pipeline::{RegenerateTrigger, SelectionTrigger};

use crate::helpers::console::ConsoleSurface;
use crate::helpers::display::display_options;

/// Summarize `text`, optionally saving the result
pub async fn summarize(
    context: &BackgroundContext,
    text: String,
    source_url: Option<String>,
    save: bool,
) -> ExitCode {
    let surface = ConsoleSurface;
    let trigger = SelectionTrigger { text, source_url };

    let Ok(result) = context.on_context_menu(&trigger, &surface).await else {
        return ExitCode::FAILURE;
    };
    if !save {
        return ExitCode::SUCCESS;
    }

    match context.pipeline().save(&result).await {
        Ok(()) => {
            println!("\nSaved to your LightRead account.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Save failed: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

/// Regenerate with explicit overrides
pub async fn regenerate(
    context: &BackgroundContext,
    original_text: String,
    source_url: Option<String>,
    tone: String,
    difficulty: String,
) -> ExitCode {
    let trigger = RegenerateTrigger {
        original_text,
        source_url,
        tone,
        difficulty,
    };
    match context.on_regenerate(&trigger, &ConsoleSurface).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Print regenerate choices
pub async fn options(context: &BackgroundContext) -> ExitCode {
    match context.pipeline().summary_options().await {
        Some(options) => {
            display_options(&options);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Tone and difficulty options are available for pro accounts only.");
            ExitCode::FAILURE
        }
    }
}
