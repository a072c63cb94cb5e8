// ABOUTME: LightRead CLI - drive the background core from a terminal
// ABOUTME: Handles login, logout, session status, summarize, regenerate and save
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
//!
//! Usage:
//! ```bash
//! # Sign in (session is kept in the LightRead config directory)
//! lightread-cli login --email reader@example.com --password secret
//!
//! # Show the current session and plan
//! lightread-cli status
//!
//! # Summarize a file and save the result to the account
//! lightread-cli summarize --file article.txt --url https://example.com/article --save
//!
//! # Regenerate with a different tone (pro accounts)
//! lightread-cli regenerate --file article.txt --tone casual --difficulty simple
//!
//! # List tone and difficulty choices (pro accounts)
//! lightread-cli options
//!
//! # Sign out
//! lightread-cli logout
//! ```

mod commands;
mod helpers;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lightread::background::BackgroundContext;
use lightread::clock::SystemClock;
use lightread::config::ClientConfig;
use lightread::logging::LoggingConfig;
use lightread::session::{JsonStore, StorageArea};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "lightread-cli",
    about = "LightRead command-line client",
    long_about = "Summarize text with LightRead from a terminal, using the same session, rate limits and retry rules as the browser extension."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Server URL override
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Storage directory override
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the current session, refreshing the token if needed
    Status,

    /// Summarize text
    Summarize {
        #[command(flatten)]
        input: TextInput,

        /// Page the text came from
        #[arg(long)]
        url: Option<String>,

        /// Save the summary to the account afterwards
        #[arg(long)]
        save: bool,
    },

    /// Summarize again with a tone and difficulty override (pro)
    Regenerate {
        #[command(flatten)]
        input: TextInput,

        /// Page the text came from
        #[arg(long)]
        url: Option<String>,

        /// Tone override
        #[arg(long)]
        tone: String,

        /// Difficulty override
        #[arg(long)]
        difficulty: String,
    },

    /// List tone and difficulty choices (pro)
    Options,
}

/// Text given inline or read from a file
#[derive(Args)]
#[group(required = true, multiple = false)]
struct TextInput {
    /// Text to summarize
    #[arg(long)]
    text: Option<String>,

    /// File containing the text to summarize
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TextInput {
    async fn read(self) -> Result<String> {
        match (self.text, self.file) {
            (Some(text), _) => Ok(text),
            (None, Some(path)) => tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            (None, None) => anyhow::bail!("Either --text or --file is required"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env_or_level("warn");
    if cli.verbose {
        "debug".clone_into(&mut logging.level);
    }
    logging.init()?;

    let mut config = ClientConfig::from_env()?;
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }
    if let Some(storage_dir) = cli.storage_dir {
        config.storage_dir = storage_dir;
    }
    config.validate()?;
    debug!(server = %config.server_url, storage = %config.storage_dir.display(), "Configuration loaded");

    let local_store = JsonStore::open(StorageArea::Local, config.local_store_path())
        .await
        .context("Failed to open session storage")?;
    let context = BackgroundContext::from_config(
        &config,
        Arc::new(local_store),
        Arc::new(JsonStore::in_memory(StorageArea::Session)),
        Arc::new(SystemClock),
    );
    context.start().await?;

    let code = match cli.command {
        Command::Login { email, password } => {
            commands::session::login(&context, &email, &password).await?;
            ExitCode::SUCCESS
        }
        Command::Logout => {
            commands::session::logout(&context).await?;
            ExitCode::SUCCESS
        }
        Command::Status => {
            commands::session::status(&context).await;
            ExitCode::SUCCESS
        }
        Command::Summarize { input, url, save } => {
            let text = input.read().await?;
            commands::summarize::summarize(&context, text, url, save).await
        }
        Command::Regenerate {
            input,
            url,
            tone,
            difficulty,
        } => {
            let text = input.read().await?;
            commands::summarize::regenerate(&context, text, url, tone, difficulty).await
        }
        Command::Options => commands::summarize::options(&context).await,
    };

    Ok(code)
}
