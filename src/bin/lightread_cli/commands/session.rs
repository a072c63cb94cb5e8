// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
// ABOUTME: Login, logout and status commands for lightread-cli
// ABOUTME: Thin wrappers over the background context's session operations

use anyhow::{anyhow, Result};
use lightread::background::BackgroundContext;

use crate::helpers::display::display_status;

/// Sign in and persist the session
pub async fn login(context: &BackgroundContext, email: &str, password: &str) -> Result<()> {
    let state = context
        .login(email, password)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    let email = state.user().map_or(email, |user| user.email.as_str());
    println!("Logged in as {email}");
    Ok(())
}

/// Forget the stored session
pub async fn logout(context: &BackgroundContext) -> Result<()> {
    context.logout().await?;
    println!("Logged out");
    Ok(())
}

/// Print the session status
pub async fn status(context: &BackgroundContext) {
    let status = context.session_status().await;
    display_status(&status);
}
