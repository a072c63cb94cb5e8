// ABOUTME: Maps non-success API replies onto the user-facing error taxonomy
// ABOUTME: 429 is rate limiting, 5xx server, PRO_FEATURE code pro-only, other 4xx request errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use crate::api::ApiReply;
use crate::constants::error_codes;
use crate::errors::SummarizeError;

/// Classify a reply that was not a success.
///
/// 5xx bodies are never shown to the user; 4xx bodies are, when they carry
/// an `error` message.
#[must_use]
pub fn classify_failure(reply: &ApiReply) -> SummarizeError {
    let status = reply.status;
    match status {
        401 => SummarizeError::session_expired(),
        429 => SummarizeError::server_rate_limit(reply.error_message()),
        500.. => SummarizeError::Server {
            status,
            message: generic_message(status),
        },
        _ if reply.error_code() == Some(error_codes::PRO_FEATURE) => SummarizeError::pro_feature(),
        _ => SummarizeError::Request {
            status,
            message: reply
                .error_message()
                .unwrap_or_else(|| generic_message(status)),
        },
    }
}

/// Message used when the server did not provide one
#[must_use]
pub fn generic_message(status: u16) -> String {
    match status {
        400 => "The request could not be processed. Please check the selected text.".to_owned(),
        403 => "You do not have access to this feature.".to_owned(),
        404 => "The requested resource was not found.".to_owned(),
        413 => "The selected text is too large to summarize.".to_owned(),
        500..=599 => "The LightRead server ran into a problem. Please try again later.".to_owned(),
        _ => format!("Request failed with status {status}."),
    }
}
