// ABOUTME: Summary request, response and result payloads
// ABOUTME: Field names follow the remote API's snake_case JSON contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use serde::{Deserialize, Serialize};

use crate::constants::enum_names;

/// Body of `POST /summarize`.
///
/// `override_tone`/`override_difficulty` are only populated for pro-tier
/// accounts or for an explicit regenerate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRequest {
    /// Trimmed, validated selection
    pub text: String,
    /// Page the selection came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Preferred summary length from user settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    /// Tone override
    #[serde(rename = "override_tone", skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    /// Comprehension level override
    #[serde(rename = "override_difficulty", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// One quota counter reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    /// Amount used
    pub current: u64,
    /// Plan limit
    pub limit: u64,
}

/// Quota usage attached to a summarize response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Summaries generated today
    pub daily_summaries: UsageCounter,
    /// Size of this request against the per-request text limit
    pub text_length: UsageCounter,
}

/// Successful `POST /summarize` body
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    /// Generated summary
    pub summary: String,
    /// Quota usage after this request; unreadable usage is dropped, never fatal
    #[serde(default, deserialize_with = "crate::models::lenient")]
    pub usage: Option<UsageSnapshot>,
}

/// A summary ready for display.
///
/// Lives only as long as the overlay showing it; nothing persists it unless
/// the user asks to save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    /// Generated summary
    pub summary: String,
    /// Page the selection came from
    pub source_url: Option<String>,
    /// Characters in the summarized text
    pub character_count: usize,
    /// Text that was summarized, kept for save and regenerate
    pub original_text: String,
    /// Quota usage reported with the summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSnapshot>,
}

/// Body of `POST /summaries/save`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSummaryRequest {
    /// Summary text
    pub summary: String,
    /// Source page, `null` when the user opted out of saving URLs
    pub source_url: Option<String>,
    /// Characters in the original text
    pub character_count: usize,
    /// Summarized text
    pub original_text: String,
}

impl SaveSummaryRequest {
    /// Build the save payload, honouring the `save_source_url` preference
    #[must_use]
    pub fn from_result(result: &SummaryResult, keep_source_url: bool) -> Self {
        Self {
            summary: result.summary.clone(),
            source_url: result.source_url.clone().filter(|_| keep_source_url),
            character_count: result.character_count,
            original_text: result.original_text.clone(),
        }
    }
}

/// One enumeration returned by the options endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumOption {
    /// Enumeration name, e.g. `summary_tone`
    pub enum_name: String,
    /// Allowed values
    #[serde(default)]
    pub enum_values: Vec<String>,
}

/// Choices offered by the pro regenerate controls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryOptions {
    /// Allowed tone overrides
    pub tones: Vec<String>,
    /// Allowed difficulty overrides
    pub difficulties: Vec<String>,
}

impl SummaryOptions {
    /// Pick tone and difficulty lists out of the raw enumerations
    #[must_use]
    pub fn from_enums(enums: &[EnumOption]) -> Self {
        let values_of = |name: &str| {
            enums
                .iter()
                .find(|option| option.enum_name == name)
                .map(|option| option.enum_values.clone())
                .unwrap_or_default()
        };
        Self {
            tones: values_of(enum_names::SUMMARY_TONE),
            difficulties: values_of(enum_names::SUMMARY_DIFFICULTY),
        }
    }
}
