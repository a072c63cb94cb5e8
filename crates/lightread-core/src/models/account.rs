// ABOUTME: Account settings, plan limits and display theme
// ABOUTME: Settings fall back to fixed defaults when the server omits fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lenient;
use crate::constants::default_settings;

/// Overlay color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light colors
    #[default]
    Light,
    /// Dark colors
    Dark,
    /// Follow the operating system preference
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        })
    }
}

/// Summary preferences returned by `GET /user/settings`.
///
/// Each field falls back to its default on its own: a missing, `null`,
/// empty or unrecognised value replaces only that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UserSettingsRepr")]
pub struct UserSettings {
    /// Summary length preference
    pub preferred_summary_length: String,
    /// Overlay theme
    pub theme: Theme,
    /// Summary tone (pro)
    pub summary_tone: String,
    /// Comprehension level (pro)
    pub summary_difficulty: String,
    /// Whether the page URL is kept when saving
    pub save_source_url: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            preferred_summary_length: default_settings::SUMMARY_LENGTH.to_owned(),
            theme: Theme::Light,
            summary_tone: default_settings::SUMMARY_TONE.to_owned(),
            summary_difficulty: default_settings::SUMMARY_DIFFICULTY.to_owned(),
            save_source_url: default_settings::SAVE_SOURCE_URL,
        }
    }
}

#[derive(Deserialize)]
struct UserSettingsRepr {
    #[serde(default, deserialize_with = "lenient")]
    preferred_summary_length: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    theme: Option<Theme>,
    #[serde(default, deserialize_with = "lenient")]
    summary_tone: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    summary_difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    save_source_url: Option<bool>,
}

impl From<UserSettingsRepr> for UserSettings {
    fn from(repr: UserSettingsRepr) -> Self {
        let or_default = |value: Option<String>, default: &str| {
            value
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        Self {
            preferred_summary_length: or_default(
                repr.preferred_summary_length,
                default_settings::SUMMARY_LENGTH,
            ),
            theme: repr.theme.unwrap_or_default(),
            summary_tone: or_default(repr.summary_tone, default_settings::SUMMARY_TONE),
            summary_difficulty: or_default(
                repr.summary_difficulty,
                default_settings::SUMMARY_DIFFICULTY,
            ),
            save_source_url: repr
                .save_source_url
                .unwrap_or(default_settings::SAVE_SOURCE_URL),
        }
    }
}

/// Subscription tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// Free tier
    #[default]
    Free,
    /// Paid individual tier
    Pro,
    /// Organization tier
    Enterprise,
    /// Any tier this client does not know; treated as free
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
            Self::Unknown => "unknown",
        })
    }
}

impl PlanType {
    /// Whether pro-only options (tone, difficulty, regenerate) are available
    #[must_use]
    pub const fn is_pro(self) -> bool {
        matches!(self, Self::Pro | Self::Enterprise)
    }
}

/// Plan and quota information from `GET /user/limits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLimits {
    /// Subscription tier
    pub plan_type: PlanType,
    /// Largest accepted selection for this plan
    #[serde(default)]
    pub max_text_length: Option<u64>,
    /// Daily summary quota for this plan
    #[serde(default)]
    pub daily_summaries: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_fill_missing_fields_with_defaults() {
        let settings: UserSettings = serde_json::from_value(json!({
            "user_id": "u1",
            "preferred_summary_length": "short",
            "theme": "dark"
        }))
        .unwrap();
        assert_eq!(settings.preferred_summary_length, "short");
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.summary_tone, "neutral");
        assert_eq!(settings.summary_difficulty, "normal");
        assert!(settings.save_source_url);
    }

    #[test]
    fn test_bad_field_only_resets_that_field() {
        let settings: UserSettings = serde_json::from_value(json!({
            "preferred_summary_length": "short",
            "summary_tone": null,
            "summary_difficulty": "",
            "theme": "sepia",
            "save_source_url": false
        }))
        .unwrap();
        assert_eq!(settings.preferred_summary_length, "short");
        assert_eq!(settings.summary_tone, "neutral");
        assert_eq!(settings.summary_difficulty, "normal");
        assert_eq!(settings.theme, Theme::Light);
        assert!(!settings.save_source_url);

        let settings: UserSettings =
            serde_json::from_value(json!({"save_source_url": "yes", "summary_tone": 3})).unwrap();
        assert_eq!(settings, UserSettings::default());
    }

    #[test]
    fn test_default_settings() {
        let settings = UserSettings::default();
        assert_eq!(settings.preferred_summary_length, "medium");
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.summary_tone, "neutral");
        assert_eq!(settings.summary_difficulty, "normal");
        assert!(settings.save_source_url);
    }

    #[test]
    fn test_plan_types() {
        let limits: UserLimits =
            serde_json::from_value(json!({"plan_type": "enterprise", "daily_summaries": 1000}))
                .unwrap();
        assert!(limits.plan_type.is_pro());
        assert_eq!(limits.daily_summaries, Some(1000));

        let limits: UserLimits = serde_json::from_value(json!({"plan_type": "platinum"})).unwrap();
        assert_eq!(limits.plan_type, PlanType::Unknown);
        assert!(!limits.plan_type.is_pro());
        assert!(!PlanType::Free.is_pro());
    }
}
