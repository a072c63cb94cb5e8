// ABOUTME: Application constants for text bounds, rate limits, endpoints and storage keys
// ABOUTME: Single source of truth for values shared between the pipeline and its tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead

/// Bounds applied to the selected text before anything leaves the process
pub mod text_limits {
    /// Minimum number of characters (after trimming) accepted for summarization
    pub const MIN_TEXT_CHARS: usize = 100;
    /// Maximum number of characters (after trimming) accepted for summarization
    pub const MAX_TEXT_CHARS: usize = 50_000;
}

/// Local rate limiting defaults
pub mod rate_limits {
    /// Action key for summarize requests
    pub const SUMMARIZE_ACTION: &str = "summarize";
    /// Action key for saving a displayed summary
    pub const SAVE_ACTION: &str = "save";
    /// Action key for regenerating a summary with a tone/difficulty override
    pub const REGENERATE_ACTION: &str = "regenerate";

    /// Summaries admitted per window
    pub const SUMMARIZE_MAX_REQUESTS: u32 = 5;
    /// Sliding window for summaries
    pub const SUMMARIZE_WINDOW_MS: u64 = 60_000;
    /// Cooldown between two save or regenerate actions
    pub const ACTION_COOLDOWN_MS: u64 = 12_000;
}

/// Remote API paths, relative to the configured server URL
pub mod endpoints {
    /// Token refresh (bearer: current token)
    pub const AUTH_REFRESH: &str = "/auth/refresh";
    /// Email/password login
    pub const AUTH_LOGIN: &str = "/auth/login";
    /// Summary generation
    pub const SUMMARIZE: &str = "/summarize";
    /// Per-user summary preferences
    pub const USER_SETTINGS: &str = "/user/settings";
    /// Plan and quota information
    pub const USER_LIMITS: &str = "/user/limits";
    /// Persist a generated summary
    pub const SUMMARIES_SAVE: &str = "/summaries/save";
    /// Tone/difficulty enumerations for pro controls
    pub const ENUM_VALUES: &str = "/rpc/get_enum_values";
}

/// Keys of the persistent and session-scoped key-value stores
pub mod storage_keys {
    /// Persistent: bearer token
    pub const TOKEN: &str = "token";
    /// Persistent: user object
    pub const USER: &str = "user";
    /// Session-scoped: opaque session object pushed by the website
    pub const SESSION: &str = "session";
    /// Session-scoped: token pushed alongside the session
    pub const JWT_TOKEN: &str = "jwtToken";
}

/// HTTP client defaults
pub mod network {
    /// Server used when no override is configured
    pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
    /// Whole-request timeout
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
    /// TCP/TLS connect timeout
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    /// User agent sent with every request
    pub const USER_AGENT: &str = concat!("LightRead/", env!("CARGO_PKG_VERSION"));
}

/// Server-side error codes with dedicated handling
pub mod error_codes {
    /// Returned when a pro-only option is used from a free account
    pub const PRO_FEATURE: &str = "PRO_FEATURE";
}

/// Enumeration names served by the options endpoint
pub mod enum_names {
    /// Tone choices
    pub const SUMMARY_TONE: &str = "summary_tone";
    /// Difficulty choices
    pub const SUMMARY_DIFFICULTY: &str = "summary_difficulty";
}

/// Cross-context bus sizing
pub mod bus {
    /// Buffered events per subscriber before the slowest one starts lagging
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
}

/// Fallback user settings used when the settings endpoint is unavailable
pub mod default_settings {
    /// Summary length
    pub const SUMMARY_LENGTH: &str = "medium";
    /// Summary tone
    pub const SUMMARY_TONE: &str = "neutral";
    /// Comprehension level
    pub const SUMMARY_DIFFICULTY: &str = "normal";
    /// Whether the page URL is kept when saving
    pub const SAVE_SOURCE_URL: bool = true;
}
