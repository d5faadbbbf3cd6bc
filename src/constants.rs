//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// Chat exchange constants
pub mod chat {
    /// Delay before each poll attempt (milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 1000;

    /// Maximum poll attempts after a send before giving up
    pub const MAX_POLL_ATTEMPTS: u32 = 30;

    /// Background history refresh interval (milliseconds)
    pub const HISTORY_REFRESH_MS: u64 = 2000;
}

/// Upstream backend constants
pub mod upstream {
    /// Default base for chat, sessions and overrides
    pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

    /// Default base for context and ring status
    pub const DEFAULT_CONTEXT_BASE: &str = "http://localhost:8001";

    /// Request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Header carrying the client identity
    pub const USER_ID_HEADER: &str = "x-user-id";
}

/// Gateway server constants
pub mod gateway {
    /// Default listen address
    pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

    /// Default URL the chat client uses to reach the gateway
    pub const DEFAULT_URL: &str = "http://127.0.0.1:3000";
}

/// Knowledge-base search constants
pub mod search {
    /// Words at or below this length are not indexed
    pub const MIN_WORD_LEN: usize = 3;

    /// Score for a word found in a document title
    pub const TITLE_WEIGHT: u32 = 10;

    /// Score for a word found in body text
    pub const BODY_WEIGHT: u32 = 1;

    /// Maximum ranked hits kept per query
    pub const MAX_RESULTS: usize = 50;

    /// Maximum suggestions shown while typing
    pub const MAX_SUGGESTIONS: usize = 6;

    /// Queries shorter than this produce no suggestions
    pub const MIN_SUGGEST_LEN: usize = 2;

    /// Penalty added when a suggestion matches by id rather than title
    pub const ID_MATCH_PENALTY: usize = 100;
}

/// Local cache keys
pub mod cache_keys {
    pub const USER_TIMEZONE: &str = "user_timezone";
    pub const USER_ID: &str = "support_user_id";
    pub const CUSTOMER_PAYLOAD: &str = "yellow_payload";
    pub const RING_DEBUG_OVERRIDES: &str = "ring_debug_overrides";
    pub const RING_BATTERY_OVERRIDES: &str = "ring_battery_overrides";
    pub const KUSTOMER_OVERRIDES: &str = "kustomer_overrides";
    pub const OVERRIDES_ENABLED: &str = "overrides_enabled";
}
