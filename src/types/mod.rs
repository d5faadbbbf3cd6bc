pub mod error;
pub mod message;
pub mod session;

pub use error::{DeskError, ErrorTier, Result, ResultExt};
pub use message::{
    ChatBubble, ChatSubmission, HistorySnapshot, Role, format_escape_characters, is_renderable,
    same_conversation, to_bubbles,
};
pub use session::{SessionDetail, SessionMessage, SessionSummary, format_relative};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Identity sent to the backend in the `x-user-id` header
///
/// Requests without a header are attributed to [`UserId::DEFAULT`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh client identity (`user-<32 hex chars>`)
    pub fn generate() -> Self {
        Self(format!("user-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Use the header value when present and non-blank, else `default`
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Type-safe wrapper for archived session IDs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
