//! Unified Error Type System
//!
//! Centralized error types for the whole crate.
//!
//! ## Error Tiers
//!
//! - **Transport**: the network call itself failed (connect, timeout, TLS)
//! - **Upstream**: the backend answered with a non-success status
//! - **Validation**: local input rejected before any network call
//! - **Local**: cache, config or filesystem problems on this machine
//!
//! Nothing here is fatal to a running session: the chat exchange and the
//! gateway convert every tier into a message or a safe default.

use thiserror::Error;

// =============================================================================
// Error Tiers
// =============================================================================

/// Where an error originated, used to decide masking and retry behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTier {
    /// Network/transport failure - the user may retry
    Transport,
    /// Upstream answered with a non-success status
    Upstream,
    /// Local validation failed before any request was made
    Validation,
    /// Local resource failure (cache, config, IO)
    Local,
}

impl std::fmt::Display for ErrorTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Upstream => write!(f, "UPSTREAM"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Local => write!(f, "LOCAL"),
        }
    }
}

// =============================================================================
// DeskError
// =============================================================================

#[derive(Debug, Error)]
pub enum DeskError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // -------------------------------------------------------------------------
    // Upstream Errors
    // -------------------------------------------------------------------------
    /// Backend replied with a non-success status
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    /// Background task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, DeskError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl DeskError {
    /// Create an upstream status error
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify this error into one of the handling tiers
    pub fn tier(&self) -> ErrorTier {
        match self {
            Self::Http(_) => ErrorTier::Transport,
            Self::Upstream { .. } => ErrorTier::Upstream,
            Self::Validation(_) | Self::Json(_) | Self::UnknownDocument(_) => {
                ErrorTier::Validation
            }
            Self::Io(_)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Task(_) => ErrorTier::Local,
        }
    }

    /// Transport failures can be retried by the user; everything else needs
    /// a change of input or state first.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.tier(), ErrorTier::Transport | ErrorTier::Upstream)
    }

    /// Status code for upstream errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for an error banner.
    ///
    /// Upstream errors show the upstream body when present, otherwise the
    /// generic `Request failed (<status>)` form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream { status, body } if body.trim().is_empty() => {
                format!("Request failed ({})", status)
            }
            Self::Upstream { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for DeskError {
    fn from(err: tokio::task::JoinError) -> Self {
        DeskError::Task(err.to_string())
    }
}

impl From<r2d2::Error> for DeskError {
    fn from(err: r2d2::Error) -> Self {
        DeskError::Storage(format!("Connection pool error: {}", err))
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| DeskError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| DeskError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_tier_display() {
        assert_eq!(ErrorTier::Transport.to_string(), "TRANSPORT");
        assert_eq!(ErrorTier::Upstream.to_string(), "UPSTREAM");
        assert_eq!(ErrorTier::Validation.to_string(), "VALIDATION");
    }

    #[test]
    fn test_tier_classification() {
        assert_eq!(DeskError::upstream(500, "boom").tier(), ErrorTier::Upstream);
        assert_eq!(
            DeskError::validation("empty").tier(),
            ErrorTier::Validation
        );
        assert_eq!(
            DeskError::UnknownDocument("nope".into()).tier(),
            ErrorTier::Validation
        );
        assert_eq!(DeskError::Config("x".into()).tier(), ErrorTier::Local);
    }

    #[test]
    fn test_recoverable() {
        assert!(DeskError::upstream(503, "").is_recoverable());
        assert!(!DeskError::validation("bad json").is_recoverable());
        assert!(!DeskError::Storage("locked".into()).is_recoverable());
    }

    #[test]
    fn test_user_message_prefers_body() {
        assert_eq!(
            DeskError::upstream(500, "backend exploded").user_message(),
            "backend exploded"
        );
        assert_eq!(
            DeskError::upstream(503, "  ").user_message(),
            "Request failed (503)"
        );
    }

    #[test]
    fn test_status() {
        assert_eq!(DeskError::upstream(404, "missing").status(), Some(404));
        assert_eq!(DeskError::validation("x").status(), None);
    }

    #[test]
    fn test_result_ext_context() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk full"));
        let err = res.with_context("Failed to write cache").unwrap_err();
        assert!(err.to_string().contains("Failed to write cache"));
        assert!(err.to_string().contains("disk full"));
    }
}
