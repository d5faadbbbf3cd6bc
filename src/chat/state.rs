//! Chat view state and exchange bookkeeping types.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::config::ChatConfig;
use crate::types::ChatBubble;

/// What the UI renders: the conversation, the waiting flag and the error
/// banner. Replaced field-by-field under one lock; the message list is
/// always swapped as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatView {
    pub messages: Vec<ChatBubble>,
    pub waiting: bool,
    pub error: Option<String>,
}

pub type SharedView = Arc<RwLock<ChatView>>;

/// Steps of a single send, in the order they can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    Idle,
    Submitting,
    SubmitFailed,
    Submitted,
    Polling,
    Resolved,
    Exhausted,
    FinalRefresh,
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::SubmitFailed => "submit_failed",
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Resolved => "resolved",
            Self::Exhausted => "exhausted",
            Self::FinalRefresh => "final_refresh",
        };
        f.write_str(name)
    }
}

/// How a poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The reply showed up on attempt `attempts`
    Resolved { attempts: u32 },
    /// Every attempt ran without seeing a reply
    Exhausted { attempts: u32 },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Resolved { attempts } | Self::Exhausted { attempts } => *attempts,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Poll loop tuning
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before each attempt
    pub interval: Duration,
    pub max_attempts: u32,
    /// Still poll when the submit itself failed
    pub poll_after_failed_submit: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for PollConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_poll_attempts,
            poll_after_failed_submit: config.poll_after_failed_submit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_config_from_chat_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.max_attempts, 30);
        assert!(config.poll_after_failed_submit);
    }

    #[test]
    fn test_outcome_attempts() {
        assert_eq!(PollOutcome::Resolved { attempts: 2 }.attempts(), 2);
        assert!(!PollOutcome::Exhausted { attempts: 30 }.is_resolved());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ExchangePhase::FinalRefresh.to_string(), "final_refresh");
    }
}
