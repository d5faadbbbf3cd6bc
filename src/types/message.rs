//! Chat message types and history normalisation.
//!
//! The backend owns the conversation; the client only holds a derivable copy
//! of it built from history snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Author of a chat bubble
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    Draft,
    /// Any role the backend sends that we don't model; rendered as-is
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Draft => "draft",
            Role::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "draft" => Role::Draft,
            _ => Role::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered chat message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatBubble {
    pub id: String,
    pub role: Role,
    pub text: String,
}

impl ChatBubble {
    /// Optimistic bubble for a message the user is sending
    pub fn user(text: &str) -> Self {
        Self {
            id: format!("user-{}", now_millis()),
            role: Role::User,
            text: format_escape_characters(text),
        }
    }
}

/// Raw `GET /api/chat/history` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub messages: Vec<Value>,
}

impl HistorySnapshot {
    /// Build a snapshot from an arbitrary JSON payload.
    ///
    /// A payload without a `messages` array yields an empty snapshot.
    pub fn from_value(value: &Value) -> Self {
        let messages = value
            .get("messages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self { messages }
    }
}

/// Outbound chat submission body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSubmission {
    pub messages: Vec<OutboundMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub role: String,
    pub content: String,
}

impl ChatSubmission {
    pub fn user(text: &str) -> Self {
        Self {
            messages: vec![OutboundMessage {
                role: "user".to_string(),
                content: text.to_string(),
            }],
        }
    }
}

/// Turn literal escape sequences sent by the backend into real characters
pub fn format_escape_characters(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\r", "\r")
        .replace("\\\\", "\\")
}

/// Whether a history entry can be shown: string role and non-blank content
pub fn is_renderable(entry: &Value) -> bool {
    let has_role = entry.get("role").is_some_and(Value::is_string);
    let has_content = entry
        .get("content")
        .and_then(Value::as_str)
        .is_some_and(|c| !c.trim().is_empty());
    has_role && has_content
}

/// Convert a history snapshot into bubbles.
///
/// Non-renderable entries are dropped and consecutive repeats of the same
/// `role:text` collapse into one bubble.
pub fn to_bubbles(snapshot: &HistorySnapshot) -> Vec<ChatBubble> {
    let stamp = now_millis();
    let mut seen: HashSet<String> = HashSet::new();
    let mut result: Vec<ChatBubble> = Vec::new();

    for entry in snapshot.messages.iter().filter(|e| is_renderable(e)) {
        let (Some(role), Some(content)) = (
            entry.get("role").and_then(Value::as_str),
            entry.get("content").and_then(Value::as_str),
        ) else {
            continue;
        };

        let text = format_escape_characters(content);
        let key = format!("{}:{}", role, text);

        if seen.contains(&key) && result.last().is_some_and(|last| last.text == text) {
            continue;
        }

        seen.insert(key);
        result.push(ChatBubble {
            id: format!("history-{}-{}", result.len(), stamp),
            role: Role::from(role),
            text,
        });
    }

    result
}

/// Compare two conversations by role and text only (ids are ignored)
pub fn same_conversation(a: &[ChatBubble], b: &[ChatBubble]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| x.role == y.role && x.text == y.text)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
