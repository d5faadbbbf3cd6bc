//! Support session records returned by the backend.

use serde::{Deserialize, Serialize};

/// Archived support conversation (list view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Message inside an archived session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Full session payload from `GET /api/sessions/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
}

/// Human-friendly relative date used by session listings.
///
/// Same day shows `Today at HH:MM`, the day before `Yesterday at HH:MM`,
/// under a week `N days ago`, otherwise `Mon D, YYYY`. Unparsable input is
/// returned unchanged.
pub fn format_relative(date: &str, now: chrono::DateTime<chrono::Utc>) -> String {
    let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(date) else {
        return date.to_string();
    };
    let parsed = parsed.with_timezone(&chrono::Utc);
    let days = (now - parsed).num_days();

    match days {
        0 => format!("Today at {}", parsed.format("%H:%M")),
        1 => format!("Yesterday at {}", parsed.format("%H:%M")),
        2..=6 => format!("{} days ago", days),
        _ => parsed.format("%b %-d, %Y").to_string(),
    }
}
