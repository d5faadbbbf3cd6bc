//! Sessions Command
//!
//! Browse and manage archived support conversations.

use serde_json::{Value, json};

use crate::cli::ui::output::Output;
use crate::cli::util::CommandContext;
use crate::client::SupportBackend;
use crate::types::{
    DeskError, HistorySnapshot, Result, SessionId, format_relative, to_bubbles,
};

pub async fn list(ctx: &CommandContext, format: &str) -> Result<()> {
    let sessions = ctx.client.list_sessions().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    let output = Output::new();
    if sessions.is_empty() {
        output.info("No archived sessions");
        return Ok(());
    }

    output.header(&format!("Sessions ({})", sessions.len()));
    let now = chrono::Utc::now();
    for session in &sessions {
        let label = session
            .summary
            .as_deref()
            .or(session.preview.as_deref())
            .unwrap_or("(no summary)");
        println!(
            "  {}  {}  {} messages  {}",
            console::style(&session.id).bold(),
            format_relative(&session.updated_at, now),
            session.message_count,
            label
        );
    }
    Ok(())
}

pub async fn show(ctx: &CommandContext, id: &str) -> Result<()> {
    let detail = ctx.client.get_session(&SessionId::from(id)).await?;
    let output = Output::new();

    // Session messages share the history normalisation rules
    let messages: Vec<Value> = detail
        .messages
        .iter()
        .map(|m| json!({ "role": m.role, "content": m.content }))
        .collect();
    let bubbles = to_bubbles(&HistorySnapshot { messages });

    output.header(&format!("Session {}", detail.id.as_deref().unwrap_or(id)));
    if bubbles.is_empty() {
        output.info("Session has no messages");
    }
    for bubble in &bubbles {
        output.bubble(bubble);
    }
    Ok(())
}

pub async fn create(ctx: &CommandContext, body: Option<&str>) -> Result<()> {
    let body: Value = match body {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| DeskError::validation(format!("Invalid JSON: {}", e)))?,
        None => json!({}),
    };
    if !body.is_object() {
        return Err(DeskError::validation("Session body must be a JSON object"));
    }

    let created = ctx.client.create_session(body).await?;
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

pub async fn delete(ctx: &CommandContext, id: &str) -> Result<()> {
    ctx.client.delete_session(&SessionId::from(id)).await?;
    Output::new().success(&format!("Deleted session {}", id));
    Ok(())
}
