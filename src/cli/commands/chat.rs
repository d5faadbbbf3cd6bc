//! Chat Command
//!
//! Send one message through the gateway and wait for the support reply.

use tracing::{debug, warn};

use crate::chat::{ChatSession, PollConfig};
use crate::cli::ui::output::Output;
use crate::cli::util::CommandContext;
use crate::client::SupportBackend;
use crate::types::{ChatBubble, Result, Role, format_escape_characters};

pub async fn run(ctx: &CommandContext, message: &str, no_wait: bool) -> Result<()> {
    let output = Output::new();

    sync_timezone(ctx).await;

    let session = ChatSession::new(ctx.backend(), PollConfig::from(&ctx.config.chat));
    session.refresh_history().await;

    let pending = match session.send(message).await {
        Ok(pending) => pending,
        Err(e) => {
            output.error(&session.error().unwrap_or_else(|| e.user_message()));
            if e.is_recoverable() {
                output.info("The support backend may be busy; try again shortly");
            }
            return Err(e);
        }
    };

    if no_wait {
        output.success("Message sent");
        return Ok(());
    }

    output.info("Waiting for a reply...");
    let outcome = pending.wait().await?;
    debug!("Poll finished after {} attempts", outcome.attempts());

    let messages = session.messages();
    let replies = replies_after(&messages, message);

    if outcome.is_resolved() {
        for bubble in replies {
            output.bubble(bubble);
        }
    } else {
        output.warning(&format!(
            "No reply after {} attempts; run `ringdesk history` later",
            outcome.attempts()
        ));
    }
    Ok(())
}

/// Bubbles that follow the last user bubble carrying `sent`
fn replies_after<'a>(messages: &'a [ChatBubble], sent: &str) -> &'a [ChatBubble] {
    let sent = format_escape_characters(sent.trim());
    match messages
        .iter()
        .rposition(|b| b.role == Role::User && b.text == sent)
    {
        Some(pos) => &messages[pos + 1..],
        None => &[],
    }
}

/// Report the local timezone once it is known; failures only warn
async fn sync_timezone(ctx: &CommandContext) {
    let Some(timezone) = ctx
        .cache
        .timezone()
        .or_else(|| std::env::var("TZ").ok().filter(|tz| !tz.trim().is_empty()))
    else {
        return;
    };

    ctx.cache.set_timezone(&timezone);
    if let Err(e) = ctx.client.set_timezone(&timezone).await {
        warn!("Failed to send timezone: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble(role: Role, text: &str) -> ChatBubble {
        ChatBubble {
            id: format!("history-{}", text),
            role,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_replies_after_last_matching_send() {
        let messages = vec![
            bubble(Role::User, "hi"),
            bubble(Role::Assistant, "hello"),
            bubble(Role::User, "hi"),
            bubble(Role::Assistant, "again?"),
        ];
        let replies = replies_after(&messages, " hi ");
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "again?");
    }

    #[test]
    fn test_replies_after_missing_send() {
        let messages = vec![bubble(Role::Assistant, "hello")];
        assert!(replies_after(&messages, "hi").is_empty());
    }
}
