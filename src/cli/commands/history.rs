//! History Command
//!
//! Print, follow or clear the current conversation.

use std::time::Duration;

use crate::chat::{ChatSession, PollConfig};
use crate::cli::ui::output::Output;
use crate::cli::util::CommandContext;
use crate::client::SupportBackend;
use crate::types::{ChatBubble, Result, same_conversation, to_bubbles};

pub async fn run(ctx: &CommandContext, clear: bool, follow: bool) -> Result<()> {
    let output = Output::new();

    if clear {
        ctx.client.clear_history().await?;
        output.success("Conversation cleared");
        return Ok(());
    }

    if follow {
        return follow_history(ctx).await;
    }

    let snapshot = ctx.client.history().await?;
    let bubbles = to_bubbles(&snapshot);
    if bubbles.is_empty() {
        output.info("No messages yet");
        return Ok(());
    }

    for bubble in &bubbles {
        output.bubble(bubble);
    }
    Ok(())
}

/// Print new bubbles as the background refresh picks them up, until Ctrl-C
async fn follow_history(ctx: &CommandContext) -> Result<()> {
    let output = Output::new();
    let interval = Duration::from_millis(ctx.config.chat.history_refresh_ms);

    let session = ChatSession::new(ctx.backend(), PollConfig::from(&ctx.config.chat));
    let watcher = session.watch_history(interval);
    output.info("Following conversation (Ctrl-C to stop)");

    let mut shown: Vec<ChatBubble> = Vec::new();
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let current = session.messages();
                if same_conversation(&shown, &current) {
                    continue;
                }

                let kept = common_prefix(&shown, &current);
                if kept < shown.len() {
                    output.section("Conversation replaced");
                }
                for bubble in &current[kept..] {
                    output.bubble(bubble);
                }
                shown = current;
            }
        }
    }

    watcher.abort();
    Ok(())
}

/// Leading bubbles with the same role and text in both lists
fn common_prefix(a: &[ChatBubble], b: &[ChatBubble]) -> usize {
    a.iter()
        .zip(b)
        .take_while(|(x, y)| x.role == y.role && x.text == y.text)
        .count()
}
