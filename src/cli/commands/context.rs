//! Context Command
//!
//! Load a customer payload and push the merged customer context to the
//! backend.

use std::path::Path;

use tracing::{debug, warn};

use super::overrides;
use crate::cli::ui::output::Output;
use crate::cli::util::CommandContext;
use crate::client::SupportBackend;
use crate::overrides::{ContextLayers, CustomerPayload, Overrides, parse_payload};
use crate::types::{DeskError, Result};

/// Parse the payload file, cache it and push payload plus overrides
pub async fn push(ctx: &CommandContext, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| DeskError::validation(format!("Cannot read {}: {}", file.display(), e)))?;
    let payload = parse_payload(&text)?;
    ctx.cache.save_payload(&payload);

    let current = overrides::current(ctx).await;
    let merged = ContextLayers::new(Some(&payload), &current).merge();
    ctx.client.set_context(&merged).await?;

    Output::new().success(&format!("Pushed context with {} fields", merged.len()));
    Ok(())
}

pub async fn show(ctx: &CommandContext) -> Result<()> {
    let context = ctx.client.get_context().await?;
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

pub async fn clear(ctx: &CommandContext) -> Result<()> {
    ctx.cache.clear_payload();
    ctx.client.clear_context().await?;
    Output::new().success("Context cleared");
    Ok(())
}

/// Re-push the layered context after an override change, when there is
/// anything to push and overrides are enabled. Failures only warn.
pub async fn sync_layers(
    ctx: &CommandContext,
    payload: Option<&CustomerPayload>,
    overrides: &Overrides,
) -> Result<()> {
    let layers = ContextLayers::new(payload, overrides);
    if !layers.should_sync() {
        debug!("Nothing to sync to the backend context");
        return Ok(());
    }

    if let Err(e) = ctx.client.set_context(&layers.merge()).await {
        warn!("Context sync failed: {}", e);
    }
    Ok(())
}
