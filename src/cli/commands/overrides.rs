//! Overrides Command
//!
//! Inspect and edit agent overrides. The backend copy is authoritative; the
//! local cache keeps a fallback copy that is used when the backend is
//! unreachable.
//!
//! Usage:
//!   ringdesk overrides show [-f json]
//!   ringdesk overrides set <section> <key> <value>
//!   ringdesk overrides clear <section> [key]
//!   ringdesk overrides enable | disable
//!   ringdesk overrides save
//!   ringdesk overrides keys <section> [filter]

use tracing::warn;

use super::context::sync_layers;
use crate::cli::ui::output::Output;
use crate::cli::util::CommandContext;
use crate::client::SupportBackend;
use crate::overrides::{
    KeyInfo, OverrideSection, Overrides, RING_BATTERY_KEYS, RING_DEBUG_KEYS, filter_kustomer_keys,
    parse_override_value,
};
use crate::types::Result;

/// Backend copy, else the cached copy, else empty defaults
pub async fn current(ctx: &CommandContext) -> Overrides {
    match ctx.client.load_overrides().await {
        Ok(overrides) => overrides,
        Err(e) => {
            warn!("Failed to load overrides from backend: {}", e);
            ctx.cache.load_overrides().unwrap_or_default()
        }
    }
}

pub async fn show(ctx: &CommandContext, format: &str) -> Result<()> {
    let overrides = current(ctx).await;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&overrides)?);
        return Ok(());
    }

    let output = Output::new();
    output.header(&format!(
        "Overrides ({}, {} active)",
        if overrides.overrides_enabled {
            "enabled"
        } else {
            "disabled"
        },
        overrides.count()
    ));

    for section in [
        OverrideSection::Debug,
        OverrideSection::Battery,
        OverrideSection::Kustomer,
    ] {
        let entries = overrides.section(section);
        output.section(&section.to_string());
        if entries.is_empty() {
            println!("  (none)");
        }
        for (key, value) in entries {
            output.field(key, &value.to_string());
        }
    }
    Ok(())
}

pub async fn set(ctx: &CommandContext, section: OverrideSection, key: &str, raw: &str) -> Result<()> {
    let next = current(ctx)
        .await
        .set(section, key, parse_override_value(raw));
    apply(ctx, next).await?;
    Output::new().success(&format!("Set {}.{}", section, key));
    Ok(())
}

pub async fn clear(ctx: &CommandContext, section: OverrideSection, key: Option<&str>) -> Result<()> {
    let base = current(ctx).await;
    let next = match key {
        Some(key) => base.clear(section, key),
        None => base.clear_all(section),
    };
    apply(ctx, next).await?;

    let target = match key {
        Some(key) => format!("{}.{}", section, key),
        None => format!("all {} overrides", section),
    };
    Output::new().success(&format!("Cleared {}", target));
    Ok(())
}

pub async fn set_enabled(ctx: &CommandContext, enabled: bool) -> Result<()> {
    let next = current(ctx).await.with_enabled(enabled);
    apply(ctx, next).await?;
    Output::new().success(if enabled {
        "Overrides enabled"
    } else {
        "Overrides disabled"
    });
    Ok(())
}

/// Push the locally cached copy to the backend
pub async fn save(ctx: &CommandContext) -> Result<()> {
    let output = Output::new();
    let Some(cached) = ctx.cache.load_overrides() else {
        output.info("No cached overrides to save");
        return Ok(());
    };
    apply(ctx, cached).await
}

/// Cache, persist and re-sync the customer context
async fn apply(ctx: &CommandContext, next: Overrides) -> Result<()> {
    let output = Output::new();
    ctx.cache.save_overrides(&next);

    match ctx.client.save_overrides(&next).await {
        Ok(true) => output.success("Overrides saved"),
        Ok(false) => output.warning("Backend did not persist overrides; kept local copy"),
        Err(e) => output.warning(&format!("Saved locally only: {}", e.user_message())),
    }

    let payload = ctx.cache.load_payload();
    sync_layers(ctx, payload.as_ref(), &next).await
}

pub fn keys(section: OverrideSection, filter: Option<&str>) -> Result<()> {
    let entries: Vec<&KeyInfo> = match section {
        OverrideSection::Debug => RING_DEBUG_KEYS.iter().collect(),
        OverrideSection::Battery => RING_BATTERY_KEYS.iter().collect(),
        OverrideSection::Kustomer => filter_kustomer_keys(filter.unwrap_or("")),
    };

    let output = Output::new();
    output.header(&format!("{} keys ({})", section, entries.len()));
    for info in entries {
        println!(
            "  {:<32} {} {}",
            console::style(info.key).bold(),
            info.desc,
            console::style(format!("(e.g. {})", info.example)).dim()
        );
    }
    Ok(())
}
