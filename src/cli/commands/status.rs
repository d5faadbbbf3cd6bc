//! Status Command
//!
//! Show the customer status panel: cached payload and overrides layered
//! over live ring status.

use tracing::warn;

use super::overrides;
use crate::cli::ui::output::Output;
use crate::cli::util::CommandContext;
use crate::client::SupportBackend;
use crate::overrides::{DisplayStatus, effective_data};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, format: &str) -> Result<()> {
    let payload = ctx.cache.load_payload();
    let current = overrides::current(ctx).await;
    let effective = effective_data(payload.as_ref(), &current);

    let ring = match ctx.client.ring_status().await {
        Ok(ring) => ring,
        Err(e) => {
            warn!("Ring status unavailable: {}", e);
            None
        }
    };

    let status = DisplayStatus::compose(&effective, ring.as_ref());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let output = Output::new();
    output.header("Customer Status");
    for (label, value) in status.rows() {
        output.field(label, &value);
    }

    output.section("Sources");
    output.field(
        "Payload",
        if payload.is_some() { "cached" } else { "none" },
    );
    output.field("Ring status", if ring.is_some() { "live" } else { "unavailable" });
    output.field(
        "Overrides",
        &format!(
            "{} active{}",
            current.count(),
            if current.overrides_enabled {
                ""
            } else {
                " (disabled)"
            }
        ),
    );
    output.field("User", ctx.client.user_id().as_str());
    Ok(())
}
