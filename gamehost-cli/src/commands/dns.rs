use anyhow::{Context, Result};
use gamehost_handlers::names::handlers;
use gamehost_handlers::{DnsUpdateOutcome, HandlerOutput};

use crate::commands::{aws_registry, describe, print_output, read_event};
use crate::config::Config;

/// Launch pipeline: resolve the task's public IP and upsert the game record.
/// A skipped or failed update is reported, not raised.
pub async fn run_update_dns(config: &Config, game: Option<&str>, event: &str) -> Result<()> {
    let event = read_event(event)?;
    let registry = aws_registry(config.handler_config(game)?).await;

    let output = registry
        .dispatch(handlers::ECS_UPDATE_DNS, event)
        .await
        .context("DNS update failed")?;

    match &output {
        HandlerOutput::Dns(DnsUpdateOutcome::Updated { .. }) => {
            tracing::info!("{}", describe(&output))
        }
        _ => tracing::warn!("{}", describe(&output)),
    }
    print_output(&output)
}
