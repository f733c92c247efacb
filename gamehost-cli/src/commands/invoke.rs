use anyhow::{Context, Result};
use gamehost_handlers::names::handlers;
use gamehost_handlers::registry::HandlerRegistry;

use crate::commands::{aws_registry, describe, print_output, read_event};
use crate::config::Config;

pub async fn run_invoke(config: &Config, game: Option<&str>, handler: &str, event: &str) -> Result<()> {
    let Some(full_name) = HandlerRegistry::resolve(handler) else {
        let known: Vec<&str> = handlers::ALL
            .iter()
            .filter_map(|name| name.rsplit("::").next())
            .collect();
        anyhow::bail!("Unknown handler '{}'. Known handlers: {}", handler, known.join(", "));
    };

    let event = read_event(event)?;
    let registry = aws_registry(config.handler_config(game)?).await;

    tracing::debug!(handler = full_name, "dispatching event");
    let output = registry
        .dispatch(full_name, event)
        .await
        .with_context(|| format!("{} failed", full_name))?;

    tracing::info!(handler = full_name, "{}", describe(&output));
    print_output(&output)
}
