use anyhow::{Context, Result};
use gamehost_handlers::names::handlers;
use gamehost_handlers::TimerTick;

use crate::commands::{aws_registry, describe, print_output};
use crate::config::Config;

pub async fn run_tick(config: &Config, game: Option<&str>, action: Option<String>) -> Result<()> {
    let tick = TimerTick {
        action,
        ..Default::default()
    };
    dispatch(config, game, handlers::TIMER_TICK, tick).await
}

pub async fn run_asg(
    config: &Config,
    game: Option<&str>,
    action: Option<String>,
    group: Option<String>,
) -> Result<()> {
    let tick = TimerTick {
        action,
        asg: group,
        ..Default::default()
    };
    dispatch(config, game, handlers::ASG_SET_DESIRED_CAPACITY, tick).await
}

pub async fn run_service(
    config: &Config,
    game: Option<&str>,
    action: Option<String>,
    cluster: Option<String>,
    service: Option<String>,
) -> Result<()> {
    let tick = TimerTick {
        action,
        cluster,
        service_name: service,
        ..Default::default()
    };
    dispatch(config, game, handlers::ECS_DESIRED_TASK_COUNT, tick).await
}

async fn dispatch(config: &Config, game: Option<&str>, handler: &str, tick: TimerTick) -> Result<()> {
    let registry = aws_registry(config.handler_config(game)?).await;
    let event = serde_json::to_value(&tick)?;

    let output = registry
        .dispatch(handler, event)
        .await
        .with_context(|| format!("{} failed", handler))?;

    tracing::info!(handler, "{}", describe(&output));
    print_output(&output)
}
