//! Handler registry
//!
//! Routes a raw JSON event to a handler by name. Names are the constants in
//! [`crate::names::handlers`]; the trailing segment alone (e.g.
//! `ecs-update-dns`) is accepted too.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cloud::CloudControl;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{asg_capacity, service_capacity, timer_tick, update_dns};
use crate::names::handlers;
use crate::types::{HandlerConfig, HandlerOutput};

/// Handlers bound to one cloud backend and one configuration
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use gamehost_handlers::memory::InMemoryCloud;
/// use gamehost_handlers::registry::HandlerRegistry;
/// use gamehost_handlers::HandlerConfig;
///
/// # async fn example() -> Result<(), gamehost_handlers::HandlerError> {
/// let registry = HandlerRegistry::new(Arc::new(InMemoryCloud::new()), HandlerConfig::default());
/// registry
///     .dispatch("timer-tick", serde_json::json!({"action": "stop"}))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HandlerRegistry {
    cloud: Arc<dyn CloudControl>,
    config: HandlerConfig,
}

impl HandlerRegistry {
    pub fn new(cloud: Arc<dyn CloudControl>, config: HandlerConfig) -> Self {
        Self { cloud, config }
    }

    /// Full handler name for a full or short name
    pub fn resolve(name: &str) -> Option<&'static str> {
        handlers::ALL
            .iter()
            .copied()
            .find(|full| *full == name || full.rsplit("::").next() == Some(name))
    }

    pub async fn dispatch(&self, name: &str, event: serde_json::Value) -> HandlerResult<HandlerOutput> {
        let handler =
            Self::resolve(name).ok_or_else(|| HandlerError::UnknownHandler(name.to_string()))?;
        let cloud = self.cloud.as_ref();

        match handler {
            handlers::ASG_SET_DESIRED_CAPACITY => {
                let tick = parse_event(handler, event)?;
                asg_capacity::handle(cloud, &self.config, &tick)
                    .await
                    .map(HandlerOutput::Capacity)
            }
            handlers::ECS_DESIRED_TASK_COUNT => {
                let tick = parse_event(handler, event)?;
                service_capacity::handle(cloud, &self.config, &tick)
                    .await
                    .map(HandlerOutput::Capacity)
            }
            handlers::ECS_UPDATE_DNS => {
                let launch = parse_event(handler, event)?;
                update_dns::handle(cloud, &self.config, &launch)
                    .await
                    .map(HandlerOutput::Dns)
            }
            handlers::TIMER_TICK => {
                let tick = parse_event(handler, event)?;
                timer_tick::handle(cloud, &self.config, &tick)
                    .await
                    .map(HandlerOutput::Tick)
            }
            _ => Err(HandlerError::UnknownHandler(name.to_string())),
        }
    }
}

fn parse_event<T: DeserializeOwned>(handler: &'static str, event: serde_json::Value) -> HandlerResult<T> {
    serde_json::from_value(event).map_err(|source| HandlerError::InvalidEvent { handler, source })
}
