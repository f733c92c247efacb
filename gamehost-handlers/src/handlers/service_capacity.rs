//! Service desired-count start/stop handler

use crate::capacity::set_service_task_count;
use crate::cloud::CloudControl;
use crate::error::{HandlerError, HandlerResult};
use crate::names;
use crate::types::{CapacityOutput, HandlerConfig, TimerTick};

/// Handler name for registration and dispatch
pub const NAME: &str = names::handlers::ECS_DESIRED_TASK_COUNT;

/// Cluster and service for a tick, event values first
pub(crate) fn service_target<'a>(
    config: &'a HandlerConfig,
    event: &'a TimerTick,
) -> Option<(&'a str, &'a str)> {
    let cluster = event.cluster.as_deref().or(config.cluster.as_deref())?;
    let service = event.service_name.as_deref().or(config.service.as_deref())?;
    Some((cluster, service))
}

#[tracing::instrument(name = "ecs_desired_task_count", skip_all)]
pub async fn handle(
    cloud: &dyn CloudControl,
    config: &HandlerConfig,
    event: &TimerTick,
) -> HandlerResult<CapacityOutput> {
    let (cluster, service) = service_target(config, event).ok_or(HandlerError::MissingTarget {
        handler: NAME,
        field: "cluster and service",
    })?;

    Ok(set_service_task_count(cloud, cluster, service, event.action.as_deref()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCloud;

    #[tokio::test]
    async fn test_event_targets() {
        let cloud = InMemoryCloud::new().with_service("cluster-arn", "game-service");
        let event = TimerTick {
            action: Some("start".to_string()),
            cluster: Some("cluster-arn".to_string()),
            service_name: Some("game-service".to_string()),
            ..Default::default()
        };

        let out = handle(&cloud, &HandlerConfig::default(), &event).await.unwrap();
        assert_eq!(out.desired, 1);
        assert_eq!(cloud.desired_count("cluster-arn", "game-service"), Some(1));
    }

    #[test]
    fn test_service_target_needs_both() {
        let config = HandlerConfig {
            cluster: Some("cluster-arn".to_string()),
            ..Default::default()
        };
        assert_eq!(service_target(&config, &TimerTick::new("stop")), None);

        let event = TimerTick {
            service_name: Some("game-service".to_string()),
            ..Default::default()
        };
        assert_eq!(
            service_target(&config, &event),
            Some(("cluster-arn", "game-service"))
        );
    }
}
