//! Timer tick fan-out
//!
//! One scheduled tick drives both capacity targets: the service first, then
//! the autoscaling group. Both are attempted even if the first fails; the
//! first error is returned.

use tracing::info;

use crate::capacity::{set_compute_group_capacity, set_service_task_count};
use crate::cloud::CloudControl;
use crate::error::{CloudError, HandlerError, HandlerResult};
use crate::handlers::service_capacity::service_target;
use crate::names;
use crate::types::{CapacityOutput, HandlerConfig, TimerTick};

/// Handler name for registration and dispatch
pub const NAME: &str = names::handlers::TIMER_TICK;

#[tracing::instrument(name = "timer_tick", skip_all, fields(action = event.action.as_deref().unwrap_or("stop")))]
pub async fn handle(
    cloud: &dyn CloudControl,
    config: &HandlerConfig,
    event: &TimerTick,
) -> HandlerResult<Vec<CapacityOutput>> {
    let service = service_target(config, event);
    let group = event.asg.as_deref().or(config.autoscaling_group.as_deref());

    if service.is_none() && group.is_none() {
        return Err(HandlerError::MissingTarget {
            handler: NAME,
            field: "autoscaling group or service",
        });
    }

    let action = event.action.as_deref();
    let mut outputs = Vec::new();
    let mut first_error: Option<CloudError> = None;

    if let Some((cluster, service)) = service {
        match set_service_task_count(cloud, cluster, service, action).await {
            Ok(out) => outputs.push(out),
            Err(e) => first_error = Some(e),
        }
    }

    if let Some(group) = group {
        match set_compute_group_capacity(cloud, group, action).await {
            Ok(out) => outputs.push(out),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => {
            info!(targets = outputs.len(), "timer tick applied");
            Ok(outputs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CloudCall, InMemoryCloud};

    fn config() -> HandlerConfig {
        HandlerConfig {
            autoscaling_group: Some("game-asg".to_string()),
            cluster: Some("game-cluster".to_string()),
            service: Some("game-service".to_string()),
            ..Default::default()
        }
    }

    fn cloud() -> InMemoryCloud {
        InMemoryCloud::new()
            .with_group("game-asg")
            .with_service("game-cluster", "game-service")
    }

    #[tokio::test]
    async fn test_stop_sets_both_to_zero() {
        let cloud = cloud();
        handle(&cloud, &config(), &TimerTick::new("start")).await.unwrap();

        let outputs = handle(&cloud, &config(), &TimerTick::new("stop")).await.unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(cloud.desired_capacity("game-asg"), Some(0));
        assert_eq!(cloud.desired_count("game-cluster", "game-service"), Some(0));
        assert!(!cloud
            .calls()
            .iter()
            .any(|c| matches!(c, CloudCall::UpsertRecord { .. })));
    }

    #[tokio::test]
    async fn test_group_still_set_when_service_fails() {
        let cloud = cloud();
        cloud.fail_operation("UpdateService", "ThrottlingException");

        let err = handle(&cloud, &config(), &TimerTick::new("start")).await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Cloud(CloudError::Provider { operation: "UpdateService", .. })
        ));
        assert_eq!(cloud.desired_capacity("game-asg"), Some(1));
    }

    #[tokio::test]
    async fn test_group_only() {
        let cloud = cloud();
        let config = HandlerConfig {
            autoscaling_group: Some("game-asg".to_string()),
            ..Default::default()
        };

        let outputs = handle(&cloud, &config, &TimerTick::new("start")).await.unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(cloud.desired_count("game-cluster", "game-service"), None);
    }

    #[tokio::test]
    async fn test_no_targets() {
        let cloud = cloud();
        let err = handle(&cloud, &HandlerConfig::default(), &TimerTick::new("start"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MissingTarget { .. }));
        assert!(cloud.calls().is_empty());
    }
}
