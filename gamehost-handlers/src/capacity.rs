//! Capacity controller
//!
//! Converges an autoscaling group or a service to the desired size for a
//! start/stop command. Each call is one write with no read first and no
//! retry, so repeating it is harmless. Provider errors are logged and
//! handed back to the caller.

use gamehost_models::CapacityCommand;
use tracing::{error, info};

use crate::cloud::CloudControl;
use crate::error::CloudError;
use crate::types::CapacityOutput;

fn action_label(action: Option<&str>) -> &str {
    action.unwrap_or("stop")
}

/// Set an autoscaling group's desired capacity to 1 (start) or 0 (anything else)
pub async fn set_compute_group_capacity(
    cloud: &dyn CloudControl,
    group: &str,
    action: Option<&str>,
) -> Result<CapacityOutput, CloudError> {
    let command = CapacityCommand::from_action(action);
    let desired = command.desired();
    info!(
        action = action_label(action),
        %command,
        group,
        "received {} for {}",
        action_label(action),
        group
    );

    if let Err(e) = cloud.set_group_desired_capacity(group, desired).await {
        error!(group, desired, error = %e, "failed to update autoscaling group");
        return Err(e);
    }

    info!(
        group,
        desired,
        "updated desired capacity to {} for autoscaling group {}",
        desired,
        group
    );
    Ok(CapacityOutput {
        target: group.to_string(),
        command,
        desired,
    })
}

/// Set a service's desired task count to 1 (start) or 0 (anything else)
pub async fn set_service_task_count(
    cloud: &dyn CloudControl,
    cluster: &str,
    service: &str,
    action: Option<&str>,
) -> Result<CapacityOutput, CloudError> {
    let command = CapacityCommand::from_action(action);
    let desired = command.desired();
    info!(
        action = action_label(action),
        %command,
        cluster,
        service,
        "received {} for {} and service {}",
        action_label(action),
        cluster,
        service
    );

    if let Err(e) = cloud.set_service_desired_count(cluster, service, desired).await {
        error!(cluster, service, desired, error = %e, "failed to update service");
        return Err(e);
    }

    info!(
        cluster,
        service,
        desired,
        "updated desired count to {} for cluster {}",
        desired,
        cluster
    );
    Ok(CapacityOutput {
        target: format!("{}/{}", cluster, service),
        command,
        desired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCloud;

    #[tokio::test]
    async fn test_repeated_start_is_idempotent() {
        let cloud = InMemoryCloud::new().with_group("game-asg");
        for _ in 0..3 {
            let out = set_compute_group_capacity(&cloud, "game-asg", Some("start"))
                .await
                .unwrap();
            assert_eq!(out.desired, 1);
            assert_eq!(cloud.desired_capacity("game-asg"), Some(1));
        }

        for _ in 0..2 {
            set_compute_group_capacity(&cloud, "game-asg", Some("stop"))
                .await
                .unwrap();
            assert_eq!(cloud.desired_capacity("game-asg"), Some(0));
        }
    }

    #[tokio::test]
    async fn test_unknown_actions_stop() {
        let cloud = InMemoryCloud::new().with_group("game-asg");
        for action in [None, Some(""), Some("Start"), Some("restart")] {
            set_compute_group_capacity(&cloud, "game-asg", Some("start"))
                .await
                .unwrap();
            let out = set_compute_group_capacity(&cloud, "game-asg", action)
                .await
                .unwrap();
            assert_eq!(out.command, CapacityCommand::Stop);
            assert_eq!(cloud.desired_capacity("game-asg"), Some(0));
        }
    }

    #[tokio::test]
    async fn test_service_count() {
        let cloud = InMemoryCloud::new().with_service("arn:cluster/game", "game-service");

        let out = set_service_task_count(&cloud, "arn:cluster/game", "game-service", Some("start"))
            .await
            .unwrap();
        assert_eq!(out.target, "arn:cluster/game/game-service");
        assert_eq!(cloud.desired_count("arn:cluster/game", "game-service"), Some(1));

        set_service_task_count(&cloud, "arn:cluster/game", "game-service", None)
            .await
            .unwrap();
        assert_eq!(cloud.desired_count("arn:cluster/game", "game-service"), Some(0));
    }

    #[tokio::test]
    async fn test_unknown_group_propagates() {
        let cloud = InMemoryCloud::new();
        let err = set_compute_group_capacity(&cloud, "missing", Some("start"))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::NotFound { kind: "autoscaling group", .. }));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let cloud = InMemoryCloud::new().with_service("c", "s");
        cloud.fail_operation("UpdateService", "AccessDeniedException");

        let err = set_service_task_count(&cloud, "c", "s", Some("start"))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Provider { operation: "UpdateService", .. }));
        assert_eq!(cloud.desired_count("c", "s"), None);
    }
}
