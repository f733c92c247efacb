//! Autoscaling group start/stop handler

use crate::capacity::set_compute_group_capacity;
use crate::cloud::CloudControl;
use crate::error::{HandlerError, HandlerResult};
use crate::names;
use crate::types::{CapacityOutput, HandlerConfig, TimerTick};

/// Handler name for registration and dispatch
pub const NAME: &str = names::handlers::ASG_SET_DESIRED_CAPACITY;

#[tracing::instrument(name = "asg_set_desired_capacity", skip_all)]
pub async fn handle(
    cloud: &dyn CloudControl,
    config: &HandlerConfig,
    event: &TimerTick,
) -> HandlerResult<CapacityOutput> {
    let group = event
        .asg
        .as_deref()
        .or(config.autoscaling_group.as_deref())
        .ok_or(HandlerError::MissingTarget {
            handler: NAME,
            field: "autoscaling group",
        })?;

    Ok(set_compute_group_capacity(cloud, group, event.action.as_deref()).await?)
}
