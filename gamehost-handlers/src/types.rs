//! Events, handler configuration and outputs

use gamehost_models::{CapacityCommand, GameProperties};
use serde::{Deserialize, Serialize};

use crate::dns::DEFAULT_TTL_SECONDS;

// ============================================================================
// Configuration
// ============================================================================

/// Identifiers the handlers act on, produced by the provisioning backend and
/// passed in explicitly at construction time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandlerConfig {
    /// Autoscaling group backing the cluster
    pub autoscaling_group: Option<String>,
    /// Cluster ARN or name
    pub cluster: Option<String>,
    /// Service whose desired count is toggled
    pub service: Option<String>,
    /// Hosted zone holding the game record (id, path or ARN)
    pub hosted_zone_id: Option<String>,
    /// DNS label of the game, without the domain
    pub hostname: Option<String>,
    /// Domain to append to the hostname; looked up from the zone when absent
    pub domain: Option<String>,
    pub dns_ttl_seconds: i64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            autoscaling_group: None,
            cluster: None,
            service: None,
            hosted_zone_id: None,
            hostname: None,
            domain: None,
            dns_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl HandlerConfig {
    /// Fill DNS settings the config leaves open from a catalog entry
    pub fn with_game(mut self, game: &GameProperties) -> Self {
        if self.hostname.is_none() {
            self.hostname = Some(game.dns_hostname());
        }
        if self.hosted_zone_id.is_none() {
            self.hosted_zone_id = game.hosted_zone.clone();
        }
        if self.domain.is_none() {
            self.domain = game.domain_name.clone();
        }
        self
    }
}

// ============================================================================
// Timer events
// ============================================================================

/// Scheduled start/stop tick. Targets in the event override the configured ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimerTick {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub asg: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
}

impl TimerTick {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Task state change events
// ============================================================================

pub const LAUNCH_TYPE_EC2: &str = "EC2";
pub const LAUNCH_TYPE_FARGATE: &str = "FARGATE";
pub const STATUS_RUNNING: &str = "RUNNING";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStateChangeEvent {
    pub detail: TaskStateChangeDetail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateChangeDetail {
    #[serde(default)]
    pub launch_type: Option<String>,
    #[serde(default)]
    pub cluster_arn: Option<String>,
    #[serde(default)]
    pub container_instance_arn: Option<String>,
    #[serde(default)]
    pub task_arn: Option<String>,
    #[serde(default)]
    pub last_status: Option<String>,
    #[serde(default)]
    pub desired_status: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TaskStateChangeDetail {
    /// Whether the task is RUNNING and meant to stay so. An absent status
    /// does not count against it.
    pub fn is_running(&self) -> bool {
        [&self.last_status, &self.desired_status]
            .into_iter()
            .all(|status| status.as_deref().map_or(true, |s| s == STATUS_RUNNING))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: Vec<AttachmentDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentDetail {
    pub name: String,
    pub value: String,
}

// ============================================================================
// Outputs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityOutput {
    /// Group name, or `cluster/service`
    pub target: String,
    pub command: CapacityCommand,
    pub desired: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The task has not reached RUNNING, or is no longer meant to be running
    NotRunning {
        last_status: Option<String>,
        desired_status: Option<String>,
    },
    NoInterfaces,
    NoPublicIp,
    LookupFailed { error: String },
}

/// Result of one launch-event reconciliation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DnsUpdateOutcome {
    Updated { fqdn: String, ip: String, ttl: i64 },
    /// No address to publish; the record was left untouched
    Skipped { hostname: String, reason: SkipReason },
    /// The provider rejected the zone lookup or the upsert. `fqdn` is absent
    /// when the zone lookup failed before a name could be built.
    Failed {
        hostname: String,
        fqdn: Option<String>,
        error: String,
    },
}

/// Anything a registered handler can return
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HandlerOutput {
    Capacity(CapacityOutput),
    Tick(Vec<CapacityOutput>),
    Dns(DnsUpdateOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_change_from_provider_json() {
        let json = r#"{
            "version": "0",
            "detail-type": "ECS Task State Change",
            "source": "aws.ecs",
            "detail": {
                "clusterArn": "arn:aws:ecs:us-west-1:123:cluster/game",
                "containerInstanceArn": "arn:aws:ecs:us-west-1:123:container-instance/game/abc",
                "launchType": "EC2",
                "lastStatus": "RUNNING",
                "desiredStatus": "RUNNING",
                "attachments": [
                    {
                        "id": "a1",
                        "type": "eni",
                        "status": "ATTACHED",
                        "details": [{"name": "networkInterfaceId", "value": "eni-9"}]
                    }
                ]
            }
        }"#;

        let event: TaskStateChangeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.detail.launch_type.as_deref(), Some(LAUNCH_TYPE_EC2));
        assert_eq!(event.detail.last_status.as_deref(), Some("RUNNING"));
        assert_eq!(event.detail.attachments[0].kind, "eni");
        assert_eq!(event.detail.attachments[0].details[0].value, "eni-9");
    }

    #[test]
    fn test_timer_tick_tolerates_missing_action() {
        let tick: TimerTick = serde_json::from_str(r#"{"asg": "game-asg"}"#).unwrap();
        assert_eq!(tick.action, None);
        assert_eq!(tick.asg.as_deref(), Some("game-asg"));
    }

    #[test]
    fn test_config_takes_dns_settings_from_game() {
        let game: GameProperties = serde_json::from_value(serde_json::json!({
            "name": "Minecraft",
            "container_image": "itzg/minecraft-server",
            "container_path": "/data",
            "hosted_zone": "Z1",
            "domain_name": "g.example.com"
        }))
        .unwrap();

        let config = HandlerConfig {
            hostname: Some("mc".to_string()),
            ..Default::default()
        }
        .with_game(&game);

        assert_eq!(config.hostname.as_deref(), Some("mc"));
        assert_eq!(config.hosted_zone_id.as_deref(), Some("Z1"));
        assert_eq!(config.domain.as_deref(), Some("g.example.com"));
        assert_eq!(config.dns_ttl_seconds, DEFAULT_TTL_SECONDS);
    }

    #[test]
    fn test_dns_outcome_serialization() {
        let outcome = DnsUpdateOutcome::Skipped {
            hostname: "minecraft".to_string(),
            reason: SkipReason::NoInterfaces,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "skipped");
        assert_eq!(value["reason"]["kind"], "no_interfaces");
    }

    #[test]
    fn test_is_running_checks_both_statuses() {
        let detail = |last: Option<&str>, desired: Option<&str>| TaskStateChangeDetail {
            last_status: last.map(str::to_string),
            desired_status: desired.map(str::to_string),
            ..Default::default()
        };

        assert!(detail(Some("RUNNING"), Some("RUNNING")).is_running());
        assert!(detail(Some("RUNNING"), None).is_running());
        assert!(detail(None, None).is_running());
        assert!(!detail(Some("RUNNING"), Some("STOPPED")).is_running());
        assert!(!detail(Some("PENDING"), Some("RUNNING")).is_running());
    }
}
