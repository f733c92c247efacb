//! Launch-event DNS update handler
//!
//! Resolves the public IP of a task that just reached RUNNING and upserts
//! `hostname.domain` to it. Every failure past configuration is logged and
//! reported in the outcome instead of raised: the next launch retries.

use tracing::{error, info};

use crate::cloud::CloudControl;
use crate::dns;
use crate::error::{HandlerError, HandlerResult};
use crate::names;
use crate::resolver::{public_ip_from_interfaces, resolve_interfaces};
use crate::types::{DnsUpdateOutcome, HandlerConfig, SkipReason, TaskStateChangeEvent};

/// Handler name for registration and dispatch
pub const NAME: &str = names::handlers::ECS_UPDATE_DNS;

#[tracing::instrument(
    name = "ecs_update_dns",
    skip_all,
    fields(launch_type = event.detail.launch_type.as_deref().unwrap_or("<none>"))
)]
pub async fn handle(
    cloud: &dyn CloudControl,
    config: &HandlerConfig,
    event: &TaskStateChangeEvent,
) -> HandlerResult<DnsUpdateOutcome> {
    let hostname = config.hostname.as_deref().ok_or(HandlerError::MissingTarget {
        handler: NAME,
        field: "hostname",
    })?;
    let zone = config
        .hosted_zone_id
        .as_deref()
        .ok_or(HandlerError::MissingTarget {
            handler: NAME,
            field: "hosted zone",
        })?;

    let skipped = |reason: SkipReason| DnsUpdateOutcome::Skipped {
        hostname: hostname.to_string(),
        reason,
    };

    if !event.detail.is_running() {
        let last_status = event.detail.last_status.clone();
        let desired_status = event.detail.desired_status.clone();
        info!(
            hostname,
            last_status = last_status.as_deref().unwrap_or("<none>"),
            desired_status = desired_status.as_deref().unwrap_or("<none>"),
            "ignoring task that is not running"
        );
        return Ok(skipped(SkipReason::NotRunning {
            last_status,
            desired_status,
        }));
    }

    let interfaces = match resolve_interfaces(cloud, &event.detail).await {
        Ok(interfaces) => interfaces,
        Err(e) => {
            error!(hostname, error = %e, "unable to set IP for {}. Interface lookup failed", hostname);
            return Ok(skipped(SkipReason::LookupFailed {
                error: e.to_string(),
            }));
        }
    };

    if interfaces.is_empty() {
        error!(hostname, "unable to set IP for {}. No interfaces found.", hostname);
        return Ok(skipped(SkipReason::NoInterfaces));
    }

    let Some(ip) = public_ip_from_interfaces(&interfaces) else {
        error!(hostname, "unable to set IP for {}. No public IP associations found", hostname);
        return Ok(skipped(SkipReason::NoPublicIp));
    };

    let domain = match &config.domain {
        Some(domain) => domain.clone(),
        None => match dns::zone_domain(cloud, zone).await {
            Ok(domain) => domain,
            Err(e) => {
                error!(hostname, zone, error = %e, "unable to set IP for {}", hostname);
                return Ok(DnsUpdateOutcome::Failed {
                    hostname: hostname.to_string(),
                    fqdn: None,
                    error: e.to_string(),
                });
            }
        },
    };

    info!(
        %ip,
        hostname,
        domain = %domain,
        "Found and using IP {} for DNS record ({}) in domain {}",
        ip,
        hostname,
        domain
    );
    let fqdn = dns::fqdn(hostname, &domain);

    match dns::upsert_a_record(cloud, zone, &fqdn, ip, config.dns_ttl_seconds).await {
        Ok(()) => Ok(DnsUpdateOutcome::Updated {
            fqdn,
            ip: ip.to_string(),
            ttl: config.dns_ttl_seconds,
        }),
        Err(e) => {
            error!(fqdn = %fqdn, error = %e, "unable to set IP for {}", fqdn);
            Ok(DnsUpdateOutcome::Failed {
                hostname: hostname.to_string(),
                fqdn: Some(fqdn),
                error: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCloud;
    use crate::types::TaskStateChangeDetail;

    fn config() -> HandlerConfig {
        HandlerConfig {
            hosted_zone_id: Some("Z1".to_string()),
            hostname: Some("minecraft".to_string()),
            ..Default::default()
        }
    }

    fn event(last_status: &str) -> TaskStateChangeEvent {
        TaskStateChangeEvent {
            detail: TaskStateChangeDetail {
                launch_type: Some("EC2".to_string()),
                cluster_arn: Some("cluster".to_string()),
                container_instance_arn: Some("ci/abc".to_string()),
                last_status: Some(last_status.to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_stopped_task_is_ignored() {
        let cloud = InMemoryCloud::new();
        let outcome = handle(&cloud, &config(), &event("STOPPED")).await.unwrap();

        assert!(matches!(
            outcome,
            DnsUpdateOutcome::Skipped {
                reason: SkipReason::NotRunning { .. },
                ..
            }
        ));
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_task_being_stopped_is_ignored() {
        let cloud = InMemoryCloud::new();
        let mut stopping = event("RUNNING");
        stopping.detail.desired_status = Some("STOPPED".to_string());

        let outcome = handle(&cloud, &config(), &stopping).await.unwrap();

        assert_eq!(
            outcome,
            DnsUpdateOutcome::Skipped {
                hostname: "minecraft".to_string(),
                reason: SkipReason::NotRunning {
                    last_status: Some("RUNNING".to_string()),
                    desired_status: Some("STOPPED".to_string()),
                },
            }
        );
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_zone_lookup_failure_has_no_fqdn() {
        let cloud = InMemoryCloud::new()
            .with_container_instance("cluster", "ci/abc", "i-1")
            .with_instance_interfaces(
                "i-1",
                vec![crate::cloud::NetworkInterface::new("eni-1", Some("3.3.3.3"))],
            );

        let outcome = handle(&cloud, &config(), &event("RUNNING")).await.unwrap();

        match outcome {
            DnsUpdateOutcome::Failed { hostname, fqdn, .. } => {
                assert_eq!(hostname, "minecraft");
                assert_eq!(fqdn, None);
            }
            other => panic!("expected failed outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_hostname() {
        let cloud = InMemoryCloud::new();
        let config = HandlerConfig {
            hostname: None,
            ..config()
        };
        let err = handle(&cloud, &config, &event("RUNNING")).await.unwrap_err();
        assert!(matches!(err, HandlerError::MissingTarget { field: "hostname", .. }));
    }

    #[tokio::test]
    async fn test_configured_domain_skips_zone_lookup() {
        let cloud = InMemoryCloud::new()
            .with_hosted_zone("Z1", "example.com.")
            .with_container_instance("cluster", "ci/abc", "i-1")
            .with_instance_interfaces(
                "i-1",
                vec![crate::cloud::NetworkInterface::new("eni-1", Some("3.3.3.3"))],
            );
        let config = HandlerConfig {
            domain: Some("g.example.com".to_string()),
            ..config()
        };

        let outcome = handle(&cloud, &config, &event("RUNNING")).await.unwrap();
        assert_eq!(
            outcome,
            DnsUpdateOutcome::Updated {
                fqdn: "minecraft.g.example.com".to_string(),
                ip: "3.3.3.3".to_string(),
                ttl: 60,
            }
        );
        assert!(!cloud
            .calls()
            .iter()
            .any(|c| matches!(c, crate::memory::CloudCall::GetHostedZoneDomain { .. })));
    }
}
