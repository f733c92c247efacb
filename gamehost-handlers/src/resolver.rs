//! Network resolver
//!
//! Finds the public IPv4 address of a freshly launched task. EC2-backed tasks
//! go container instance -> instance -> interfaces; FARGATE tasks carry their
//! ENI id in the event attachments. An event of any other launch type
//! resolves to no interfaces rather than an error.

use std::net::Ipv4Addr;

use tracing::{debug, warn};

use crate::cloud::{CloudControl, NetworkInterface};
use crate::error::CloudError;
use crate::types::{Attachment, TaskStateChangeDetail, LAUNCH_TYPE_EC2, LAUNCH_TYPE_FARGATE};

const ENI_ATTACHMENT_TYPES: [&str; 2] = ["ElasticNetworkInterface", "eni"];
const ENI_DETAIL_NAME: &str = "networkInterfaceId";

/// Where to look for a launched task's network interfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkAttachment {
    Ec2Instance {
        cluster: String,
        container_instance: String,
    },
    ElasticNetworkInterface {
        eni_id: String,
    },
}

impl NetworkAttachment {
    pub fn from_event(detail: &TaskStateChangeDetail) -> Option<Self> {
        match detail.launch_type.as_deref() {
            Some(LAUNCH_TYPE_EC2) => Some(NetworkAttachment::Ec2Instance {
                cluster: detail.cluster_arn.clone()?,
                container_instance: detail.container_instance_arn.clone()?,
            }),
            Some(LAUNCH_TYPE_FARGATE) => {
                find_eni_id(&detail.attachments).map(|eni_id| NetworkAttachment::ElasticNetworkInterface {
                    eni_id: eni_id.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// ENI id from the first ENI attachment that names one
pub fn find_eni_id(attachments: &[Attachment]) -> Option<&str> {
    attachments
        .iter()
        .filter(|a| ENI_ATTACHMENT_TYPES.contains(&a.kind.as_str()))
        .flat_map(|a| a.details.iter())
        .find(|d| d.name == ENI_DETAIL_NAME)
        .map(|d| d.value.as_str())
        .filter(|id| !id.is_empty())
}

/// Network interfaces of the task described by the event
pub async fn resolve_interfaces(
    cloud: &dyn CloudControl,
    detail: &TaskStateChangeDetail,
) -> Result<Vec<NetworkInterface>, CloudError> {
    let launch_type = detail.launch_type.as_deref().unwrap_or("<none>");
    debug!(launch_type, "found {} event", launch_type);

    match NetworkAttachment::from_event(detail) {
        Some(NetworkAttachment::Ec2Instance {
            cluster,
            container_instance,
        }) => {
            let instance_id = cloud
                .describe_container_instance(&cluster, &container_instance)
                .await?;
            debug!(%instance_id, "resolved container instance");
            cloud.describe_instance_network_interfaces(&instance_id).await
        }
        Some(NetworkAttachment::ElasticNetworkInterface { eni_id }) => {
            let interface = cloud.describe_network_interface(&eni_id).await?;
            Ok(vec![interface])
        }
        None => {
            debug!(launch_type, "no network attachment in event");
            Ok(Vec::new())
        }
    }
}

/// Public IPv4 of the first interface, if it has one
pub fn public_ip_from_interfaces(interfaces: &[NetworkInterface]) -> Option<Ipv4Addr> {
    let interface = interfaces.first()?;
    let raw = interface.public_ip.as_deref()?;
    match raw.parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            warn!(public_ip = raw, interface = ?interface.id, "ignoring unparseable public IP");
            None
        }
    }
}

pub async fn resolve_public_address(
    cloud: &dyn CloudControl,
    detail: &TaskStateChangeDetail,
) -> Result<Option<Ipv4Addr>, CloudError> {
    let interfaces = resolve_interfaces(cloud, detail).await?;
    Ok(public_ip_from_interfaces(&interfaces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CloudCall, InMemoryCloud};
    use crate::types::AttachmentDetail;

    fn eni_attachment(kind: &str, eni: &str) -> Attachment {
        Attachment {
            kind: kind.to_string(),
            details: vec![
                AttachmentDetail {
                    name: "subnetId".to_string(),
                    value: "subnet-1".to_string(),
                },
                AttachmentDetail {
                    name: ENI_DETAIL_NAME.to_string(),
                    value: eni.to_string(),
                },
            ],
        }
    }

    fn ec2_detail() -> TaskStateChangeDetail {
        TaskStateChangeDetail {
            launch_type: Some("EC2".to_string()),
            cluster_arn: Some("arn:aws:ecs:us-west-1:123:cluster/game".to_string()),
            container_instance_arn: Some("arn:aws:ecs:us-west-1:123:ci/abc".to_string()),
            ..Default::default()
        }
    }

    fn fargate_detail(attachments: Vec<Attachment>) -> TaskStateChangeDetail {
        TaskStateChangeDetail {
            launch_type: Some("FARGATE".to_string()),
            attachments,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ec2_path() {
        let cloud = InMemoryCloud::new()
            .with_container_instance(
                "arn:aws:ecs:us-west-1:123:cluster/game",
                "arn:aws:ecs:us-west-1:123:ci/abc",
                "i-1",
            )
            .with_instance_interfaces("i-1", vec![NetworkInterface::new("eni-1", Some("3.3.3.3"))]);

        let ip = resolve_public_address(&cloud, &ec2_detail()).await.unwrap();
        assert_eq!(ip, Some(Ipv4Addr::new(3, 3, 3, 3)));
        assert_eq!(
            cloud.calls(),
            vec![
                CloudCall::DescribeContainerInstance {
                    cluster: "arn:aws:ecs:us-west-1:123:cluster/game".to_string(),
                    container_instance: "arn:aws:ecs:us-west-1:123:ci/abc".to_string(),
                },
                CloudCall::DescribeInstanceNetworkInterfaces {
                    instance_id: "i-1".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_eni_path() {
        let cloud = InMemoryCloud::new()
            .with_network_interface(NetworkInterface::new("eni-9", Some("4.4.4.4")));
        let detail = fargate_detail(vec![eni_attachment("ElasticNetworkInterface", "eni-9")]);

        let ip = resolve_public_address(&cloud, &detail).await.unwrap();
        assert_eq!(ip, Some(Ipv4Addr::new(4, 4, 4, 4)));
    }

    #[tokio::test]
    async fn test_unknown_launch_type_has_no_interfaces() {
        let cloud = InMemoryCloud::new();
        let detail = TaskStateChangeDetail {
            launch_type: Some("EXTERNAL".to_string()),
            ..Default::default()
        };

        assert!(resolve_interfaces(&cloud, &detail).await.unwrap().is_empty());
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ec2_event_missing_container_instance() {
        let cloud = InMemoryCloud::new();
        let mut detail = ec2_detail();
        detail.container_instance_arn = None;

        assert_eq!(resolve_public_address(&cloud, &detail).await.unwrap(), None);
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error() {
        let cloud = InMemoryCloud::new();
        let err = resolve_public_address(&cloud, &ec2_detail()).await.unwrap_err();
        assert!(matches!(err, CloudError::NotFound { kind: "container instance", .. }));
    }

    #[test]
    fn test_find_eni_id() {
        assert_eq!(find_eni_id(&[eni_attachment("eni", "eni-7")]), Some("eni-7"));
        assert_eq!(
            find_eni_id(&[
                eni_attachment("Volume", "vol-1"),
                eni_attachment("ElasticNetworkInterface", "eni-8"),
            ]),
            Some("eni-8")
        );
        assert_eq!(find_eni_id(&[eni_attachment("eni", "")]), None);
        assert_eq!(find_eni_id(&[]), None);

        let no_details = Attachment {
            kind: "eni".to_string(),
            details: Vec::new(),
        };
        assert_eq!(find_eni_id(&[no_details]), None);
    }

    #[test]
    fn test_only_first_interface_counts() {
        let interfaces = vec![
            NetworkInterface::new("eni-1", None),
            NetworkInterface::new("eni-2", Some("5.5.5.5")),
        ];
        assert_eq!(public_ip_from_interfaces(&interfaces), None);
        assert_eq!(public_ip_from_interfaces(&[]), None);
        assert_eq!(
            public_ip_from_interfaces(&[NetworkInterface::new("eni-1", Some("not-an-ip"))]),
            None
        );
    }
}
