//! AWS SDK backed Cloud Control API

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use gamehost_models::{DnsRecord, RecordType};

use crate::cloud::{CloudControl, NetworkInterface};
use crate::dns::normalize_zone_id;
use crate::error::CloudError;

/// Clients for the four services the control loop touches
#[derive(Debug, Clone)]
pub struct AwsCloud {
    autoscaling: aws_sdk_autoscaling::Client,
    ec2: aws_sdk_ec2::Client,
    ecs: aws_sdk_ecs::Client,
    route53: aws_sdk_route53::Client,
}

impl AwsCloud {
    /// Build clients from the ambient AWS configuration (env, profile, IMDS)
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(&config)
    }

    pub fn new(config: &SdkConfig) -> Self {
        Self {
            autoscaling: aws_sdk_autoscaling::Client::new(config),
            ec2: aws_sdk_ec2::Client::new(config),
            ecs: aws_sdk_ecs::Client::new(config),
            route53: aws_sdk_route53::Client::new(config),
        }
    }
}

fn provider_error<E>(operation: &'static str, err: E) -> CloudError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CloudError::Provider {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

fn rr_type(record_type: RecordType) -> RrType {
    match record_type {
        RecordType::A => RrType::A,
    }
}

#[async_trait]
impl CloudControl for AwsCloud {
    async fn describe_container_instance(
        &self,
        cluster: &str,
        container_instance: &str,
    ) -> Result<String, CloudError> {
        let output = self
            .ecs
            .describe_container_instances()
            .cluster(cluster)
            .container_instances(container_instance)
            .send()
            .await
            .map_err(|e| provider_error("DescribeContainerInstances", e))?;

        output
            .container_instances()
            .last()
            .and_then(|ci| ci.ec2_instance_id())
            .map(str::to_string)
            .ok_or_else(|| CloudError::NotFound {
                kind: "container instance",
                id: container_instance.to_string(),
            })
    }

    async fn describe_instance_network_interfaces(
        &self,
        instance_id: &str,
    ) -> Result<Vec<NetworkInterface>, CloudError> {
        let output = self
            .ec2
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| provider_error("DescribeInstances", e))?;

        let instance = output
            .reservations()
            .last()
            .and_then(|r| r.instances().last())
            .ok_or_else(|| CloudError::NotFound {
                kind: "instance",
                id: instance_id.to_string(),
            })?;

        Ok(instance
            .network_interfaces()
            .iter()
            .map(|ni| NetworkInterface {
                id: ni.network_interface_id().map(str::to_string),
                public_ip: ni
                    .association()
                    .and_then(|a| a.public_ip())
                    .map(str::to_string),
            })
            .collect())
    }

    async fn describe_network_interface(&self, eni_id: &str) -> Result<NetworkInterface, CloudError> {
        let output = self
            .ec2
            .describe_network_interfaces()
            .network_interface_ids(eni_id)
            .send()
            .await
            .map_err(|e| provider_error("DescribeNetworkInterfaces", e))?;

        output
            .network_interfaces()
            .first()
            .map(|ni| NetworkInterface {
                id: ni.network_interface_id().map(str::to_string),
                public_ip: ni
                    .association()
                    .and_then(|a| a.public_ip())
                    .map(str::to_string),
            })
            .ok_or_else(|| CloudError::NotFound {
                kind: "network interface",
                id: eni_id.to_string(),
            })
    }

    async fn set_group_desired_capacity(&self, group: &str, desired: i32) -> Result<(), CloudError> {
        self.autoscaling
            .update_auto_scaling_group()
            .auto_scaling_group_name(group)
            .desired_capacity(desired)
            .send()
            .await
            .map_err(|e| provider_error("UpdateAutoScalingGroup", e))?;
        Ok(())
    }

    async fn set_service_desired_count(
        &self,
        cluster: &str,
        service: &str,
        desired: i32,
    ) -> Result<(), CloudError> {
        self.ecs
            .update_service()
            .cluster(cluster)
            .service(service)
            .desired_count(desired)
            .send()
            .await
            .map_err(|e| provider_error("UpdateService", e))?;
        Ok(())
    }

    async fn get_hosted_zone_domain(&self, zone_id: &str) -> Result<String, CloudError> {
        let zone_id = normalize_zone_id(zone_id);
        let output = self
            .route53
            .get_hosted_zone()
            .id(zone_id)
            .send()
            .await
            .map_err(|e| provider_error("GetHostedZone", e))?;

        output
            .hosted_zone()
            .map(|zone| zone.name().to_string())
            .ok_or_else(|| CloudError::NotFound {
                kind: "hosted zone",
                id: zone_id.to_string(),
            })
    }

    async fn upsert_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), CloudError> {
        let value = ResourceRecord::builder()
            .value(&record.value)
            .build()
            .map_err(|e| CloudError::InvalidRequest(e.to_string()))?;

        let record_set = ResourceRecordSet::builder()
            .name(&record.name)
            .r#type(rr_type(record.record_type))
            .ttl(record.ttl)
            .resource_records(value)
            .build()
            .map_err(|e| CloudError::InvalidRequest(e.to_string()))?;

        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set)
            .build()
            .map_err(|e| CloudError::InvalidRequest(e.to_string()))?;

        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(|e| CloudError::InvalidRequest(e.to_string()))?;

        self.route53
            .change_resource_record_sets()
            .hosted_zone_id(normalize_zone_id(zone_id))
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| provider_error("ChangeResourceRecordSets", e))?;
        Ok(())
    }
}
