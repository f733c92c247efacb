//! Cloud Control API seam
//!
//! The handlers only ever talk to the provider through [`CloudControl`].
//! [`crate::aws_client::AwsCloud`] backs it with the AWS SDK and
//! [`crate::memory::InMemoryCloud`] with an in-process fake.

use async_trait::async_trait;
use gamehost_models::DnsRecord;
use serde::{Deserialize, Serialize};

use crate::error::CloudError;

/// A network interface as seen by the resolver
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkInterface {
    pub id: Option<String>,
    /// Public IPv4 from the interface's association, if any
    pub public_ip: Option<String>,
}

impl NetworkInterface {
    pub fn new(id: impl Into<String>, public_ip: Option<&str>) -> Self {
        Self {
            id: Some(id.into()),
            public_ip: public_ip.map(str::to_string),
        }
    }
}

/// Capability set the control loop needs from the provider
#[async_trait]
pub trait CloudControl: Send + Sync {
    /// Resolve a container instance to the id of the machine backing it
    async fn describe_container_instance(
        &self,
        cluster: &str,
        container_instance: &str,
    ) -> Result<String, CloudError>;

    async fn describe_instance_network_interfaces(
        &self,
        instance_id: &str,
    ) -> Result<Vec<NetworkInterface>, CloudError>;

    async fn describe_network_interface(&self, eni_id: &str) -> Result<NetworkInterface, CloudError>;

    async fn set_group_desired_capacity(&self, group: &str, desired: i32) -> Result<(), CloudError>;

    async fn set_service_desired_count(
        &self,
        cluster: &str,
        service: &str,
        desired: i32,
    ) -> Result<(), CloudError>;

    /// Domain name of a hosted zone, as the provider reports it
    async fn get_hosted_zone_domain(&self, zone_id: &str) -> Result<String, CloudError>;

    /// Create-or-replace a single record
    async fn upsert_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), CloudError>;
}
