//! In-memory Cloud Control API
//!
//! Holds seeded instance and interface metadata plus the mutable capacity and
//! record tables, and keeps a log of every call. Suitable for tests and local
//! dry runs; nothing leaves the process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use gamehost_models::{DnsRecord, RecordType};

use crate::cloud::{CloudControl, NetworkInterface};
use crate::dns::normalize_zone_id;
use crate::error::CloudError;

/// One recorded call against the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCall {
    DescribeContainerInstance { cluster: String, container_instance: String },
    DescribeInstanceNetworkInterfaces { instance_id: String },
    DescribeNetworkInterface { eni_id: String },
    SetGroupDesiredCapacity { group: String, desired: i32 },
    SetServiceDesiredCount { cluster: String, service: String, desired: i32 },
    GetHostedZoneDomain { zone_id: String },
    UpsertRecord { zone_id: String, name: String, value: String },
}

impl CloudCall {
    fn operation(&self) -> &'static str {
        match self {
            CloudCall::DescribeContainerInstance { .. } => "DescribeContainerInstances",
            CloudCall::DescribeInstanceNetworkInterfaces { .. } => "DescribeInstances",
            CloudCall::DescribeNetworkInterface { .. } => "DescribeNetworkInterfaces",
            CloudCall::SetGroupDesiredCapacity { .. } => "UpdateAutoScalingGroup",
            CloudCall::SetServiceDesiredCount { .. } => "UpdateService",
            CloudCall::GetHostedZoneDomain { .. } => "GetHostedZone",
            CloudCall::UpsertRecord { .. } => "ChangeResourceRecordSets",
        }
    }
}

type RecordKey = (String, String, RecordType);

#[derive(Default)]
struct State {
    container_instances: HashMap<(String, String), String>,
    instance_interfaces: HashMap<String, Vec<NetworkInterface>>,
    network_interfaces: HashMap<String, NetworkInterface>,
    hosted_zones: HashMap<String, String>,
    group_capacity: HashMap<String, Option<i32>>,
    service_count: HashMap<(String, String), Option<i32>>,
    records: HashMap<RecordKey, DnsRecord>,
    failures: HashMap<&'static str, String>,
    calls: Vec<CloudCall>,
}

/// In-process stand-in for the provider
#[derive(Default)]
pub struct InMemoryCloud {
    state: Mutex<State>,
}

/// Record names compare without the trailing root dot
fn record_name(name: &str) -> String {
    name.trim_end_matches('.').to_lowercase()
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_container_instance(
        self,
        cluster: &str,
        container_instance: &str,
        instance_id: &str,
    ) -> Self {
        self.state().container_instances.insert(
            (cluster.to_string(), container_instance.to_string()),
            instance_id.to_string(),
        );
        self
    }

    pub fn with_instance_interfaces(self, instance_id: &str, interfaces: Vec<NetworkInterface>) -> Self {
        self.state()
            .instance_interfaces
            .insert(instance_id.to_string(), interfaces);
        self
    }

    pub fn with_network_interface(self, interface: NetworkInterface) -> Self {
        if let Some(id) = interface.id.clone() {
            self.state().network_interfaces.insert(id, interface);
        }
        self
    }

    pub fn with_hosted_zone(self, zone_id: &str, domain: &str) -> Self {
        self.state()
            .hosted_zones
            .insert(zone_id.to_string(), domain.to_string());
        self
    }

    /// Register an autoscaling group with no desired capacity set yet
    pub fn with_group(self, group: &str) -> Self {
        self.state().group_capacity.insert(group.to_string(), None);
        self
    }

    pub fn with_service(self, cluster: &str, service: &str) -> Self {
        self.state()
            .service_count
            .insert((cluster.to_string(), service.to_string()), None);
        self
    }

    /// Make every call to `operation` (provider operation name) fail
    pub fn fail_operation(&self, operation: &'static str, message: &str) {
        self.state().failures.insert(operation, message.to_string());
    }

    pub fn desired_capacity(&self, group: &str) -> Option<i32> {
        self.state().group_capacity.get(group).copied().flatten()
    }

    pub fn desired_count(&self, cluster: &str, service: &str) -> Option<i32> {
        self.state()
            .service_count
            .get(&(cluster.to_string(), service.to_string()))
            .copied()
            .flatten()
    }

    pub fn records(&self, zone_id: &str) -> Vec<DnsRecord> {
        let zone_id = normalize_zone_id(zone_id);
        let mut records: Vec<DnsRecord> = self
            .state()
            .records
            .iter()
            .filter(|((zone, _, _), _)| zone == zone_id)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    pub fn calls(&self) -> Vec<CloudCall> {
        self.state().calls.clone()
    }

    /// Log the call, then fail it if a failure was injected for its operation
    fn record_call(&self, call: CloudCall) -> Result<MutexGuard<'_, State>, CloudError> {
        let operation = call.operation();
        let mut state = self.state();
        state.calls.push(call);
        if let Some(message) = state.failures.get(operation) {
            return Err(CloudError::Provider {
                operation,
                message: message.clone(),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl CloudControl for InMemoryCloud {
    async fn describe_container_instance(
        &self,
        cluster: &str,
        container_instance: &str,
    ) -> Result<String, CloudError> {
        let state = self.record_call(CloudCall::DescribeContainerInstance {
            cluster: cluster.to_string(),
            container_instance: container_instance.to_string(),
        })?;
        state
            .container_instances
            .get(&(cluster.to_string(), container_instance.to_string()))
            .cloned()
            .ok_or_else(|| CloudError::NotFound {
                kind: "container instance",
                id: container_instance.to_string(),
            })
    }

    async fn describe_instance_network_interfaces(
        &self,
        instance_id: &str,
    ) -> Result<Vec<NetworkInterface>, CloudError> {
        let state = self.record_call(CloudCall::DescribeInstanceNetworkInterfaces {
            instance_id: instance_id.to_string(),
        })?;
        state
            .instance_interfaces
            .get(instance_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound {
                kind: "instance",
                id: instance_id.to_string(),
            })
    }

    async fn describe_network_interface(&self, eni_id: &str) -> Result<NetworkInterface, CloudError> {
        let state = self.record_call(CloudCall::DescribeNetworkInterface {
            eni_id: eni_id.to_string(),
        })?;
        state
            .network_interfaces
            .get(eni_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound {
                kind: "network interface",
                id: eni_id.to_string(),
            })
    }

    async fn set_group_desired_capacity(&self, group: &str, desired: i32) -> Result<(), CloudError> {
        let mut state = self.record_call(CloudCall::SetGroupDesiredCapacity {
            group: group.to_string(),
            desired,
        })?;
        match state.group_capacity.get_mut(group) {
            Some(slot) => {
                *slot = Some(desired);
                Ok(())
            }
            None => Err(CloudError::NotFound {
                kind: "autoscaling group",
                id: group.to_string(),
            }),
        }
    }

    async fn set_service_desired_count(
        &self,
        cluster: &str,
        service: &str,
        desired: i32,
    ) -> Result<(), CloudError> {
        let mut state = self.record_call(CloudCall::SetServiceDesiredCount {
            cluster: cluster.to_string(),
            service: service.to_string(),
            desired,
        })?;
        match state
            .service_count
            .get_mut(&(cluster.to_string(), service.to_string()))
        {
            Some(slot) => {
                *slot = Some(desired);
                Ok(())
            }
            None => Err(CloudError::NotFound {
                kind: "service",
                id: format!("{}/{}", cluster, service),
            }),
        }
    }

    async fn get_hosted_zone_domain(&self, zone_id: &str) -> Result<String, CloudError> {
        let zone_id = normalize_zone_id(zone_id);
        let state = self.record_call(CloudCall::GetHostedZoneDomain {
            zone_id: zone_id.to_string(),
        })?;
        state
            .hosted_zones
            .get(zone_id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound {
                kind: "hosted zone",
                id: zone_id.to_string(),
            })
    }

    async fn upsert_record(&self, zone_id: &str, record: &DnsRecord) -> Result<(), CloudError> {
        let zone_id = normalize_zone_id(zone_id);
        let mut state = self.record_call(CloudCall::UpsertRecord {
            zone_id: zone_id.to_string(),
            name: record.name.clone(),
            value: record.value.clone(),
        })?;
        if !state.hosted_zones.contains_key(zone_id) {
            return Err(CloudError::NotFound {
                kind: "hosted zone",
                id: zone_id.to_string(),
            });
        }
        state.records.insert(
            (zone_id.to_string(), record_name(&record.name), record.record_type),
            record.clone(),
        );
        Ok(())
    }
}
