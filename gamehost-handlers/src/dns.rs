//! DNS reconciler
//!
//! Writes the game's A record with a single UPSERT change. Repeating the
//! call, or applying calls out of order, converges to the last IP written.

use std::net::Ipv4Addr;

use gamehost_models::{DnsRecord, RecordType};
use tracing::{error, info};

use crate::cloud::CloudControl;
use crate::error::DnsError;

/// TTL for the game record; short so a re-launch with a new IP propagates fast
pub const DEFAULT_TTL_SECONDS: i64 = 60;

/// Bare hosted zone id from an id, a `/hostedzone/<id>` path or a zone ARN
pub fn normalize_zone_id(zone: &str) -> &str {
    zone.rsplit('/').next().unwrap_or(zone)
}

/// Join a hostname and a domain, keeping the domain's trailing dot if present
pub fn fqdn(hostname: &str, domain: &str) -> String {
    let domain = domain.trim_start_matches('.');
    if domain.is_empty() {
        hostname.to_string()
    } else {
        format!("{}.{}", hostname, domain)
    }
}

pub async fn zone_domain(cloud: &dyn CloudControl, zone_id: &str) -> Result<String, DnsError> {
    cloud
        .get_hosted_zone_domain(zone_id)
        .await
        .map_err(|source| DnsError::ZoneLookup {
            zone: zone_id.to_string(),
            source,
        })
}

/// Create or replace the A record `fqdn -> ip`
pub async fn upsert_a_record(
    cloud: &dyn CloudControl,
    hosted_zone_id: &str,
    fqdn: &str,
    ip: Ipv4Addr,
    ttl_seconds: i64,
) -> Result<(), DnsError> {
    let record = DnsRecord {
        name: fqdn.to_string(),
        record_type: RecordType::A,
        value: ip.to_string(),
        ttl: ttl_seconds,
    };

    match cloud.upsert_record(hosted_zone_id, &record).await {
        Ok(()) => {
            info!(
                fqdn,
                %ip,
                ttl = ttl_seconds,
                zone = hosted_zone_id,
                "Set {} to IP {} in hosted zone {}",
                fqdn,
                ip,
                hosted_zone_id
            );
            Ok(())
        }
        Err(source) => {
            error!(fqdn, %ip, zone = hosted_zone_id, error = %source, "failed to upsert DNS record");
            Err(DnsError::Upsert {
                zone: hosted_zone_id.to_string(),
                fqdn: fqdn.to_string(),
                source,
            })
        }
    }
}
