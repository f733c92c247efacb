pub mod capacity;
pub mod dns;
pub mod invoke;
pub mod schedule;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use gamehost_handlers::aws_client::AwsCloud;
use gamehost_handlers::registry::HandlerRegistry;
use gamehost_handlers::{DnsUpdateOutcome, HandlerConfig, HandlerOutput};

/// Registry bound to the AWS account from the ambient credentials
pub async fn aws_registry(config: HandlerConfig) -> HandlerRegistry {
    let cloud = AwsCloud::from_env().await;
    HandlerRegistry::new(Arc::new(cloud), config)
}

/// Event JSON from a file, or stdin for "-"
pub fn read_event(source: &str) -> Result<serde_json::Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read event file {}", source))?
    };

    if text.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(&text).with_context(|| format!("Event in {} is not valid JSON", source))
}

pub fn print_output(output: &HandlerOutput) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

/// One-line summary for the console
pub fn describe(output: &HandlerOutput) -> String {
    match output {
        HandlerOutput::Capacity(out) => format!("{} -> {} ({})", out.target, out.desired, out.command),
        HandlerOutput::Tick(outs) => outs
            .iter()
            .map(|out| format!("{} -> {}", out.target, out.desired))
            .collect::<Vec<_>>()
            .join(", "),
        HandlerOutput::Dns(DnsUpdateOutcome::Updated { fqdn, ip, .. }) => format!("{} -> {}", fqdn, ip),
        HandlerOutput::Dns(DnsUpdateOutcome::Skipped { hostname, reason }) => {
            format!("{} skipped: {:?}", hostname, reason)
        }
        HandlerOutput::Dns(DnsUpdateOutcome::Failed { hostname, fqdn, error }) => {
            format!("{} failed: {}", fqdn.as_deref().unwrap_or(hostname), error)
        }
    }
}
