//! gamehost handlers - schedule-driven capacity control and DNS reconciliation
//!
//! Two independent, stateless pipelines share a game's compute group:
//!
//! - a timer tick (`start`/`stop`) sets the service desired count and the
//!   autoscaling group desired capacity to 1 or 0
//! - a task state change (RUNNING) resolves the task's public IP and upserts
//!   the game's A record
//!
//! All provider access goes through [`cloud::CloudControl`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gamehost_handlers::registry::HandlerRegistry;
//! use gamehost_handlers::names::handlers;
//! use gamehost_handlers::HandlerConfig;
//!
//! # #[cfg(feature = "aws")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cloud = Arc::new(gamehost_handlers::aws_client::AwsCloud::from_env().await);
//! let registry = HandlerRegistry::new(cloud, HandlerConfig::default());
//!
//! registry
//!     .dispatch(handlers::TIMER_TICK, serde_json::json!({"action": "start"}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cloud;
pub mod error;
pub mod memory;
pub mod names;
pub mod registry;
pub mod types;

#[cfg(feature = "aws")]
pub mod aws_client;

// Control loop components
pub mod capacity;
pub mod dns;
pub mod resolver;
pub mod schedule;

pub mod handlers;

pub use cloud::{CloudControl, NetworkInterface};
pub use error::{CloudError, DnsError, HandlerError, HandlerResult, ScheduleError};
pub use types::*;
