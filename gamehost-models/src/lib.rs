//! Shared domain types for gamehost
//!
//! Game definitions loaded from the catalog, the start/stop capacity command,
//! and the DNS record shape written on every launch.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INSTANCE_TYPE: &str = "t3a.large";

/// Transport protocol of an exposed game port
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortMapping {
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
}

fn default_protocol() -> Protocol {
    Protocol::Tcp
}

/// Weekly on-window, as a pair of cron-like expressions evaluated in UTC.
///
/// Both expressions are always present; a game without a window carries
/// `None` instead and falls back to its `auto_start` flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleWindow {
    /// When the server should be switched on (e.g. `0 23 * * FRI`)
    pub start: String,
    /// When the server should be switched off (e.g. `0 6 * * MON`)
    pub stop: String,
}

/// Definition of one managed game service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameProperties {
    pub name: String,
    pub container_image: String,
    pub container_path: String,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Domain the hostname lives under; looked up from the hosted zone when absent
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Hosted zone holding the game's A record
    #[serde(default)]
    pub hosted_zone: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub schedule: Option<ScheduleWindow>,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    #[serde(default)]
    pub instance_connect: bool,
}

fn default_true() -> bool {
    true
}

fn default_instance_type() -> String {
    DEFAULT_INSTANCE_TYPE.to_string()
}

impl GameProperties {
    /// DNS label for the game: the explicit hostname, else the game name, lowercased
    pub fn dns_hostname(&self) -> String {
        self.hostname
            .as_deref()
            .unwrap_or(&self.name)
            .to_lowercase()
    }

    pub fn ports_for(&self, protocol: Protocol) -> impl Iterator<Item = u16> + '_ {
        self.ports
            .iter()
            .filter(move |p| p.protocol == protocol)
            .map(|p| p.port)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Level-triggered start/stop command for a compute group or service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CapacityCommand {
    Start,
    Stop,
}

impl CapacityCommand {
    /// Parse a timer action; anything other than `"start"` means stop.
    pub fn from_action(action: Option<&str>) -> Self {
        match action {
            Some("start") => CapacityCommand::Start,
            _ => CapacityCommand::Stop,
        }
    }

    /// Desired capacity / task count for this command
    pub fn desired(self) -> i32 {
        match self {
            CapacityCommand::Start => 1,
            CapacityCommand::Stop => 0,
        }
    }
}

impl fmt::Display for CapacityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityCommand::Start => write!(f, "start"),
            CapacityCommand::Stop => write!(f, "stop"),
        }
    }
}

// ============================================================================
// DNS
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
        }
    }
}

/// A single-value DNS record as written by an upsert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsRecord {
    pub name: String,
    pub record_type: RecordType,
    pub value: String,
    pub ttl: i64,
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("game at position {0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate game name: {0}")]
    DuplicateName(String),

    #[error("game {game} exposes port 0")]
    InvalidPort { game: String },

    #[error("game not found in catalog: {0}")]
    NotFound(String),
}

/// The set of games managed by this deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameCatalog {
    #[serde(default)]
    pub games: Vec<GameProperties>,
}

impl GameCatalog {
    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        let catalog: GameCatalog = serde_yaml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Structural checks; schedule expressions are checked by the evaluator.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for (idx, game) in self.games.iter().enumerate() {
            if game.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(idx));
            }
            if !seen.insert(game.name.to_lowercase()) {
                return Err(CatalogError::DuplicateName(game.name.clone()));
            }
            if game.ports.iter().any(|p| p.port == 0) {
                return Err(CatalogError::InvalidPort {
                    game: game.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a game by name, ignoring case
    pub fn get(&self, name: &str) -> Result<&GameProperties, CatalogError> {
        self.games
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub fn enabled(&self) -> impl Iterator<Item = &GameProperties> {
        self.games.iter().filter(|g| g.enabled)
    }
}
