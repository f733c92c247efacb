use std::path::PathBuf;

use anyhow::{Context, Result};
use gamehost_handlers::dns::DEFAULT_TTL_SECONDS;
use gamehost_handlers::HandlerConfig;
use gamehost_models::GameCatalog;

const DEFAULT_GAMES_FILE: &str = "games.yaml";

#[derive(Debug, Clone)]
pub struct Config {
    pub autoscaling_group: Option<String>,
    pub cluster: Option<String>,
    pub service: Option<String>,
    pub hosted_zone_id: Option<String>,
    pub hostname: Option<String>,
    pub domain: Option<String>,
    pub dns_ttl_seconds: i64,
    pub games_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            autoscaling_group: optional_var("AUTOSCALING_GROUP_NAME"),
            cluster: optional_var("ECS_CLUSTER_ARN"),
            service: optional_var("ECS_SERVICE_NAME"),
            hosted_zone_id: optional_var("HOSTED_ZONE_ID"),
            hostname: optional_var("DNS_HOSTNAME"),
            domain: optional_var("DNS_DOMAIN"),
            dns_ttl_seconds: optional_var("DNS_TTL_SECONDS")
                .map(|ttl| ttl.parse())
                .transpose()
                .context("DNS_TTL_SECONDS must be a whole number of seconds")?
                .unwrap_or(DEFAULT_TTL_SECONDS),
            games_file: optional_var("GAMES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GAMES_FILE)),
        })
    }

    pub fn load_catalog(&self) -> Result<GameCatalog> {
        GameCatalog::load(&self.games_file)
            .with_context(|| format!("Failed to load game catalog {}", self.games_file.display()))
    }

    /// Handler configuration, with DNS gaps filled from `game` when given
    pub fn handler_config(&self, game: Option<&str>) -> Result<HandlerConfig> {
        let config = HandlerConfig {
            autoscaling_group: self.autoscaling_group.clone(),
            cluster: self.cluster.clone(),
            service: self.service.clone(),
            hosted_zone_id: self.hosted_zone_id.clone(),
            hostname: self.hostname.clone(),
            domain: self.domain.clone(),
            dns_ttl_seconds: self.dns_ttl_seconds,
        };

        match game {
            Some(name) => {
                let catalog = self.load_catalog()?;
                let game = catalog.get(name)?;
                tracing::debug!(game = %game.name, "using catalog entry for DNS settings");
                Ok(config.with_game(game))
            }
            None => Ok(config),
        }
    }
}

/// Unset and empty both count as absent
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            autoscaling_group: Some("MinecraftAsg".to_string()),
            cluster: None,
            service: None,
            hosted_zone_id: None,
            hostname: None,
            domain: None,
            dns_ttl_seconds: 60,
            games_file: PathBuf::from("does-not-exist.yaml"),
        }
    }

    #[test]
    fn test_handler_config_without_game() {
        let handler = config().handler_config(None).unwrap();
        assert_eq!(handler.autoscaling_group.as_deref(), Some("MinecraftAsg"));
        assert_eq!(handler.dns_ttl_seconds, 60);
        assert!(handler.hostname.is_none());
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let err = config().handler_config(Some("minecraft")).unwrap_err();
        assert!(err.to_string().contains("does-not-exist.yaml"));
    }
}
