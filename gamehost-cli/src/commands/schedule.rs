use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gamehost_handlers::schedule::{check_catalog, game_is_operational, next_transitions};
use gamehost_models::{GameCatalog, GameProperties, Protocol};
use serde::Serialize;

use crate::config::Config;

#[derive(Debug, Serialize)]
pub struct GameSchedule {
    pub name: String,
    pub operational: bool,
    pub auto_start: bool,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub next_start: Option<DateTime<Utc>>,
    pub next_stop: Option<DateTime<Utc>>,
}

pub fn evaluate(game: &GameProperties, now: &DateTime<Utc>) -> Result<GameSchedule> {
    let operational = game_is_operational(game, now)?;
    let (next_start, next_stop) = match &game.schedule {
        Some(window) => {
            let (start, stop) = next_transitions(window, now)?;
            (Some(start), Some(stop))
        }
        None => (None, None),
    };

    Ok(GameSchedule {
        name: game.name.clone(),
        operational,
        auto_start: game.auto_start,
        start: game.schedule.as_ref().map(|w| w.start.clone()),
        stop: game.schedule.as_ref().map(|w| w.stop.clone()),
        next_start,
        next_stop,
    })
}

fn selected<'a>(catalog: &'a GameCatalog, game: Option<&str>) -> Result<Vec<&'a GameProperties>> {
    match game {
        Some(name) => Ok(vec![catalog.get(name)?]),
        None => Ok(catalog.enabled().collect()),
    }
}

pub fn run_schedule(config: &Config, game: Option<&str>, at: Option<String>, output: &str) -> Result<()> {
    let catalog = config.load_catalog()?;
    check_catalog(&catalog)?;

    let now = match at {
        Some(at) => DateTime::parse_from_rfc3339(&at)
            .with_context(|| format!("--at must be an RFC 3339 timestamp, got '{}'", at))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let schedules = selected(&catalog, game)?
        .into_iter()
        .map(|g| evaluate(g, &now))
        .collect::<Result<Vec<_>>>()?;

    if output == "json" {
        println!("{}", serde_json::to_string_pretty(&schedules)?);
        return Ok(());
    }

    println!("Evaluated at {}", now.to_rfc3339());
    println!();
    println!("{:<15} {:<8} {:<26} {:<26}", "GAME", "STATE", "NEXT START", "NEXT STOP");
    println!("{}", "-".repeat(78));

    for s in &schedules {
        let state = if s.operational { "UP" } else { "DOWN" };
        let when = |t: &Option<DateTime<Utc>>| {
            t.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{:<15} {:<8} {:<26} {:<26}",
            s.name,
            state,
            when(&s.next_start),
            when(&s.next_stop)
        );
    }

    println!();
    println!("{} game(s) evaluated", schedules.len());
    Ok(())
}

pub fn run_games(config: &Config, output: &str) -> Result<()> {
    let catalog = config.load_catalog()?;

    if output == "json" {
        println!("{}", serde_json::to_string_pretty(&catalog.games)?);
        return Ok(());
    }

    println!(
        "{:<15} {:<20} {:<12} {:<16} {:<8} {}",
        "NAME", "HOSTNAME", "INSTANCE", "PORTS", "ENABLED", "IMAGE"
    );
    println!("{}", "-".repeat(100));

    for game in &catalog.games {
        let ports = game
            .ports
            .iter()
            .map(|p| format!("{}/{}", p.port, p.protocol))
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<15} {:<20} {:<12} {:<16} {:<8} {}",
            game.name,
            game.dns_hostname(),
            game.instance_type,
            if ports.is_empty() { "-".to_string() } else { ports },
            game.enabled,
            game.container_image
        );
    }

    println!();
    let udp = catalog
        .games
        .iter()
        .filter(|g| g.ports_for(Protocol::Udp).next().is_some())
        .count();
    println!("{} game(s) found, {} with UDP ports", catalog.games.len(), udp);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog() -> GameCatalog {
        GameCatalog::from_yaml(
            r#"
games:
  - name: Minecraft
    container_image: itzg/minecraft-server
    container_path: /data
    auto_start: false
    schedule:
      start: "0 23 * * FRI"
      stop: "0 6 * * MON"
  - name: Terraria
    container_image: ryshe/terraria
    container_path: /root/.local/share/Terraria/Worlds
    auto_start: true
    enabled: false
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_inside_window() {
        let catalog = catalog();
        let saturday = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let s = evaluate(catalog.get("minecraft").unwrap(), &saturday).unwrap();
        assert!(s.operational);
        assert_eq!(s.next_stop, Some(Utc.with_ymd_and_hms(2024, 6, 3, 6, 0, 0).unwrap()));
        assert_eq!(s.next_start, Some(Utc.with_ymd_and_hms(2024, 6, 7, 23, 0, 0).unwrap()));
    }

    #[test]
    fn test_evaluate_without_window() {
        let catalog = catalog();
        let s = evaluate(catalog.get("terraria").unwrap(), &Utc::now()).unwrap();
        assert!(s.operational);
        assert!(s.next_start.is_none());
    }

    #[test]
    fn test_selected_skips_disabled() {
        let catalog = catalog();
        let games = selected(&catalog, None).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Minecraft");
        assert!(selected(&catalog, Some("valheim")).is_err());
    }
}
