use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// gamehost - scheduled game servers with self-updating DNS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Game catalog entry supplying hostname, hosted zone and domain
    #[arg(short, long, global = true)]
    pub game: Option<String>,

    /// Game catalog file (overrides GAMES_FILE)
    #[arg(long, global = true)]
    pub games_file: Option<PathBuf>,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Apply a timer tick to both the service and the autoscaling group
    Tick {
        /// "start" scales to 1, anything else to 0
        #[arg(short, long)]
        action: Option<String>,
    },

    /// Set the autoscaling group desired capacity
    Asg {
        #[arg(short, long)]
        action: Option<String>,

        /// Autoscaling group name (default: AUTOSCALING_GROUP_NAME)
        #[arg(long)]
        group: Option<String>,
    },

    /// Set the service desired task count
    Service {
        #[arg(short, long)]
        action: Option<String>,

        /// Cluster name or ARN (default: ECS_CLUSTER_ARN)
        #[arg(long)]
        cluster: Option<String>,

        /// Service name (default: ECS_SERVICE_NAME)
        #[arg(long)]
        service: Option<String>,
    },

    /// Point the game's A record at a launched task
    UpdateDns {
        /// Task state change event JSON file, "-" for stdin
        #[arg(short, long, default_value = "-")]
        event: String,
    },

    /// Dispatch a raw event to a handler by name
    Invoke {
        /// Handler name, full or short (e.g. "ecs-update-dns")
        handler: String,

        /// Event JSON file, "-" for stdin
        #[arg(short, long, default_value = "-")]
        event: String,
    },

    /// Evaluate the catalog's schedule windows
    Schedule {
        /// Evaluation instant, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// List the game catalog
    Games {
        /// Output format
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_parses_action() {
        let args = Args::try_parse_from(["gamehost", "tick", "--action", "start"]).unwrap();
        assert!(matches!(args.mode, Mode::Tick { action: Some(ref a) } if a == "start"));
    }

    #[test]
    fn test_global_game_after_subcommand() {
        let args =
            Args::try_parse_from(["gamehost", "update-dns", "--event", "launch.json", "--game", "minecraft"])
                .unwrap();
        assert_eq!(args.game.as_deref(), Some("minecraft"));
        assert!(matches!(args.mode, Mode::UpdateDns { ref event } if event == "launch.json"));
    }

    #[test]
    fn test_invoke_defaults_to_stdin() {
        let args = Args::try_parse_from(["gamehost", "invoke", "timer-tick"]).unwrap();
        assert!(matches!(args.mode, Mode::Invoke { ref event, .. } if event == "-"));
    }
}
