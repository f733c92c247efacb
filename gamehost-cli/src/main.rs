use anyhow::Result;
use clap::Parser;
use tracing::Instrument;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod cli;
mod commands;
mod config;

use cli::{Args, Mode};
use config::Config;

/// Initialize tracing:
/// 1. Console output (stderr), JSON when GAMEHOST_LOG_FORMAT=json
/// 2. Optional file output under GAMEHOST_LOG_DIR (gamehost.log)
///
/// stdout is left for command output.
fn initialize_tracing() -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,\
         gamehost=debug,\
         gamehost_handlers=debug,\
         aws_config=warn,\
         aws_smithy_runtime=warn"
            .into()
    });

    let json = std::env::var("GAMEHOST_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let console_layer = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).with_target(false).boxed()
    };

    // Keep the guard alive for the lifetime of the program; dropping it
    // stops file logging
    let (file_layer, guard) = match std::env::var("GAMEHOST_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            std::fs::create_dir_all(&dir)?;
            let file_appender = tracing_appender::rolling::daily(&dir, "gamehost.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(file_writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let Args {
        game,
        games_file,
        mode,
    } = Args::parse();

    let _guard = initialize_tracing()?;

    let config = Config::load()?;
    let config = match games_file {
        Some(path) => Config {
            games_file: path,
            ..config
        },
        None => config,
    };

    let invocation_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("invocation", %invocation_id);

    async move {
        let game = game.as_deref();
        match mode {
            Mode::Tick { action } => commands::capacity::run_tick(&config, game, action).await,
            Mode::Asg { action, group } => {
                commands::capacity::run_asg(&config, game, action, group).await
            }
            Mode::Service {
                action,
                cluster,
                service,
            } => commands::capacity::run_service(&config, game, action, cluster, service).await,
            Mode::UpdateDns { event } => commands::dns::run_update_dns(&config, game, &event).await,
            Mode::Invoke { handler, event } => {
                commands::invoke::run_invoke(&config, game, &handler, &event).await
            }
            Mode::Schedule { at, output } => {
                commands::schedule::run_schedule(&config, game, at, &output)
            }
            Mode::Games { output } => commands::schedule::run_games(&config, &output),
        }
    }
    .instrument(span)
    .await
}
