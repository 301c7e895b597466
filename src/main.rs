//! Steptrail - interaction recorder
//!
//! Main entry point for the steptrail CLI.

mod cli;
mod commands;
mod simulate;

use clap::Parser;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use steptrail_config::{ConfigLoader, ConfigValidator, LoggingConfig};

use cli::{Cli, Commands};

/// Initialize tracing with console output and an optional daily log file.
///
/// Console output goes to stderr so command output on stdout stays clean.
fn init_tracing(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let Some(dir) = &config.directory else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("steptrail")
        .filename_suffix("log")
        .max_log_files(30)
        .build(dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&ConfigLoader::resolve_path(&cli.config))?;
    let _guard = init_tracing(&config.logging)?;

    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    match cli.command {
        Commands::Replay { reports } => commands::replay(&reports).await,
        Commands::Simulate { fixture } => commands::simulate(&config, &fixture).await,
        Commands::Seal { token, input } => commands::seal(&config, &token, &input),
        Commands::Open { token, input } => commands::open(&config, &token, &input),
        Commands::Save {
            name,
            token,
            refresh_token,
            reports,
        } => commands::save(&config, &name, token, refresh_token, &reports).await,
    }
}
