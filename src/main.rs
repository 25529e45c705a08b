//! exam-sync: drives the dashboard sync coordinator from the command line
//! Replays scripted backend changes through an in-memory transport and shows
//! which dashboard reloads they trigger.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exam_sync::commands::{handle_channels_command, handle_replay_command, ReplayOptions};
use exam_sync::core::SyncConfig;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "exam-sync", version, about = "Real-time dashboard sync coordinator")]
struct Cli {
    /// Config file (defaults to <config dir>/exam-sync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format; level comes from RUST_LOG
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines script of viewer changes and notifications
    Replay {
        /// Script file, one step per line
        script: PathBuf,

        /// Sign this viewer in before the first step
        #[arg(long)]
        viewer: Option<String>,

        /// Notifications buffered per channel
        #[arg(long)]
        channel_capacity: Option<usize>,

        /// Only print errors
        #[arg(long, short)]
        quiet: bool,
    },
    /// Show the channel each collection subscribes through
    Channels,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = SyncConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay {
            script,
            viewer,
            channel_capacity,
            quiet,
        } => {
            let options = ReplayOptions {
                viewer,
                config: config.with_overrides(channel_capacity),
                quiet,
            };
            handle_replay_command(&script, options).await?;
        }
        Commands::Channels => {
            handle_channels_command(&config.with_overrides(None));
        }
    }

    Ok(())
}
