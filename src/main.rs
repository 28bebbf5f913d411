mod commands;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use icsync_core::ChangeEvent;
use icsync_core::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icsync")]
#[command(about = "Attach a calendar file to a changed record and mark it processed")]
struct Cli {
    /// Config file (defaults to ~/.config/icsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the .ics, attach it to the record and mark the record processed
    Run {
        #[command(flatten)]
        event: EventArgs,
    },
    /// Build the .ics for a record without uploading anything
    Render {
        #[command(flatten)]
        event: EventArgs,

        /// Write the file here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct EventArgs {
    /// Change event as JSON, from a file or "-" for stdin
    #[arg(long, conflicts_with = "record_id")]
    event: Option<PathBuf>,

    /// Record to process
    #[arg(long, required_unless_present = "event")]
    record_id: Option<String>,

    /// Profile key (needed when several profiles are configured)
    #[arg(short, long)]
    profile: Option<String>,

    /// Table overriding the profile's table
    #[arg(long)]
    table: Option<String>,
}

impl EventArgs {
    fn into_event(self) -> Result<ChangeEvent> {
        let mut event = match (self.event, self.record_id) {
            (Some(path), _) => ChangeEvent::from_json(&read_event(&path)?)
                .with_context(|| format!("Invalid change event in {}", path.display()))?,
            (None, Some(record_id)) => ChangeEvent::new(record_id).validate()?,
            (None, None) => anyhow::bail!("Pass either --record-id or --event"),
        };

        if self.profile.is_some() {
            event.profile = self.profile;
        }
        if self.table.is_some() {
            event.table = self.table;
        }

        Ok(event)
    }
}

fn read_event(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read event from stdin");
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event from {}", path.display()))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { event } => commands::run::run(&config, event.into_event()?).await,
        Commands::Render { event, output } => {
            commands::render::run(&config, event.into_event()?, output.as_deref()).await
        }
    }
}
