//! hlstats CLI tool.
//!
//! Usage:
//! ```bash
//! hlstats replay [OPTIONS] <TRACE>
//! hlstats flags
//! hlstats init
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hlstats::{Config, FeatureFlags};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

use config_resolver::ConfigSource;

/// Replays editor highlighting traces through the hlstats pipeline
#[derive(Parser)]
#[command(name = "hlstats")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "HLSTATS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded host trace and print the emitted telemetry
    Replay {
        /// Trace file (TOML)
        trace: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show effective experiment values
    Flags,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for replay results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One line per batch and lookup.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { trace, format } => {
            let source = config_resolver::resolve(Path::new("."), cli.config.as_deref());
            let flags = load_flags(&source)?;
            commands::replay::run(&trace, format, flags)
        }
        Commands::Flags => {
            let source = config_resolver::resolve(Path::new("."), cli.config.as_deref());
            let flags = load_flags(&source)?;
            commands::flags::run(&source, &flags);
            Ok(())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}

/// Builds feature flags from the resolved configuration.
fn load_flags(source: &ConfigSource) -> Result<FeatureFlags> {
    let config = match source.path() {
        Some(path) => {
            tracing::debug!("Using config: {}", path.display());
            Config::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => Config::default(),
    };
    Ok(FeatureFlags::from_config(&config))
}
