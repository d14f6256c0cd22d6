use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zoetrope::commands;
use zoetrope::config::Config;

#[derive(Parser)]
#[command(
    name = "zoetrope",
    version,
    about = "Dashboard tab rotation engine with timed reloads and time-of-day URL switching",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML); environment variables are used if absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rotation cycle against the built-in simulated host
    Run {
        /// Stop after one full lap instead of running until interrupted
        #[arg(long, default_value = "false")]
        once: bool,
    },

    /// Validate a settings file without importing it
    Validate {
        /// Settings file to check
        file: PathBuf,
    },

    /// Import a settings file into the store
    Import {
        /// Settings file to import
        file: PathBuf,
    },

    /// Export the stored settings to a timestamped JSON file
    Export {
        /// Directory to write the export into (defaults to the current one)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a time-of-day URL substitution rule
    AddRule {
        /// URL to substitute
        #[arg(long)]
        original: String,

        /// URL shown outside the active window
        #[arg(long)]
        replacement: String,

        /// Window start (HH:MM, 24h)
        #[arg(long)]
        start: String,

        /// Window end (HH:MM, 24h); before start wraps past midnight
        #[arg(long)]
        end: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::Run { once } => {
            tracing::info!(once = %once, "Starting run command");
            commands::run(config, once).await?;
        }

        Commands::Validate { file } => {
            tracing::info!(file = %file.display(), "Starting validate command");
            commands::validate(&file).await?;
        }

        Commands::Import { file } => {
            tracing::info!(file = %file.display(), "Starting import command");
            commands::import(&config, &file).await?;
        }

        Commands::Export { output } => {
            tracing::info!(output = ?output, "Starting export command");
            commands::export(&config, output).await?;
        }

        Commands::AddRule {
            original,
            replacement,
            start,
            end,
        } => {
            tracing::info!(
                original = %original,
                replacement = %replacement,
                window = %format!("{start}-{end}"),
                "Starting add-rule command"
            );
            commands::add_rule(&config, original, replacement, &start, &end).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("zoetrope=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("zoetrope=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
