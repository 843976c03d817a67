use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "sightline")]
#[command(about = "Sightline - chat with a dialogue runtime or a vision backend", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.config/sightline/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the configured dialogue runtime
    Widget,
    /// Ask the vision backend about frames from a camera source
    Camera {
        /// Image file used as the camera source
        #[arg(long)]
        frame: Option<PathBuf>,
        /// Base URL of the vision backend
        #[arg(long)]
        backend: Option<String>,
    },
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration file location
    Path,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they do not interleave with the prompt.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sightline=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = commands::config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Widget => commands::widget::run(config).await?,
        Commands::Camera { frame, backend } => {
            commands::camera::run(config, frame, backend).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(cli.config.as_deref())?,
            ConfigAction::Show => commands::config::show(&config)?,
        },
    }

    Ok(())
}
