//! compilerd - incremental compile server speaking JSON lines on stdio

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use compilerd::config::Config;

mod commands;
mod logging;

use commands::{cmd_config_init, cmd_config_show, cmd_serve};
use logging::{init_cli_logging, init_server_logging};

#[derive(Parser)]
#[command(name = "compilerd")]
#[command(about = "Incremental compile server: keeps checked projects warm between requests")]
#[command(after_help = "\
QUICK START:
  compilerd config init           # Write .compilerd.toml, then fill in [toolchain]
  compilerd serve --foreground    # Serve requests on stdin/stdout, log to stderr

PROTOCOL:
  One JSON request per line:  {\"id\": \"1\", \"params\": {\"path\": \"/src/App.fs\"}}
  One JSON response per line: {\"id\": \"1\", \"result\": {...}} or {\"id\": \"1\", \"error\": {...}}")]
struct Cli {
  /// Config file (default: .compilerd.toml, then the user config)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

/// Subcommands for `compilerd config`
#[derive(Subcommand)]
pub enum ConfigCommand {
  /// Show current effective configuration
  Show,
  /// Write a config template to the current directory
  Init,
}

#[derive(Subcommand)]
enum Commands {
  /// Serve compile requests on stdin/stdout
  Serve {
    /// Log to stderr instead of the log file
    #[arg(long)]
    foreground: bool,
  },
  /// Manage configuration
  #[command(after_help = "\
CONFIG LOCATIONS:
  Project: .compilerd.toml
  User:    ~/.config/compilerd/config.toml")]
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

/// Explicit file when given (errors are fatal), otherwise directory lookup
fn load_config(explicit: Option<&Path>) -> Result<Config> {
  match explicit {
    Some(path) => Config::load(path).with_context(|| format!("Failed to load config {}", path.display())),
    None => {
      let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
      Ok(Config::load_for_dir(&cwd))
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let config = load_config(cli.config.as_deref())?;

  // File logging for the server, stderr for everything else
  let _guard = match &cli.command {
    Commands::Serve { foreground } => init_server_logging(&config.server, *foreground),
    _ => {
      init_cli_logging();
      None
    }
  };

  match cli.command {
    Commands::Serve { foreground: _ } => cmd_serve(config).await,
    Commands::Config { command } => match command {
      ConfigCommand::Show => cmd_config_show(&config, cli.config.as_deref()).await,
      ConfigCommand::Init => cmd_config_init().await,
    },
  }
}
