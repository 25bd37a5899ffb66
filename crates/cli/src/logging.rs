//! Logging setup for the compile server
//!
//! stdout carries the protocol, so logs never go there.

use std::path::PathBuf;

use compilerd::config::ServerConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Get the compilerd data directory (respects env vars)
pub fn data_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("COMPILERD_DATA_DIR") {
    return PathBuf::from(dir);
  }
  dirs::data_local_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("compilerd")
}

/// Initialize logging for one-shot commands (stderr only)
pub fn init_cli_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
    .with_writer(std::io::stderr)
    .init();
}

/// Parse log level from config string
fn parse_log_level(level: &str) -> tracing::Level {
  match level.to_lowercase().as_str() {
    "off" | "error" => tracing::Level::ERROR,
    "warn" => tracing::Level::WARN,
    "info" => tracing::Level::INFO,
    "debug" => tracing::Level::DEBUG,
    "trace" => tracing::Level::TRACE,
    _ => tracing::Level::INFO,
  }
}

/// Initialize logging for the server with config-driven settings.
///
/// In foreground mode: logs to stderr with colors
/// Otherwise: logs to a rolling file in the data directory (no ANSI)
///
/// Returns the guard that must be kept alive for the duration of the program
pub fn init_server_logging(config: &ServerConfig, foreground: bool) -> Option<WorkerGuard> {
  let level = parse_log_level(&config.log_level);

  // Build env filter (allows RUST_LOG override)
  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  if foreground {
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_ansi(true)
      .with_writer(std::io::stderr)
      .init();
    return None;
  }

  let log_dir = data_dir();
  if std::fs::create_dir_all(&log_dir).is_err() {
    // Fall back to stderr logging
    init_cli_logging();
    return None;
  }

  let file_appender = match config.log_rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(&log_dir, "compilerd.log"),
    "never" => tracing_appender::rolling::never(&log_dir, "compilerd.log"),
    _ => tracing_appender::rolling::daily(&log_dir, "compilerd.log"),
  };
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .with_ansi(false)
    .with_writer(file_writer)
    .init();

  Some(guard)
}
