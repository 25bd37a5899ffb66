//! Serve command

use std::sync::Arc;

use anyhow::{Context, Result};
use compilerd::{
  CompilerActor, CompilerActorConfig,
  config::Config,
  serve_lines,
  service::{external::toolchain_from_config, plugins::DylibLoader},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the compile server on stdin/stdout until input closes or Ctrl-C
pub async fn cmd_serve(config: Config) -> Result<()> {
  let toolchain = toolchain_from_config(&config.toolchain).context("Toolchain is not configured")?;
  let cancel = CancellationToken::new();

  let handle = CompilerActor::spawn(
    CompilerActorConfig::from(&config),
    toolchain,
    Arc::new(DylibLoader),
    cancel.clone(),
  );

  let signal_cancel = cancel.clone();
  tokio::spawn(async move {
    match tokio::signal::ctrl_c().await {
      Ok(()) => info!("Received Ctrl-C, shutting down"),
      Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
    }
    signal_cancel.cancel();
  });

  info!(version = env!("CARGO_PKG_VERSION"), "Starting compile server");
  let requests = serve_lines(tokio::io::stdin(), tokio::io::stdout(), handle.clone(), cancel.clone())
    .await
    .context("Compile server failed")?;

  // Input is done; let the actor drain in-flight translations and stop
  if handle.shutdown().await.is_err() {
    warn!("Compiler actor already stopped");
  }
  info!(requests, "Compile server stopped");
  Ok(())
}
