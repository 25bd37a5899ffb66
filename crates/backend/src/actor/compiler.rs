//! CompilerActor - single owner of the project store and plugin cache
//!
//! The actor processes one message at a time. For a compile request it decodes
//! the body, resolves plugins, runs the invalidation resolver to completion and
//! only then spawns the translation and goes back to its mailbox. State
//! decisions are therefore totally ordered by arrival, while translations of
//! different requests overlap.
//!
//! # Lifecycle
//!
//! The actor runs until one of:
//! - The CancellationToken is triggered
//! - A CompilerMessage::Shutdown message is received
//! - Every handle has been dropped
//!
//! In-flight translations are awaited before the actor reports it stopped.
//!
//! # Message Flow
//!
//! ```text
//! Server -> CompilerHandle -> CompilerActor -> ProjectResolver -> [FrontEnd]
//!                                   |
//!                                   v
//!                         translation task -> [CodeGenerator] -> reply (oneshot)
//! ```

use std::{panic::AssertUnwindSafe, sync::Arc, time::Instant};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info, warn};

use super::{
  handle::CompilerHandle,
  message::{CompileMessage, CompileReply, CompilerMessage, RequestId},
  translate::{panic_message, run_translation},
};
use crate::{
  domain::{
    config::{Config, SourcesConfig},
    project::{Project, ProjectStore},
    source::normalize_path,
  },
  ipc::CompileRequest,
  service::{
    CompileContext, CompileError, ProjectResolver, Toolchain,
    plugins::{PluginCache, PluginLoader},
  },
};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a CompilerActor
#[derive(Debug, Clone)]
pub struct CompilerActorConfig {
  /// Extension lists driving the resolver
  pub sources: SourcesConfig,
  /// Request mailbox capacity
  pub mailbox_capacity: usize,
}

impl Default for CompilerActorConfig {
  fn default() -> Self {
    Self::from(&Config::default())
  }
}

impl From<&Config> for CompilerActorConfig {
  fn from(config: &Config) -> Self {
    Self {
      sources: config.sources.clone(),
      mailbox_capacity: config.server.mailbox_capacity.max(1),
    }
  }
}

// ============================================================================
// CompilerActor
// ============================================================================

/// The compiler actor - owns all mutable compile state
///
/// # Ownership Model
///
/// - `store` and `plugins` are only touched inside `handle_message`
/// - projects handed to translations are `Arc` snapshots; the store replaces
///   or copies them instead of mutating in place
/// - No `Mutex` or `RwLock` - state is owned, not shared
pub struct CompilerActor {
  resolver: ProjectResolver,
  store: ProjectStore,
  plugins: PluginCache,
  translations: TaskTracker,
  request_rx: mpsc::Receiver<CompilerMessage>,
  cancel: CancellationToken,
}

impl CompilerActor {
  /// Spawn a new CompilerActor and return a handle for communication
  ///
  /// # Arguments
  ///
  /// * `config` - Source kinds and mailbox size
  /// * `toolchain` - Build options, front-end and code generation collaborators
  /// * `loader` - Plugin loader used on plugin cache misses
  /// * `cancel` - Cancellation token for coordinated shutdown
  pub fn spawn(
    config: CompilerActorConfig,
    toolchain: Toolchain,
    loader: Arc<dyn PluginLoader>,
    cancel: CancellationToken,
  ) -> CompilerHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_capacity);

    let actor = Self {
      resolver: ProjectResolver::new(toolchain, config.sources),
      store: ProjectStore::new(),
      plugins: PluginCache::new(loader),
      translations: TaskTracker::new(),
      request_rx: rx,
      cancel,
    };

    tokio::spawn(actor.run());

    CompilerHandle::new(tx)
  }

  /// Main actor event loop
  async fn run(mut self) {
    info!("CompilerActor started");

    loop {
      tokio::select! {
        // Check cancellation first (biased)
        biased;

        _ = self.cancel.cancelled() => {
          info!("CompilerActor shutting down (cancelled)");
          break;
        }

        msg = self.request_rx.recv() => {
          match msg {
            Some(msg) => {
              self.handle_message(msg).await;
            }
            None => {
              info!("CompilerActor shutting down (channel closed)");
              break;
            }
          }
        }
      }
    }

    self.translations.close();
    if !self.translations.is_empty() {
      debug!(pending = self.translations.len(), "Waiting for in-flight translations");
    }
    self.translations.wait().await;

    info!(projects = self.store.len(), plugins = self.plugins.len(), "CompilerActor stopped");
  }

  /// Handle an incoming message
  async fn handle_message(&mut self, msg: CompilerMessage) {
    match msg {
      CompilerMessage::Compile(msg) => {
        self.handle_compile(msg).await;
      }
      CompilerMessage::Snapshot { reply } => {
        let _ = reply.send(self.store.clone());
      }
      CompilerMessage::Shutdown => {
        self.cancel.cancel();
      }
    }
  }

  /// Update state for one request, then hand translation to its own task
  async fn handle_compile(&mut self, msg: CompileMessage) {
    let CompileMessage { id, reply, payload } = msg;
    let started = Instant::now();

    let outcome = AssertUnwindSafe(self.prepare(&id, payload)).catch_unwind().await;
    let (project, ctx) = match outcome {
      Ok(Ok(prepared)) => prepared,
      Ok(Err(e)) => {
        if e.is_configuration() {
          error!(request_id = %id, error = %e.chain(), "Configuration error");
        } else {
          warn!(request_id = %id, error = %e.chain(), "Compile request rejected");
        }
        let _ = reply.send(CompileReply::from(&e));
        return;
      }
      Err(panic) => {
        let e = CompileError::internal(format!("request handling panicked: {}", panic_message(panic.as_ref())));
        error!(request_id = %id, error = %e, "Compile request panicked");
        let _ = reply.send(CompileReply::from(&e));
        return;
      }
    };

    debug!(
      request_id = %id,
      file = %ctx.file.display(),
      project = %project.project_file().display(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "State updated, dispatching translation"
    );

    let codegen = Arc::clone(&self.resolver.toolchain().codegen);
    self
      .translations
      .spawn(run_translation(id, project, ctx, codegen, reply));
  }

  /// Decode the request, build its context and resolve the active project
  async fn prepare(
    &mut self,
    id: &RequestId,
    payload: serde_json::Value,
  ) -> Result<(Arc<Project>, CompileContext), CompileError> {
    let request: CompileRequest = serde_json::from_value(payload)?;
    let file = normalize_path(&request.path);
    debug!(request_id = %id, file = %file.display(), plugins = request.plugins.len(), "Received compile request");

    let plugins = self.plugins.load_plugins(&request.plugins)?;
    let mut ctx = CompileContext::new(file, request, plugins);
    let project = self.resolver.update_state(&mut self.store, &mut ctx).await?;
    Ok((project, ctx))
  }
}
