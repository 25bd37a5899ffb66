//! Actor handle for communicating with the compiler actor
//!
//! Handles are cheap to clone and provide a way to send messages to the actor.
//! Each request creates its own reply channel.

use tokio::sync::{mpsc, oneshot};

use super::message::{CompileMessage, CompileReply, CompilerMessage};
use crate::{domain::project::ProjectStore, ipc::CompileRequest};

/// Handle to communicate with a CompilerActor
///
/// The actor stops once every handle has been dropped.
#[derive(Clone, Debug)]
pub struct CompilerHandle {
  pub tx: mpsc::Sender<CompilerMessage>,
}

impl CompilerHandle {
  /// Create a new handle from a sender
  pub fn new(tx: mpsc::Sender<CompilerMessage>) -> Self {
    Self { tx }
  }

  /// Send a raw request body and get the receiver for its reply
  ///
  /// Returns as soon as the message is queued; replies for different requests
  /// may arrive in any order.
  pub async fn send(
    &self,
    id: impl Into<String>,
    payload: serde_json::Value,
  ) -> Result<oneshot::Receiver<CompileReply>, SendError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    let msg = CompileMessage {
      id: id.into(),
      reply: reply_tx,
      payload,
    };
    self
      .tx
      .send(CompilerMessage::Compile(msg))
      .await
      .map_err(|_| SendError::ActorGone)?;
    Ok(reply_rx)
  }

  /// Send a raw request body and wait for its reply
  pub async fn request(&self, id: impl Into<String>, payload: serde_json::Value) -> Result<CompileReply, SendError> {
    let rx = self.send(id, payload).await?;
    rx.await.map_err(|_| SendError::ReplyDropped)
  }

  /// Compile one file and wait for the reply
  pub async fn compile(&self, id: impl Into<String>, request: &CompileRequest) -> Result<CompileReply, SendError> {
    let payload = serde_json::to_value(request).map_err(|e| SendError::Encode(e.to_string()))?;
    self.request(id, payload).await
  }

  /// Copy of the actor's project store, taken between two requests
  pub async fn snapshot(&self) -> Result<ProjectStore, SendError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    self
      .tx
      .send(CompilerMessage::Snapshot { reply: reply_tx })
      .await
      .map_err(|_| SendError::ActorGone)?;
    reply_rx.await.map_err(|_| SendError::ActorGone)
  }

  /// Request the actor to shutdown
  pub async fn shutdown(&self) -> Result<(), SendError> {
    self
      .tx
      .send(CompilerMessage::Shutdown)
      .await
      .map_err(|_| SendError::ActorGone)
  }
}

// ============================================================================
// Errors
// ============================================================================

/// Error when sending to an actor
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
  #[error("Actor has shut down")]
  ActorGone,
  #[error("Reply channel closed before a reply was sent")]
  ReplyDropped,
  #[error("Failed to encode request: {0}")]
  Encode(String),
}
