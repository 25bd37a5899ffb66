//! Actor message types for the compiler actor
//!
//! Every request carries a `oneshot::Sender` so exactly one reply is delivered,
//! either from the actor itself (decode or resolve failures) or from the
//! translation task it spawns.

use tokio::sync::oneshot;

use crate::{
  domain::project::ProjectStore,
  ipc::{CompileOutput, ErrorReply, Response},
  service::CompileError,
};

/// Unique identifier for a request (for correlation in logs and responses)
pub type RequestId = String;

/// A message sent to the CompilerActor
#[derive(Debug)]
pub enum CompilerMessage {
  /// Compile one file
  Compile(CompileMessage),
  /// Get a copy of the current project store
  Snapshot { reply: oneshot::Sender<ProjectStore> },
  /// Stop accepting requests
  Shutdown,
}

/// A compile request with its reply channel
#[derive(Debug)]
pub struct CompileMessage {
  /// Request ID for correlation
  pub id: RequestId,
  /// Channel for the single reply
  pub reply: oneshot::Sender<CompileReply>,
  /// Undecoded request body; decoding happens inside the actor
  pub payload: serde_json::Value,
}

/// Final reply for a compile request
#[derive(Debug, Clone, PartialEq)]
pub enum CompileReply {
  /// Translation succeeded
  Done(CompileOutput),
  /// Request failed
  Error { code: i32, message: String },
}

impl CompileReply {
  /// Create an error reply
  pub fn error(code: i32, message: impl Into<String>) -> Self {
    Self::Error {
      code,
      message: message.into(),
    }
  }

  pub fn is_error(&self) -> bool {
    matches!(self, Self::Error { .. })
  }

  /// Convert into the wire envelope
  pub fn into_response(self, id: impl Into<String>) -> Response {
    match self {
      Self::Done(output) => Response::success(id, output),
      Self::Error { code, message } => Response::rpc_error(id, code, message),
    }
  }

  /// Split into a `Result`, mainly for callers that want `?`
  pub fn into_result(self) -> Result<CompileOutput, ErrorReply> {
    match self {
      Self::Done(output) => Ok(output),
      Self::Error { code, message } => Err(ErrorReply { code, message }),
    }
  }
}

impl From<&CompileError> for CompileReply {
  fn from(err: &CompileError) -> Self {
    Self::error(err.code(), err.to_string())
  }
}
