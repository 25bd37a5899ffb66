//! JSON-lines server loop
//!
//! Reads one [`Request`] per line, forwards it to the compiler actor and writes
//! each [`Response`] as soon as its reply arrives. Responses are written by a
//! single writer, so lines never interleave, but their order follows
//! completion, not arrival: clients correlate by `id`.

use futures::{SinkExt, StreamExt};
use tokio::{
  io::{AsyncRead, AsyncWrite},
  sync::mpsc,
};
use tokio_util::{
  codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError},
  sync::CancellationToken,
};
use tracing::{debug, trace, warn};

use crate::{
  actor::CompilerHandle,
  ipc::{Request, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Codec error: {0}")]
  Codec(#[from] LinesCodecError),
  #[error("Ser/de error: {0}")]
  Serde(#[from] serde_json::Error),
}

/// Serve requests from `reader` until EOF or cancellation.
///
/// Returns the number of requests read. Pending replies are still written
/// after the input ends.
pub async fn serve_lines<R, W>(
  reader: R,
  writer: W,
  handle: CompilerHandle,
  cancel: CancellationToken,
) -> Result<u64, ServerError>
where
  R: AsyncRead + Unpin,
  W: AsyncWrite + Unpin,
{
  let mut lines = FramedRead::new(reader, LinesCodec::new());
  let mut sink = FramedWrite::new(writer, LinesCodec::new());
  let (out_tx, mut out_rx) = mpsc::channel::<Response>(64);

  let write_loop = async move {
    while let Some(response) = out_rx.recv().await {
      let json = serde_json::to_string(&response)?;
      sink.send(json).await?;
    }
    Ok::<_, ServerError>(())
  };

  let read_loop = async move {
    let mut request_count = 0u64;

    loop {
      let line = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
          debug!("Server cancelled");
          break;
        }

        next = lines.next() => match next {
          Some(Ok(line)) => line,
          Some(Err(e)) => {
            warn!(error = %e, "Error reading request");
            break;
          }
          None => {
            debug!("Input closed");
            break;
          }
        },
      };

      let trimmed = line.trim();
      if trimmed.is_empty() {
        continue;
      }
      request_count += 1;

      let request: Request = match serde_json::from_str(trimmed) {
        Ok(r) => r,
        Err(e) => {
          warn!("Invalid request JSON: {}", e);
          let _ = out_tx
            .send(Response::rpc_error("unknown", -32700, format!("Parse error: {}", e)))
            .await;
          continue;
        }
      };

      let id = request.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
      trace!(id = %id, "Forwarding request");

      match handle.send(id.clone(), request.params).await {
        Ok(reply_rx) => {
          let out_tx = out_tx.clone();
          tokio::spawn(async move {
            let response = match reply_rx.await {
              Ok(reply) => reply.into_response(id),
              Err(_) => Response::rpc_error(id, -32000, "Compiler dropped the request"),
            };
            let _ = out_tx.send(response).await;
          });
        }
        Err(e) => {
          let _ = out_tx
            .send(Response::rpc_error(id, -32000, format!("Failed to send to compiler: {}", e)))
            .await;
        }
      }
    }

    request_count
  };

  let (request_count, written) = tokio::join!(read_loop, write_loop);
  written?;
  debug!(requests = request_count, "Server finished");
  Ok(request_count)
}
