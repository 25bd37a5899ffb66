//! Translation step - runs off the actor's critical path
//!
//! Each request that survives resolution is translated in its own task. The
//! task owns the request's [`CompileContext`] and a read-only project snapshot,
//! and always answers through the request's reply channel, even on panic.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Instant};

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::message::{CompileReply, RequestId};
use crate::{
  domain::project::Project,
  ipc::CompileOutput,
  service::{CodeGenerator, CompileContext, CompileError, toolchain::TargetProgram},
};

/// Translate `ctx.file` using the given project snapshot.
///
/// When the target is the project file itself and the front-end already
/// reported an error, translation is skipped: the output is empty and lists
/// every project file as a dependency so the caller retries once they change.
pub async fn translate(
  project: Arc<Project>,
  mut ctx: CompileContext,
  codegen: Arc<dyn CodeGenerator>,
) -> Result<CompileOutput, CompileError> {
  if ctx.file() == project.project_file() && ctx.log.has_errors() {
    info!(
      project = %project.project_file().display(),
      "Project has errors, skipping translation"
    );
    return Ok(CompileOutput {
      program: TargetProgram::empty(),
      diagnostics: ctx.log.into_entries(),
      dependencies: project.source_files().to_vec(),
    });
  }

  let file = ctx.file.clone();
  let intermediate = codegen
    .transform_file(project.checked(), &mut ctx)
    .await
    .map_err(|cause| CompileError::CodeGen {
      file: file.clone(),
      cause,
    })?;
  let dependencies = intermediate.dependencies.clone();
  let program = codegen
    .to_target(intermediate, &mut ctx)
    .await
    .map_err(|cause| CompileError::CodeGen { file, cause })?;

  Ok(CompileOutput {
    program,
    diagnostics: ctx.log.into_entries(),
    dependencies,
  })
}

/// Run [`translate`] and deliver the outcome through `reply`
pub async fn run_translation(
  id: RequestId,
  project: Arc<Project>,
  ctx: CompileContext,
  codegen: Arc<dyn CodeGenerator>,
  reply: oneshot::Sender<CompileReply>,
) {
  let started = Instant::now();
  let file = ctx.file.clone();

  let outcome = AssertUnwindSafe(translate(project, ctx, codegen)).catch_unwind().await;
  let response = match outcome {
    Ok(Ok(output)) => {
      debug!(
        request_id = %id,
        file = %file.display(),
        diagnostics = output.diagnostics.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Translation completed"
      );
      CompileReply::Done(output)
    }
    Ok(Err(e)) => {
      error!(request_id = %id, file = %file.display(), error = %e.chain(), "Translation failed");
      CompileReply::from(&e)
    }
    Err(panic) => {
      let e = CompileError::internal(format!("translation panicked: {}", panic_message(panic.as_ref())));
      error!(request_id = %id, file = %file.display(), error = %e, "Translation panicked");
      CompileReply::from(&e)
    }
  };

  if reply.send(response).is_err() {
    debug!(request_id = %id, "Caller dropped the reply channel");
  }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}
