//! Process-backed collaborators
//!
//! Each collaborator is an external command. For every call the operation name
//! is appended to the configured arguments, the request is written to the
//! child's stdin as JSON and the reply is read from its stdout.

use std::{
  path::{Path, PathBuf},
  process::Stdio,
  sync::Arc,
};

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, trace};

use super::{
  context::CompileContext,
  toolchain::{BuildOptionsProvider, CheckResult, CodeGenerator, FrontEnd, IntermediateProgram, TargetProgram, Toolchain},
};
use crate::domain::{
  config::{ToolCommand, ToolchainConfig},
  log::{Diagnostic, LogOrigin},
  project::{CheckedProject, ProjectOptions},
};

#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
  #[error("No `{0}` command configured in [toolchain]")]
  MissingTool(&'static str),
}

// ============================================================================
// External Tool
// ============================================================================

/// One external command speaking JSON over stdio
#[derive(Debug, Clone)]
pub struct ExternalTool {
  command: ToolCommand,
}

impl ExternalTool {
  pub fn new(command: ToolCommand) -> Self {
    Self { command }
  }

  /// Run `operation` with `request` as input and parse the reply
  pub async fn call<Req, Res>(&self, operation: &str, request: &Req) -> anyhow::Result<Res>
  where
    Req: Serialize + ?Sized,
    Res: DeserializeOwned,
  {
    let program = &self.command.program;
    let input = serde_json::to_vec(request).context("failed to encode tool request")?;
    trace!(%program, operation, bytes = input.len(), "Invoking tool");

    let mut child = Command::new(program)
      .args(&self.command.args)
      .arg(operation)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .with_context(|| format!("failed to start `{program}`"))?;

    let mut stdin = child.stdin.take().context("tool stdin was not captured")?;
    let write = async move {
      stdin.write_all(&input).await?;
      stdin.shutdown().await
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output = output.with_context(|| format!("failed to wait for `{program} {operation}`"))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      bail!("`{program} {operation}` exited with {}: {}", output.status, stderr.trim());
    }
    written.with_context(|| format!("failed to write request to `{program} {operation}`"))?;

    debug!(%program, operation, bytes = output.stdout.len(), "Tool replied");
    serde_json::from_slice(&output.stdout).with_context(|| format!("invalid reply from `{program} {operation}`"))
  }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionsRequest<'a> {
  project_file: &'a Path,
  defines: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeDirRequest<'a> {
  project_file: &'a Path,
}

#[derive(Debug, Deserialize)]
struct CheckReply {
  #[serde(default)]
  diagnostics: Vec<Diagnostic>,
  #[serde(default)]
  analysis: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformRequest<'a> {
  file: &'a Path,
  analysis: &'a Value,
  compiler_options: &'a Map<String, Value>,
  plugins: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetRequest<'a> {
  program: &'a IntermediateProgram,
  compiler_options: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TargetReply {
  program: TargetProgram,
  #[serde(default)]
  diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// Collaborators
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExternalBuildOptions(ExternalTool);

#[async_trait]
impl BuildOptionsProvider for ExternalBuildOptions {
  async fn derive_options(&self, defines: &[String], project_file: &Path) -> anyhow::Result<ProjectOptions> {
    self.0.call("options", &OptionsRequest { project_file, defines }).await
  }

  async fn resolve_runtime_dir(&self, project_file: &Path) -> anyhow::Result<Option<PathBuf>> {
    self.0.call("runtime-dir", &RuntimeDirRequest { project_file }).await
  }
}

#[derive(Debug, Clone)]
pub struct ExternalFrontEnd(ExternalTool);

#[async_trait]
impl FrontEnd for ExternalFrontEnd {
  async fn check_project(&self, options: &ProjectOptions) -> anyhow::Result<CheckResult> {
    let reply: CheckReply = self.0.call("check", options).await?;
    Ok(CheckResult {
      diagnostics: reply.diagnostics,
      checked: CheckedProject::new(reply.analysis),
    })
  }

  fn describe(&self, checked: &CheckedProject) -> Value {
    checked.downcast_ref::<Value>().cloned().unwrap_or(Value::Null)
  }
}

#[derive(Debug, Clone)]
pub struct ExternalCodeGenerator(ExternalTool);

#[async_trait]
impl CodeGenerator for ExternalCodeGenerator {
  async fn transform_file(
    &self,
    checked: &CheckedProject,
    ctx: &mut CompileContext,
  ) -> anyhow::Result<IntermediateProgram> {
    let analysis = checked
      .downcast_ref::<Value>()
      .context("analysis was not produced by an external front-end")?;
    let request = TransformRequest {
      file: &ctx.file,
      analysis,
      compiler_options: &ctx.compiler_options,
      plugins: ctx.plugins.iter().map(|p| p.name()).collect(),
    };
    self.0.call("transform", &request).await
  }

  async fn to_target(&self, program: IntermediateProgram, ctx: &mut CompileContext) -> anyhow::Result<TargetProgram> {
    let request = TargetRequest {
      program: &program,
      compiler_options: &ctx.compiler_options,
    };
    let reply: TargetReply = self.0.call("target", &request).await?;
    for diagnostic in reply.diagnostics {
      ctx.log.push(crate::domain::log::LogEntry {
        message: diagnostic.message,
        severity: diagnostic.severity,
        range: diagnostic.range,
        file: diagnostic.file,
        origin: LogOrigin::CodeGen,
      });
    }
    Ok(reply.program)
  }
}

/// Build a [`Toolchain`] from the `[toolchain]` config section
pub fn toolchain_from_config(config: &ToolchainConfig) -> Result<Toolchain, ToolchainError> {
  let build_options = config
    .build_options
    .clone()
    .ok_or(ToolchainError::MissingTool("build_options"))?;
  let frontend = config.frontend.clone().ok_or(ToolchainError::MissingTool("frontend"))?;
  let codegen = config.codegen.clone().ok_or(ToolchainError::MissingTool("codegen"))?;

  Ok(Toolchain::new(
    Arc::new(ExternalBuildOptions(ExternalTool::new(build_options))),
    Arc::new(ExternalFrontEnd(ExternalTool::new(frontend))),
    Arc::new(ExternalCodeGenerator(ExternalTool::new(codegen))),
  ))
}
