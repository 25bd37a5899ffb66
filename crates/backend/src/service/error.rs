//! Error types for compile requests.
//!
//! Front-end diagnostics are not errors: they are collected in the request's
//! log sink. Everything here fails the triggering request only and is turned
//! into a structured error reply.

use std::path::PathBuf;

use super::plugins::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
  // --- configuration ---
  #[error(transparent)]
  PluginLoad(#[from] PluginError),
  #[error("Cannot find the shared runtime directory for project {}", project.display())]
  RuntimeDirNotFound { project: PathBuf },

  // --- membership ---
  #[error("{} doesn't belong to any of the loaded projects: {}", path.display(), format_projects(projects))]
  NotInProject { path: PathBuf, projects: Vec<PathBuf> },
  #[error("Signature files cannot be compiled: {}", path.display())]
  SignatureFile { path: PathBuf },
  #[error("Not a recognised source file: {}", path.display())]
  UnsupportedFile { path: PathBuf },

  // --- request decoding ---
  #[error("Invalid compile request: {0}")]
  Decode(#[from] serde_json::Error),

  // --- collaborators ---
  #[error("Failed to derive options for {}: {cause:#}", project.display())]
  BuildOptions { project: PathBuf, cause: anyhow::Error },
  #[error("Front-end failed to check {}: {cause:#}", project.display())]
  FrontEnd { project: PathBuf, cause: anyhow::Error },
  #[error("Code generation failed for {}: {cause:#}", file.display())]
  CodeGen { file: PathBuf, cause: anyhow::Error },
  #[error("Failed to write analysis dump to {}: {source}", dir.display())]
  Dump {
    dir: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Internal error: {0}")]
  Internal(String),
}

fn format_projects(projects: &[PathBuf]) -> String {
  if projects.is_empty() {
    return "(none)".to_string();
  }
  projects
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

impl CompileError {
  /// Get the reply error code for this error.
  ///
  /// - `-32700`: the request could not be decoded
  /// - `-32602`: the target file cannot be compiled (membership errors)
  /// - `-32000`: everything else
  pub fn code(&self) -> i32 {
    match self {
      Self::Decode(_) => -32700,
      Self::NotInProject { .. } | Self::SignatureFile { .. } | Self::UnsupportedFile { .. } => -32602,
      _ => -32000,
    }
  }

  /// Whether the error comes from configuration (plugins, runtime directory)
  pub fn is_configuration(&self) -> bool {
    matches!(self, Self::PluginLoad(_) | Self::RuntimeDirNotFound { .. })
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::Internal(msg.into())
  }

  /// Render the error with every source in its chain
  pub fn chain(&self) -> String {
    let mut rendered = self.to_string();
    let mut source = std::error::Error::source(self);
    while let Some(cause) = source {
      let cause_text = cause.to_string();
      if !rendered.contains(&cause_text) {
        rendered.push_str(": ");
        rendered.push_str(&cause_text);
      }
      source = cause.source();
    }
    rendered
  }
}
