//! Collaborator seams
//!
//! The service does not parse, type-check or generate code itself. It drives
//! three collaborators through these traits and treats their results as opaque
//! handles.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::context::CompileContext;
use crate::domain::{
  log::Diagnostic,
  project::{CheckedProject, ProjectOptions},
};

/// Output of a whole-project front-end run
#[derive(Debug, Clone)]
pub struct CheckResult {
  pub diagnostics: Vec<Diagnostic>,
  pub checked: CheckedProject,
}

/// Front-end-to-intermediate result for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateProgram {
  pub file: PathBuf,
  pub body: serde_json::Value,
  /// Files the translation of `file` depends on
  #[serde(default)]
  pub dependencies: Vec<PathBuf>,
}

/// Target-language program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetProgram {
  pub body: Vec<serde_json::Value>,
}

impl TargetProgram {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.body.is_empty()
  }
}

/// Discovers project build options ("project cracking")
#[async_trait]
pub trait BuildOptionsProvider: Send + Sync {
  async fn derive_options(&self, defines: &[String], project_file: &Path) -> anyhow::Result<ProjectOptions>;

  /// Locate the shared runtime assets for a project, if they can be found
  async fn resolve_runtime_dir(&self, project_file: &Path) -> anyhow::Result<Option<PathBuf>>;
}

/// Parses and type-checks whole projects
#[async_trait]
pub trait FrontEnd: Send + Sync {
  async fn check_project(&self, options: &ProjectOptions) -> anyhow::Result<CheckResult>;

  /// Serializable view of an analysis, written by the analysis dump
  fn describe(&self, _checked: &CheckedProject) -> serde_json::Value {
    serde_json::Value::Null
  }
}

/// Turns checked files into target programs
#[async_trait]
pub trait CodeGenerator: Send + Sync {
  async fn transform_file(
    &self,
    checked: &CheckedProject,
    ctx: &mut CompileContext,
  ) -> anyhow::Result<IntermediateProgram>;

  async fn to_target(&self, program: IntermediateProgram, ctx: &mut CompileContext) -> anyhow::Result<TargetProgram>;
}

/// The set of collaborators a compiler actor works with
#[derive(Clone)]
pub struct Toolchain {
  pub build_options: Arc<dyn BuildOptionsProvider>,
  pub frontend: Arc<dyn FrontEnd>,
  pub codegen: Arc<dyn CodeGenerator>,
}

impl Toolchain {
  pub fn new(
    build_options: Arc<dyn BuildOptionsProvider>,
    frontend: Arc<dyn FrontEnd>,
    codegen: Arc<dyn CodeGenerator>,
  ) -> Self {
    Self {
      build_options,
      frontend,
      codegen,
    }
  }
}

impl std::fmt::Debug for Toolchain {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Toolchain").finish_non_exhaustive()
  }
}
