//! Invalidation resolver
//!
//! Decides, for each incoming request, which project owns the target file and
//! whether that project's analysis can be reused or must be rebuilt through the
//! front-end first.
//!
//! | Kind      | Decision                                                            |
//! |-----------|---------------------------------------------------------------------|
//! | project   | always create the project (fresh options, fresh analysis)           |
//! | script    | own model: rebuild with fresh options; member of another project:   |
//! |           | watch rebuild of the owner; unknown: create a new project           |
//! | source    | compiled before: watch rebuild of the owner; otherwise reuse;       |
//! |           | unknown: membership error                                           |
//! | signature | error                                                               |
//! | other     | error                                                               |
//!
//! The target is marked compiled after every successful decision. The next
//! request for the same file is what triggers a watch rebuild.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Instant,
};

use tracing::{debug, info, warn};

use super::{
  context::CompileContext,
  dump,
  error::CompileError,
  toolchain::{CheckResult, Toolchain},
};
use crate::domain::{
  config::SourcesConfig,
  log::{LogOrigin, Severity},
  project::{Project, ProjectOptions, ProjectStore},
  source::{SourceKind, normalize_path},
};

/// What a project (re)creation may carry over from an earlier model
#[derive(Debug, Clone, Default)]
pub struct ProjectSeed {
  /// Options to reuse instead of deriving them again
  pub options: Option<Arc<ProjectOptions>>,
  /// Runtime directory of the project lineage
  pub runtime_dir: Option<PathBuf>,
}

impl ProjectSeed {
  /// Keep everything but the analysis (watch recompilation)
  pub fn watch(project: &Project) -> Self {
    Self {
      options: Some(Arc::clone(project.options())),
      runtime_dir: Some(project.runtime_dir().to_path_buf()),
    }
  }

  /// Keep only the runtime directory
  pub fn lineage(project: &Project) -> Self {
    Self {
      options: None,
      runtime_dir: Some(project.runtime_dir().to_path_buf()),
    }
  }
}

/// Resolves requests against the project store
#[derive(Debug, Clone)]
pub struct ProjectResolver {
  toolchain: Toolchain,
  sources: SourcesConfig,
}

impl ProjectResolver {
  pub fn new(toolchain: Toolchain, sources: SourcesConfig) -> Self {
    Self { toolchain, sources }
  }

  pub fn toolchain(&self) -> &Toolchain {
    &self.toolchain
  }

  /// Bring the store up to date for `ctx.file` and return the active project.
  ///
  /// The store is only written after a rebuild succeeds, so a failing request
  /// leaves the previous models in place.
  pub async fn update_state(
    &self,
    store: &mut ProjectStore,
    ctx: &mut CompileContext,
  ) -> Result<Arc<Project>, CompileError> {
    let path = ctx.file.clone();
    let kind = self.sources.classify(&path);
    debug!(file = %path.display(), %kind, "Resolving project");

    let project_file = match kind {
      SourceKind::Project => {
        let seed = store.get(&path).map(|p| ProjectSeed::lineage(p)).unwrap_or_default();
        let project = self.create_project(ctx, &path, seed).await?;
        store.insert(project);
        path.clone()
      }
      SourceKind::Script => {
        if let Some(existing) = store.get(&path) {
          let seed = ProjectSeed::lineage(existing);
          let project = self.create_project(ctx, &path, seed).await?;
          store.insert(project);
          path.clone()
        } else if let Some(owner) = store.find_owner(&path) {
          let owner_file = owner.project_file().to_path_buf();
          debug!(file = %path.display(), project = %owner_file.display(), "Script belongs to a loaded project");
          let seed = ProjectSeed::watch(owner);
          let project = self.create_project(ctx, &owner_file, seed).await?;
          store.insert(project);
          owner_file
        } else {
          let project = self.create_project(ctx, &path, ProjectSeed::default()).await?;
          store.insert(project);
          path.clone()
        }
      }
      SourceKind::Source => match store.find_owner(&path) {
        Some(owner) if owner.is_compiled(&path) => {
          let owner_file = owner.project_file().to_path_buf();
          info!(file = %path.display(), project = %owner_file.display(), "Compiled file changed, rechecking project");
          let seed = ProjectSeed::watch(owner);
          let project = self.create_project(ctx, &owner_file, seed).await?;
          store.insert(project);
          owner_file
        }
        Some(owner) => {
          debug!(file = %path.display(), project = %owner.project_file().display(), "Reusing checked project");
          owner.project_file().to_path_buf()
        }
        None => {
          return Err(CompileError::NotInProject {
            path,
            projects: store.project_files(),
          });
        }
      },
      SourceKind::Signature => return Err(CompileError::SignatureFile { path }),
      SourceKind::Other => return Err(CompileError::UnsupportedFile { path }),
    };

    store
      .mark_compiled(&project_file, &path)
      .ok_or_else(|| CompileError::internal(format!("project {} vanished from the store", project_file.display())))
  }

  /// Create a project model: derive options (unless seeded), resolve the
  /// runtime directory (unless seeded), run the front-end, forward its
  /// diagnostics and optionally dump the analysis.
  pub async fn create_project(
    &self,
    ctx: &mut CompileContext,
    project_file: &Path,
    seed: ProjectSeed,
  ) -> Result<Project, CompileError> {
    let build_options = &self.toolchain.build_options;
    let reused_options = seed.options.is_some();

    let options = match seed.options {
      Some(options) => options,
      None => {
        let mut options = build_options
          .derive_options(&ctx.defines, project_file)
          .await
          .map_err(|cause| CompileError::BuildOptions {
            project: project_file.to_path_buf(),
            cause,
          })?;
        // Membership is compared against normalized request paths
        for file in &mut options.source_files {
          *file = normalize_path(file);
        }
        Arc::new(options)
      }
    };

    let runtime_dir = match seed.runtime_dir {
      Some(dir) => dir,
      None => build_options
        .resolve_runtime_dir(project_file)
        .await
        .map_err(|cause| CompileError::BuildOptions {
          project: project_file.to_path_buf(),
          cause,
        })?
        .ok_or_else(|| CompileError::RuntimeDirNotFound {
          project: project_file.to_path_buf(),
        })?,
    };

    info!(
      project = %project_file.display(),
      files = options.source_files.len(),
      reused_options,
      "Checking project"
    );
    let started = Instant::now();
    let CheckResult { diagnostics, checked } =
      self
        .toolchain
        .frontend
        .check_project(&options)
        .await
        .map_err(|cause| CompileError::FrontEnd {
          project: project_file.to_path_buf(),
          cause,
        })?;

    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    info!(
      project = %project_file.display(),
      generation = checked.generation(),
      errors,
      warnings = diagnostics.len() - errors,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "Project checked"
    );

    if let Some(dir) = ctx.dump_dir() {
      let analysis = self.toolchain.frontend.describe(&checked);
      match dump::write_analysis_dump(&dir, &options, checked.generation(), &diagnostics, analysis).await {
        Ok(written) => debug!(path = %written.display(), "Wrote analysis dump"),
        Err(e) => {
          warn!(error = %e, "Failed to write analysis dump");
          ctx.log.warn(LogOrigin::Service, e.to_string(), Some(project_file.to_path_buf()));
        }
      }
    }

    for diagnostic in diagnostics {
      ctx.log.diagnostic(diagnostic);
    }

    Ok(Project::new(project_file.to_path_buf(), options, runtime_dir, checked))
  }
}
