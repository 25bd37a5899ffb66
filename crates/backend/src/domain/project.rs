//! Project model and state store
//!
//! A [`Project`] is an immutable snapshot once published: the store hands out
//! `Arc<Project>` and any later change (marking a file compiled, a rebuild)
//! produces a new value rather than touching one a translation may be using.

use std::{
  any::Any,
  collections::{BTreeMap, HashSet},
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use serde::{Deserialize, Serialize};

// ============================================================================
// Collaborator Handles
// ============================================================================

/// Build options derived for a project by the build-options collaborator.
///
/// Only `source_files` is interpreted here: it is the authority on which files
/// belong to the project. `raw` is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOptions {
  pub project_file: PathBuf,
  /// Source files in compilation order
  pub source_files: Vec<PathBuf>,
  #[serde(default)]
  pub defines: Vec<String>,
  #[serde(default)]
  pub raw: serde_json::Value,
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Opaque result of a completed front-end analysis
#[derive(Clone)]
pub struct CheckedProject {
  generation: u64,
  inner: Arc<dyn Any + Send + Sync>,
}

impl CheckedProject {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self {
      generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
      inner: Arc::new(value),
    }
  }

  /// Unique per analysis run; a rebuild always yields a new generation
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.inner.downcast_ref::<T>()
  }
}

impl std::fmt::Debug for CheckedProject {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CheckedProject").field("generation", &self.generation).finish()
  }
}

// ============================================================================
// Project Model
// ============================================================================

/// Compiled-status view of one project member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
  pub path: PathBuf,
  pub is_compiled: bool,
}

#[derive(Debug, Clone)]
pub struct Project {
  project_file: PathBuf,
  options: Arc<ProjectOptions>,
  runtime_dir: PathBuf,
  checked: CheckedProject,
  /// Membership, derived from `options`
  members: HashSet<PathBuf>,
  /// Files translated against the current analysis
  compiled: HashSet<PathBuf>,
}

impl Project {
  pub fn new(
    project_file: PathBuf,
    options: Arc<ProjectOptions>,
    runtime_dir: PathBuf,
    checked: CheckedProject,
  ) -> Self {
    let members = options.source_files.iter().cloned().collect();
    Self {
      project_file,
      options,
      runtime_dir,
      checked,
      members,
      compiled: HashSet::new(),
    }
  }

  pub fn project_file(&self) -> &Path {
    &self.project_file
  }

  pub fn options(&self) -> &Arc<ProjectOptions> {
    &self.options
  }

  pub fn runtime_dir(&self) -> &Path {
    &self.runtime_dir
  }

  pub fn checked(&self) -> &CheckedProject {
    &self.checked
  }

  /// Source files in compilation order
  pub fn source_files(&self) -> &[PathBuf] {
    &self.options.source_files
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.members.contains(path)
  }

  pub fn is_compiled(&self, path: &Path) -> bool {
    self.compiled.contains(path)
  }

  /// Look up the entry for a member file
  pub fn file(&self, path: &Path) -> Option<FileEntry> {
    self.contains(path).then(|| FileEntry {
      path: path.to_path_buf(),
      is_compiled: self.is_compiled(path),
    })
  }

  pub fn files(&self) -> impl Iterator<Item = FileEntry> + '_ {
    self.options.source_files.iter().map(|path| FileEntry {
      path: path.clone(),
      is_compiled: self.is_compiled(path),
    })
  }

  /// Record that `path` has been routed through this project.
  ///
  /// The project file itself is accepted as well, since manifests are valid
  /// request targets.
  pub fn mark_compiled(&mut self, path: &Path) {
    self.compiled.insert(path.to_path_buf());
  }
}

// ============================================================================
// State Store
// ============================================================================

/// Mapping from project file to its current model
///
/// Ordered by path so listings and ownership lookups are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
  projects: BTreeMap<PathBuf, Arc<Project>>,
}

impl ProjectStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, project_file: &Path) -> Option<&Arc<Project>> {
    self.projects.get(project_file)
  }

  /// Insert or replace the model for its project file
  pub fn insert(&mut self, project: Project) -> Arc<Project> {
    let project = Arc::new(project);
    self
      .projects
      .insert(project.project_file().to_path_buf(), Arc::clone(&project));
    project
  }

  /// Find the project that owns `path` as a member file
  pub fn find_owner(&self, path: &Path) -> Option<&Arc<Project>> {
    self.projects.values().find(|project| project.contains(path))
  }

  /// Mark `path` compiled in the given project, copying the model if a
  /// translation still holds the current snapshot.
  pub fn mark_compiled(&mut self, project_file: &Path, path: &Path) -> Option<Arc<Project>> {
    let project = self.projects.get_mut(project_file)?;
    if !project.is_compiled(path) {
      Arc::make_mut(project).mark_compiled(path);
    }
    Some(Arc::clone(project))
  }

  pub fn project_files(&self) -> Vec<PathBuf> {
    self.projects.keys().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }
}
