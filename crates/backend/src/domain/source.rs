use std::path::{Path, PathBuf};

/// Kind of file a compile request targets, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
  /// Project manifest
  Project,
  /// Standalone script forming its own single-file project
  Script,
  /// Ordinary source file owned by a loaded project
  Source,
  /// Signature-only file
  Signature,
  /// Not a recognised source kind
  Other,
}

impl std::fmt::Display for SourceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Self::Project => "project",
      Self::Script => "script",
      Self::Source => "source",
      Self::Signature => "signature",
      Self::Other => "other",
    };
    f.write_str(name)
  }
}

/// Normalize a path to an absolute form for use as a map key.
///
/// Existing paths are canonicalized; paths that do not exist (yet) are made
/// absolute against the current directory without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
  if let Ok(canonical) = path.canonicalize() {
    return canonical;
  }
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
