//! Analysis dumps for debugging front-end results

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::CompileError;
use crate::domain::{log::Diagnostic, project::ProjectOptions};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisDump<'a> {
  project_file: &'a Path,
  generation: u64,
  source_files: &'a [PathBuf],
  diagnostics: &'a [Diagnostic],
  analysis: serde_json::Value,
}

/// File the dump for `project_file` is written to inside `dir`
pub fn dump_path(dir: &Path, project_file: &Path) -> PathBuf {
  let stem = project_file
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| "project".to_string());
  dir.join(format!("{stem}.analysis.json"))
}

/// Write one project's analysis to `<dir>/<stem>.analysis.json`
pub async fn write_analysis_dump(
  dir: &Path,
  options: &ProjectOptions,
  generation: u64,
  diagnostics: &[Diagnostic],
  analysis: serde_json::Value,
) -> Result<PathBuf, CompileError> {
  let io_err = |source| CompileError::Dump {
    dir: dir.to_path_buf(),
    source,
  };

  let dump = AnalysisDump {
    project_file: &options.project_file,
    generation,
    source_files: &options.source_files,
    diagnostics,
    analysis,
  };
  let json = serde_json::to_vec_pretty(&dump).map_err(|e| io_err(e.into()))?;

  tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
  let path = dump_path(dir, &options.project_file);
  tokio::fs::write(&path, json).await.map_err(io_err)?;
  Ok(path)
}
