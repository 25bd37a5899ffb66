use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use serde_json::{Map, Value};

use super::plugins::PluginInstance;
use crate::{domain::log::LogSink, ipc::CompileRequest};

/// Extra option naming a directory for analysis dumps
pub const DUMP_DIR_OPTION: &str = "dumpAnalysisDir";

/// Per-request compiler context.
///
/// Created by the actor for each request, used mutably while resolving the
/// project, then moved into the translation task.
#[derive(Debug)]
pub struct CompileContext {
  pub file: PathBuf,
  pub compiler_options: Map<String, Value>,
  pub extra_options: Map<String, Value>,
  pub defines: Vec<String>,
  pub plugins: Vec<Arc<PluginInstance>>,
  pub log: LogSink,
}

impl CompileContext {
  pub fn new(file: PathBuf, request: CompileRequest, plugins: Vec<Arc<PluginInstance>>) -> Self {
    Self {
      file,
      compiler_options: request.compiler_options,
      extra_options: request.extra_options,
      defines: request.defines,
      plugins,
      log: LogSink::new(),
    }
  }

  pub fn file(&self) -> &Path {
    &self.file
  }

  /// Directory for analysis dumps, if the request asked for one
  pub fn dump_dir(&self) -> Option<PathBuf> {
    self
      .extra_options
      .get(DUMP_DIR_OPTION)
      .and_then(Value::as_str)
      .filter(|dir| !dir.is_empty())
      .map(PathBuf::from)
  }
}
