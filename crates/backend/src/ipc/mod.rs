//! IPC module - request/response envelopes for the JSON-lines protocol
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{domain::log::LogEntry, service::toolchain::TargetProgram};

// ============================================================================
// Compile request
// ============================================================================

/// Body of a compile request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
  /// File to translate
  pub path: PathBuf,
  /// Free-form compiler options, passed to code generation
  #[serde(default)]
  pub compiler_options: Map<String, Value>,
  /// Free-form per-request options (e.g. `dumpAnalysisDir`)
  #[serde(default)]
  pub extra_options: Map<String, Value>,
  /// Plugin library paths
  #[serde(default)]
  pub plugins: Vec<PathBuf>,
  /// Preprocessor define symbols
  #[serde(default)]
  pub defines: Vec<String>,
}

impl CompileRequest {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      ..Self::default()
    }
  }

  pub fn with_plugins(mut self, plugins: Vec<PathBuf>) -> Self {
    self.plugins = plugins;
    self
  }

  pub fn with_extra_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.extra_options.insert(key.into(), value.into());
    self
  }
}

/// Successful translation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileOutput {
  pub program: TargetProgram,
  pub diagnostics: Vec<LogEntry>,
  pub dependencies: Vec<PathBuf>,
}

/// Structured error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Compile error {code}: {message}")]
pub struct ErrorReply {
  pub code: i32,
  pub message: String,
}

// ============================================================================
// Wire envelopes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
  /// Correlation id; generated when the client omits it
  #[serde(default)]
  pub id: Option<String>,
  pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
  pub id: String,
  #[serde(flatten)]
  pub scenario: ResponseScenario,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseScenario {
  Result(CompileOutput),
  Error(ErrorReply),
}

impl Response {
  pub fn success(id: impl Into<String>, output: CompileOutput) -> Self {
    Self {
      id: id.into(),
      scenario: ResponseScenario::Result(output),
    }
  }

  pub fn rpc_error(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      scenario: ResponseScenario::Error(ErrorReply {
        code,
        message: message.into(),
      }),
    }
  }

  pub fn is_error(&self) -> bool {
    matches!(self.scenario, ResponseScenario::Error(_))
  }

  pub fn get_output(&self) -> Option<&CompileOutput> {
    match &self.scenario {
      ResponseScenario::Result(output) => Some(output),
      ResponseScenario::Error(_) => None,
    }
  }

  pub fn get_error(&self) -> Option<&ErrorReply> {
    match &self.scenario {
      ResponseScenario::Error(error) => Some(error),
      ResponseScenario::Result(_) => None,
    }
  }
}
