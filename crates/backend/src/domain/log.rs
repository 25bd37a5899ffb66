//! Per-request log sink
//!
//! Every compile request gets its own [`LogSink`]. The resolver forwards
//! front-end diagnostics into it, code generation may append more, and the
//! translation step attaches the whole collection to the output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Error,
  Warning,
  Info,
}

/// Where a log entry was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOrigin {
  FrontEnd,
  CodeGen,
  Plugin,
  Service,
}

/// A 1-based line/column span inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
  pub start_line: u32,
  pub start_column: u32,
  pub end_line: u32,
  pub end_column: u32,
}

impl SourceRange {
  pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
    Self {
      start_line,
      start_column,
      end_line,
      end_column,
    }
  }
}

/// Diagnostic reported by the front-end for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
  pub message: String,
  pub severity: Severity,
  pub range: Option<SourceRange>,
  pub file: Option<PathBuf>,
}

impl Diagnostic {
  pub fn error(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      severity: Severity::Error,
      range: None,
      file: None,
    }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      severity: Severity::Warning,
      range: None,
      file: None,
    }
  }

  pub fn at(mut self, file: impl Into<PathBuf>, range: SourceRange) -> Self {
    self.file = Some(file.into());
    self.range = Some(range);
    self
  }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub message: String,
  pub severity: Severity,
  pub range: Option<SourceRange>,
  pub file: Option<PathBuf>,
  pub origin: LogOrigin,
}

/// Append-only collection of log entries for one compiler instance
#[derive(Debug, Clone, Default)]
pub struct LogSink {
  entries: Vec<LogEntry>,
}

impl LogSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, entry: LogEntry) {
    self.entries.push(entry);
  }

  /// Record a front-end diagnostic
  pub fn diagnostic(&mut self, diagnostic: Diagnostic) {
    self.push(LogEntry {
      message: diagnostic.message,
      severity: diagnostic.severity,
      range: diagnostic.range,
      file: diagnostic.file,
      origin: LogOrigin::FrontEnd,
    });
  }

  pub fn warn(&mut self, origin: LogOrigin, message: impl Into<String>, file: Option<PathBuf>) {
    self.push(LogEntry {
      message: message.into(),
      severity: Severity::Warning,
      range: None,
      file,
      origin,
    });
  }

  pub fn error(&mut self, origin: LogOrigin, message: impl Into<String>, file: Option<PathBuf>) {
    self.push(LogEntry {
      message: message.into(),
      severity: Severity::Error,
      range: None,
      file,
      origin,
    });
  }

  pub fn has_errors(&self) -> bool {
    self.entries.iter().any(|e| e.severity == Severity::Error)
  }

  pub fn entries(&self) -> &[LogEntry] {
    &self.entries
  }

  pub fn into_entries(self) -> Vec<LogEntry> {
    self.entries
  }
}
