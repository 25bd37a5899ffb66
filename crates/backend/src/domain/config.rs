//! Configuration system for compilerd.
//!
//! Config priority: explicit path > project-relative (`.compilerd.toml`) > user
//! (`~/.config/compilerd/config.toml`) > defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::source::SourceKind;

/// File name looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".compilerd.toml";

// ============================================================================
// Source Kinds
// ============================================================================

/// Extension lists used to classify incoming request paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
  /// Project manifests (always trigger a full project creation)
  pub project: Vec<String>,
  /// Standalone scripts (single-file projects)
  pub script: Vec<String>,
  /// Ordinary source files owned by a loaded project
  pub source: Vec<String>,
  /// Signature-only files (never translated)
  pub signature: Vec<String>,
}

impl Default for SourcesConfig {
  fn default() -> Self {
    Self {
      project: vec!["fsproj".to_string()],
      script: vec!["fsx".to_string()],
      source: vec!["fs".to_string()],
      signature: vec!["fsi".to_string()],
    }
  }
}

impl SourcesConfig {
  /// Classify a path by its extension (case-insensitive)
  pub fn classify(&self, path: &Path) -> SourceKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
      return SourceKind::Other;
    };
    let matches = |list: &[String]| list.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext));

    if matches(&self.project) {
      SourceKind::Project
    } else if matches(&self.script) {
      SourceKind::Script
    } else if matches(&self.source) {
      SourceKind::Source
    } else if matches(&self.signature) {
      SourceKind::Signature
    } else {
      SourceKind::Other
    }
  }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Server lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// Log level: "off", "error", "warn", "info", "debug", "trace"
  /// Default: "info"
  #[serde(default = "default_log_level")]
  pub log_level: String,

  /// Log file rotation: "daily", "hourly", "never"
  /// Default: "daily"
  #[serde(default = "default_log_rotation")]
  pub log_rotation: String,

  /// Capacity of the compiler actor's request mailbox
  /// Default: 256
  #[serde(default = "default_mailbox_capacity")]
  pub mailbox_capacity: usize,
}

fn default_log_level() -> String {
  "info".to_string()
}
fn default_log_rotation() -> String {
  "daily".to_string()
}
fn default_mailbox_capacity() -> usize {
  256
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      log_level: default_log_level(),
      log_rotation: default_log_rotation(),
      mailbox_capacity: default_mailbox_capacity(),
    }
  }
}

// ============================================================================
// Toolchain Configuration
// ============================================================================

/// An external command; the operation name is appended as the last argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
  pub program: String,
  #[serde(default)]
  pub args: Vec<String>,
}

/// External collaborators used by `compilerd serve`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
  /// Derives project options and locates the shared runtime directory
  #[serde(skip_serializing_if = "Option::is_none")]
  pub build_options: Option<ToolCommand>,
  /// Parses and type-checks whole projects
  #[serde(skip_serializing_if = "Option::is_none")]
  pub frontend: Option<ToolCommand>,
  /// Turns checked files into target programs
  #[serde(skip_serializing_if = "Option::is_none")]
  pub codegen: Option<ToolCommand>,
}

// ============================================================================
// Root Configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub sources: SourcesConfig,
  pub server: ServerConfig,
  pub toolchain: ToolchainConfig,
}

impl Config {
  /// Load config from an explicit file
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load config for a working directory, with fallback to user config
  pub fn load_for_dir(dir: &Path) -> Self {
    let project_config = Self::project_config_path(dir);
    if project_config.exists()
      && let Ok(config) = Self::load(&project_config)
    {
      return config;
    }

    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(config) = Self::load(&user_config_path)
    {
      return config;
    }

    Self::default()
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("COMPILERD_CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("compilerd").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("compilerd").join("config.toml"))
  }

  /// Get the project-relative config path
  pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILE)
  }

  /// Render the default configuration with a commented toolchain section
  pub fn generate_template() -> String {
    let defaults = toml::to_string_pretty(&Self::default()).unwrap_or_default();
    format!(
      "# compilerd configuration\n\n{defaults}\n\
       # External collaborators. The operation name is appended to `args`.\n\
       # [toolchain.build_options]\n# program = \"project-cracker\"\n\n\
       # [toolchain.frontend]\n# program = \"checker\"\n\n\
       # [toolchain.codegen]\n# program = \"codegen\"\n"
    )
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read config {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Invalid config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}
