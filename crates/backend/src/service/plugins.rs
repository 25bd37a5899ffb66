//! Plugin loading with a per-path cache
//!
//! Plugins are shared libraries exporting a registration entry point named
//! [`PLUGIN_ENTRY_SYMBOL`]. The entry point receives a [`PluginRegistrar`] and
//! registers every plugin the library contributes. Loading the same path twice
//! never reopens the library: the second lookup returns the cached instances.

use std::{
  collections::{HashMap, HashSet},
  path::{Path, PathBuf},
  sync::Arc,
};

use libloading::{Library, Symbol};
use tracing::{debug, info, warn};

use crate::domain::source::normalize_path;

/// Exported symbol every plugin library must provide
pub const PLUGIN_ENTRY_SYMBOL: &[u8] = b"compilerd_register_plugins\0";

/// Signature of [`PLUGIN_ENTRY_SYMBOL`]
pub type PluginEntry = unsafe extern "Rust" fn(registrar: &mut dyn PluginRegistrar);

/// Capability implemented by compiler extensions
pub trait CompilerPlugin: Send + Sync {
  fn name(&self) -> &str;
}

/// Receives plugins from a library's entry point
pub trait PluginRegistrar {
  fn register(&mut self, plugin: Box<dyn CompilerPlugin>);
}

impl PluginRegistrar for Vec<Box<dyn CompilerPlugin>> {
  fn register(&mut self, plugin: Box<dyn CompilerPlugin>) {
    self.push(plugin);
  }
}

// ============================================================================
// Plugin Instances
// ============================================================================

/// A loaded plugin together with the library that provides its code
pub struct PluginInstance {
  // Declared before `_library` so the plugin is dropped first.
  plugin: Box<dyn CompilerPlugin>,
  path: PathBuf,
  _library: Option<Arc<Library>>,
}

impl PluginInstance {
  /// Wrap a plugin that is linked into the current binary
  pub fn new(path: impl Into<PathBuf>, plugin: Box<dyn CompilerPlugin>) -> Self {
    Self {
      plugin,
      path: path.into(),
      _library: None,
    }
  }

  pub fn name(&self) -> &str {
    self.plugin.name()
  }

  /// Library path this plugin was loaded from
  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn plugin(&self) -> &dyn CompilerPlugin {
    self.plugin.as_ref()
  }
}

impl std::fmt::Debug for PluginInstance {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PluginInstance")
      .field("name", &self.name())
      .field("path", &self.path)
      .finish()
  }
}

// ============================================================================
// Loaders
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
  #[error("Failed to load plugin {}: {source}", path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: libloading::Error,
  },
  #[error("Plugin {} does not export `compilerd_register_plugins`: {source}", path.display())]
  MissingEntry {
    path: PathBuf,
    #[source]
    source: libloading::Error,
  },
  #[error("Failed to load plugin {}: {message}", path.display())]
  Other { path: PathBuf, message: String },
}

impl PluginError {
  pub fn path(&self) -> &Path {
    match self {
      Self::Open { path, .. } | Self::MissingEntry { path, .. } | Self::Other { path, .. } => path,
    }
  }
}

/// Loads the plugins contributed by one library path
pub trait PluginLoader: Send + Sync {
  fn load(&self, path: &Path) -> Result<Vec<Arc<PluginInstance>>, PluginError>;
}

/// Loads plugins from shared libraries via `libloading`
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibLoader;

impl PluginLoader for DylibLoader {
  fn load(&self, path: &Path) -> Result<Vec<Arc<PluginInstance>>, PluginError> {
    // SAFETY: loading a library runs its initialisers; plugin paths come from
    // the client's configuration and are trusted like any other build input.
    let library = unsafe { Library::new(path) }.map_err(|source| PluginError::Open {
      path: path.to_path_buf(),
      source,
    })?;
    let library = Arc::new(library);

    let mut registered: Vec<Box<dyn CompilerPlugin>> = Vec::new();
    {
      // SAFETY: the symbol type is fixed by the plugin contract.
      let entry: Symbol<PluginEntry> =
        unsafe { library.get(PLUGIN_ENTRY_SYMBOL) }.map_err(|source| PluginError::MissingEntry {
          path: path.to_path_buf(),
          source,
        })?;
      let registrar: &mut dyn PluginRegistrar = &mut registered;
      // SAFETY: the library stays loaded while `entry` is borrowed from it.
      unsafe { entry(registrar) };
    }

    Ok(
      registered
        .into_iter()
        .map(|plugin| {
          Arc::new(PluginInstance {
            plugin,
            path: path.to_path_buf(),
            _library: Some(Arc::clone(&library)),
          })
        })
        .collect(),
    )
  }
}

// ============================================================================
// Plugin Cache
// ============================================================================

/// Path-keyed cache of loaded plugins, owned by the compiler actor
pub struct PluginCache {
  loader: Arc<dyn PluginLoader>,
  loaded: HashMap<PathBuf, Vec<Arc<PluginInstance>>>,
}

impl PluginCache {
  pub fn new(loader: Arc<dyn PluginLoader>) -> Self {
    Self {
      loader,
      loaded: HashMap::new(),
    }
  }

  /// Resolve the plugins for `paths`, loading only paths not seen before.
  ///
  /// Plugins are returned in request order. The first failing path aborts the
  /// whole call.
  pub fn load_plugins(&mut self, paths: &[PathBuf]) -> Result<Vec<Arc<PluginInstance>>, PluginError> {
    let mut plugins = Vec::new();
    let mut seen = HashSet::new();

    for path in paths {
      let path = normalize_path(path);
      if !seen.insert(path.clone()) {
        continue;
      }

      if let Some(instances) = self.loaded.get(&path) {
        debug!(plugin = %path.display(), count = instances.len(), "Reusing loaded plugins");
        plugins.extend(instances.iter().cloned());
        continue;
      }

      let instances = self.loader.load(&path)?;
      if instances.is_empty() {
        warn!(plugin = %path.display(), "Plugin library registered no plugins");
      }
      for instance in &instances {
        info!(plugin = %path.display(), name = instance.name(), "Loaded plugin");
      }
      plugins.extend(instances.iter().cloned());
      self.loaded.insert(path, instances);
    }

    Ok(plugins)
  }

  /// Number of library paths loaded so far
  pub fn len(&self) -> usize {
    self.loaded.len()
  }

  pub fn is_empty(&self) -> bool {
    self.loaded.is_empty()
  }
}
