//! Configuration commands

use std::path::Path;

use anyhow::{Context, Result, bail};
use compilerd::config::Config;

/// Show the effective configuration and where it came from
pub async fn cmd_config_show(config: &Config, explicit: Option<&Path>) -> Result<()> {
  let cwd = std::env::current_dir()?;

  let project_config = Config::project_config_path(&cwd);
  let user_config = Config::user_config_path();

  println!("Effective configuration for: {:?}", cwd);
  println!();

  if let Some(path) = explicit {
    println!("Using config: {:?}", path);
  } else if project_config.exists() {
    println!("Using project config: {:?}", project_config);
  } else if let Some(ref user_path) = user_config
    && user_path.exists()
  {
    println!("Using user config: {:?}", user_path);
  } else {
    println!("Using default configuration (no config file found)");
  }
  println!();

  let toml_str = toml::to_string_pretty(config)?;
  println!("{}", toml_str);

  Ok(())
}

/// Write a commented config template to the current directory
pub async fn cmd_config_init() -> Result<()> {
  let cwd = std::env::current_dir()?;
  let config_path = Config::project_config_path(&cwd);

  if config_path.exists() {
    bail!("Config file already exists: {:?} (delete it first to regenerate)", config_path);
  }

  std::fs::write(&config_path, Config::generate_template())
    .with_context(|| format!("Failed to write {:?}", config_path))?;

  println!("Created project config: {:?}", config_path);
  println!("Fill in the [toolchain] section before running `compilerd serve`.");

  Ok(())
}
