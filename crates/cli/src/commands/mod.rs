//! CLI command implementations

mod config;
mod serve;

pub use config::{cmd_config_init, cmd_config_show};
pub use serve::cmd_serve;
