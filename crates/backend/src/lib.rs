mod actor;
mod server;

pub mod domain;
pub mod ipc;
pub mod service;

pub use actor::{CompileReply, CompilerActor, CompilerActorConfig, CompilerHandle, SendError};
pub use domain::config;
pub use server::{ServerError, serve_lines};
