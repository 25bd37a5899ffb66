//! Compile services.
//!
//! This module contains the logic the compiler actor drives, kept separate from
//! the actor's message handling.
//!
//! ## Available Services
//!
//! - [`resolve`] - Invalidation resolver: project ownership and rebuild decisions
//! - [`plugins`] - Plugin loading with a per-path cache
//! - [`toolchain`] - Collaborator traits (build options, front-end, code generation)
//! - [`external`] - Process-backed collaborators
//! - [`dump`] - Analysis dumps

pub mod context;
pub mod dump;
pub mod error;
pub mod external;
pub mod plugins;
pub mod resolve;
pub mod toolchain;

pub use context::CompileContext;
pub use error::CompileError;
pub use resolve::ProjectResolver;
pub use toolchain::{BuildOptionsProvider, CheckResult, CodeGenerator, FrontEnd, Toolchain};
