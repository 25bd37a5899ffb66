//! Domain types - core entities of the compile service
//!
//! These types describe projects, source kinds, diagnostics and configuration,
//! and are independent of the actor and wire concerns.

pub mod config;
pub mod log;
pub mod project;
pub mod source;
