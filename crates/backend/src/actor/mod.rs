//! Actor-based concurrency for the compile service
//!
//! All mutable compile state (project store, plugin cache) is owned by a single
//! [`CompilerActor`]. Callers talk to it through a cheap, cloneable
//! [`CompilerHandle`]; every request carries its own `oneshot` reply channel.
//!
//! # Architecture
//!
//! - The actor handles one message at a time; resolving a request (and any
//!   front-end rebuild it triggers) completes before the next one is read
//! - Translation runs in a separate task per request and never touches the
//!   actor's state
//! - Replies may complete out of order; callers correlate by request id
//!
//! # Actors
//!
//! - [`CompilerActor`]: owns the project store and plugin cache
//! - translation tasks: one per request, see [`translate`]

mod compiler;
pub mod handle;
pub mod message;
pub mod translate;

#[cfg(test)]
mod __tests__;

pub use compiler::{CompilerActor, CompilerActorConfig};
pub use handle::{CompilerHandle, SendError};
pub use message::{CompileReply, CompilerMessage};
