//! Composition engine orchestrator.
//!
//! [`CompositionEngine::assemble`] turns a [`Blueprint`] into a
//! [`crate::ComponentTree`] using one family's factory, and
//! [`CompositionEngine::dispatch`] runs a named operation over a tree in
//! pre-order.

mod blueprint;
mod config;
mod core;

pub use blueprint::{Blueprint, GroupSpec, PartSpec};
pub use config::{DEFAULT_LOG_TARGET, DEFAULT_MAX_DEPTH, EngineConfig};
pub use core::{CompositionEngine, DispatchReport, Effect};
