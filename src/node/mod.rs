//! Component tree orchestrator.
//!
//! Callers work with [`ComponentTree`] and the [`ComponentNode`] variants it
//! stores; slot bookkeeping stays private to `core`.

mod core;

pub use core::{ComponentNode, ComponentTree, NodeId};
