//! Error module orchestrator.
//!
//! Every fallible operation in the crate returns [`Result`] with a
//! [`ComposeError`]; the variants live in the private `types` module.

mod types;

pub use types::{ComposeError, Result};
