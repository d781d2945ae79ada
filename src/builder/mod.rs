//! Staged construction with an explicit `Open -> Sealed` state machine.

mod core;

pub use core::{BuildState, BuiltConfig, FieldMap, StagedBuilder, create_builder};
