//! Family-consistent part creation.
//!
//! A [`Family`] maps each [`crate::parts::Role`] to a constructor. Families
//! are collected into a read-only [`FamilyRegistry`]; one registry can be
//! installed process-wide. [`FamilyFactory`] is the per-family view callers
//! create parts through.

mod core;
pub mod presets;
mod registry;

pub use core::{Family, FamilyDescriptor, FamilyFactory, PartConstructor, PartContext};
pub use registry::{FamilyRegistry, FamilyRegistryBuilder};
