//! Part capability model.
//!
//! Parts are the payload of leaf nodes. The engine never inspects their
//! concrete type; it only asks a part which [`Capability`] values it exposes
//! and invokes them through [`PartHandle::perform`].

mod core;
mod themed;

pub use core::{Capability, CloneDepth, Part, PartHandle, PartIdentity, Role};
pub use themed::{Palette, ThemedPart};
