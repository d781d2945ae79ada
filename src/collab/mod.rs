//! Collaborators the engine consumes through a single capability each.
//!
//! - [`SharedResources`]: construct-once accessor for resources parts share.
//! - [`AdaptedPart`]: translates a [`ForeignWidget`] into the part contract.
//! - [`ShapePart`]: a drawable abstraction bridged to a [`Renderer`] implementation.
//!
//! Clone-by-value lives on [`crate::parts::PartHandle::duplicate`].

mod adapter;
mod bridge;
mod shared;

pub use adapter::{AdaptedPart, ForeignWidget, LegacyControl};
pub use bridge::{RasterRenderer, RasterSettings, Renderer, Shape, ShapePart, VectorRenderer};
pub use shared::{ResourceError, SharedResources};
