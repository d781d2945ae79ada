//! Trellis: component composition and construction.
//!
//! Parts come from a [`FamilyFactory`] so a tree never mixes visual
//! families, are arranged in a [`ComponentTree`] of leaves and composites,
//! and are driven by a [`CompositionEngine`] that dispatches one operation
//! over every part in pre-order. Configuration for parts is collected by a
//! [`StagedBuilder`] which seals into an immutable [`BuiltConfig`].

pub mod builder;
pub mod collab;
pub mod engine;
pub mod error;
pub mod family;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod parts;

pub use builder::{BuildState, BuiltConfig, FieldMap, StagedBuilder, create_builder};
pub use collab::{
    AdaptedPart, ForeignWidget, LegacyControl, RasterRenderer, RasterSettings, Renderer,
    ResourceError, Shape, ShapePart, SharedResources, VectorRenderer,
};
pub use engine::{
    Blueprint, CompositionEngine, DEFAULT_LOG_TARGET, DEFAULT_MAX_DEPTH, DispatchReport, Effect,
    EngineConfig, GroupSpec, PartSpec,
};
pub use error::{ComposeError, Result};
pub use family::{
    Family, FamilyDescriptor, FamilyFactory, FamilyRegistry, FamilyRegistryBuilder,
    PartConstructor, PartContext,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{EngineMetrics, MetricSnapshot};
pub use node::{ComponentNode, ComponentTree, NodeId};
pub use parts::{Capability, CloneDepth, Palette, Part, PartHandle, PartIdentity, Role, ThemedPart};
