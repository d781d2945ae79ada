use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::logging::Logger;
use crate::metrics::EngineMetrics;
use crate::parts::Role;

pub const DEFAULT_MAX_DEPTH: usize = 32;
pub const DEFAULT_LOG_TARGET: &str = "trellis::engine";

/// Configuration knobs for a [`crate::CompositionEngine`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Optional structured logger used by the engine.
    pub logger: Option<Logger>,
    /// Metrics accumulator; `None` disables counting.
    pub metrics: Option<Arc<Mutex<EngineMetrics>>>,
    /// Deepest blueprint `assemble` accepts.
    pub max_depth: usize,
    /// Target field attached to every log event.
    pub log_target: String,
    /// Props each part of a role must carry in its blueprint.
    pub required_props: BTreeMap<Role, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            max_depth: DEFAULT_MAX_DEPTH,
            log_target: DEFAULT_LOG_TARGET.to_string(),
            required_props: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Require `prop` on every blueprint part of `role`.
    pub fn require(mut self, role: Role, prop: impl Into<String>) -> Self {
        let prop = prop.into();
        let props = self.required_props.entry(role).or_default();
        if !props.contains(&prop) {
            props.push(prop);
        }
        self
    }

    pub fn required_for(&self, role: Role) -> &[String] {
        self.required_props
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(EngineMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<EngineMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_requirements() {
        let config = EngineConfig::default()
            .require(Role::Button, "label")
            .require(Role::Button, "label")
            .require(Role::Drawable, "shape");
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.log_target, "trellis::engine");
        assert_eq!(config.required_for(Role::Button), ["label"]);
        assert_eq!(config.required_for(Role::Drawable), ["shape"]);
        assert!(config.required_for(Role::Text).is_empty());
    }

    #[test]
    fn metrics_toggle() {
        let mut config = EngineConfig::default();
        assert!(config.metrics_handle().is_none());
        config.enable_metrics();
        let handle = config.metrics_handle().unwrap();
        config.enable_metrics();
        assert!(Arc::ptr_eq(&handle, &config.metrics_handle().unwrap()));
        config.disable_metrics();
        assert!(config.metrics_handle().is_none());
    }
}
