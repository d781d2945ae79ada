use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters accumulated by a [`crate::CompositionEngine`].
#[derive(Debug, Default, Clone)]
pub struct EngineMetrics {
    trees_assembled: u64,
    assembly_failures: u64,
    parts_created: u64,
    dispatches: u64,
    dispatch_failures: u64,
    effects: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_assembly(&mut self, parts: usize) {
        self.trees_assembled = self.trees_assembled.saturating_add(1);
        self.parts_created = self.parts_created.saturating_add(parts as u64);
    }

    pub fn record_assembly_failure(&mut self) {
        self.assembly_failures = self.assembly_failures.saturating_add(1);
    }

    pub fn record_dispatch(&mut self, effects: usize) {
        self.dispatches = self.dispatches.saturating_add(1);
        self.effects = self.effects.saturating_add(effects as u64);
    }

    pub fn record_dispatch_failure(&mut self) {
        self.dispatch_failures = self.dispatch_failures.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            trees_assembled: self.trees_assembled,
            assembly_failures: self.assembly_failures,
            parts_created: self.parts_created,
            dispatches: self.dispatches,
            dispatch_failures: self.dispatch_failures,
            effects: self.effects,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub trees_assembled: u64,
    pub assembly_failures: u64,
    pub parts_created: u64,
    pub dispatches: u64,
    pub dispatch_failures: u64,
    pub effects: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("trees_assembled".to_string(), json!(self.trees_assembled));
        map.insert("assembly_failures".to_string(), json!(self.assembly_failures));
        map.insert("parts_created".to_string(), json!(self.parts_created));
        map.insert("dispatches".to_string(), json!(self.dispatches));
        map.insert("dispatch_failures".to_string(), json!(self.dispatch_failures));
        map.insert("effects".to_string(), json!(self.effects));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "engine_metrics", self.as_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let mut metrics = EngineMetrics::new();
        metrics.record_assembly(3);
        metrics.record_assembly(2);
        metrics.record_assembly_failure();
        metrics.record_dispatch(2);
        metrics.record_dispatch_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.trees_assembled, 2);
        assert_eq!(snapshot.parts_created, 5);
        assert_eq!(snapshot.assembly_failures, 1);
        assert_eq!(snapshot.effects, 2);
        assert_eq!(snapshot.dispatch_failures, 1);

        let event = snapshot.to_log_event("trellis::engine.metrics");
        assert_eq!(event.message, "engine_metrics");
        assert_eq!(event.field("parts_created"), Some(&json!(5)));
    }
}
