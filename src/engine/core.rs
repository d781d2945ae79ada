use serde_json::Value;

use super::blueprint::Blueprint;
use super::config::EngineConfig;
use crate::builder::StagedBuilder;
use crate::error::{ComposeError, Result};
use crate::family::{FamilyDescriptor, FamilyFactory, FamilyRegistry};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::metrics::{EngineMetrics, MetricSnapshot};
use crate::node::{ComponentNode, ComponentTree, NodeId};
use crate::parts::{Capability, Role};

/// One observable effect produced by a leaf during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub node: NodeId,
    pub role: Role,
    pub family: FamilyDescriptor,
    pub label: String,
    pub output: String,
}

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub operation: Capability,
    pub effects: Vec<Effect>,
    /// Nodes the traversal reached, composites included.
    pub visited: usize,
    /// Leaves whose part lacks the capability.
    pub skipped: usize,
}

impl DispatchReport {
    fn new(operation: Capability) -> Self {
        Self {
            operation,
            effects: Vec::new(),
            visited: 0,
            skipped: 0,
        }
    }

    pub fn roles(&self) -> Vec<Role> {
        self.effects.iter().map(|effect| effect.role).collect()
    }

    pub fn outputs(&self) -> Vec<&str> {
        self.effects
            .iter()
            .map(|effect| effect.output.as_str())
            .collect()
    }
}

/// Assembles component trees from blueprints and dispatches operations over them.
pub struct CompositionEngine<'r> {
    registry: &'r FamilyRegistry,
    config: EngineConfig,
}

impl CompositionEngine<'static> {
    /// Engine over the process-wide registry.
    pub fn global() -> Self {
        Self::new(FamilyRegistry::global())
    }
}

impl<'r> CompositionEngine<'r> {
    pub fn new(registry: &'r FamilyRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: &'r FamilyRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &'r FamilyRegistry {
        self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn factory(&self, family: &FamilyDescriptor) -> Result<FamilyFactory<'r>> {
        self.registry.factory(family)
    }

    /// Build a tree for `blueprint` with parts from `family`.
    ///
    /// The tree is only returned once it passes
    /// [`ComponentTree::check_invariants`]; on any error the partially built
    /// arena is dropped.
    pub fn assemble(&self, family: &FamilyDescriptor, blueprint: &Blueprint) -> Result<ComponentTree> {
        if self.config.logger.is_some() {
            self.emit(
                LogLevel::Debug,
                "assemble.start",
                [
                    json_kv("family", family.as_str()),
                    json_kv("nodes", blueprint.node_count()),
                ],
            );
        }

        match self.try_assemble(family, blueprint) {
            Ok(tree) => {
                let parts = blueprint.part_count();
                self.with_metrics(|metrics| metrics.record_assembly(parts));
                self.emit(
                    LogLevel::Info,
                    "assemble.done",
                    [
                        json_kv("family", family.as_str()),
                        json_kv("nodes", tree.len()),
                        json_kv("parts", parts),
                    ],
                );
                Ok(tree)
            }
            Err(err) => {
                self.with_metrics(EngineMetrics::record_assembly_failure);
                self.emit(
                    LogLevel::Warn,
                    "assemble.failed",
                    [
                        json_kv("family", family.as_str()),
                        json_kv("error", err.to_string()),
                    ],
                );
                Err(err)
            }
        }
    }

    fn try_assemble(&self, family: &FamilyDescriptor, blueprint: &Blueprint) -> Result<ComponentTree> {
        if blueprint.exceeds_depth(self.config.max_depth) {
            return Err(ComposeError::InvalidBlueprint(format!(
                "nesting exceeds the limit of {} levels",
                self.config.max_depth
            )));
        }

        let factory = self.registry.factory(family)?;
        let mut tree = ComponentTree::new();
        let root = self.assemble_node(&factory, &mut tree, blueprint)?;
        tree.set_root(root)?;
        tree.check_invariants()?;
        Ok(tree)
    }

    fn assemble_node(
        &self,
        factory: &FamilyFactory<'_>,
        tree: &mut ComponentTree,
        blueprint: &Blueprint,
    ) -> Result<NodeId> {
        match blueprint {
            Blueprint::Part(leaf) => {
                let mut builder = StagedBuilder::new(
                    std::iter::once("role".to_string())
                        .chain(self.config.required_for(leaf.role).iter().cloned()),
                );
                builder
                    .set_fields(&leaf.props)?
                    .set_field("role", leaf.role.as_str())?;
                let config = builder.finalize()?;
                let part = factory.create_configured(leaf.role, &config)?;
                Ok(tree.insert_leaf(part))
            }
            Blueprint::Group(group) => {
                let id = tree.insert_composite(group.label.clone());
                for child in &group.children {
                    let child_id = self.assemble_node(factory, tree, child)?;
                    tree.add_child(id, child_id)?;
                }
                Ok(id)
            }
        }
    }

    /// Run `operation` over the whole tree starting at its root.
    pub fn dispatch(&self, tree: &ComponentTree, operation: &str) -> Result<DispatchReport> {
        let root = tree
            .root()
            .ok_or_else(|| ComposeError::InvalidOperation("tree has no root".to_string()))?;
        self.dispatch_from(tree, root, operation)
    }

    /// Run `operation` over the subtree rooted at `start`.
    ///
    /// The name must resolve to a [`Capability`] that at least one part in the
    /// subtree exposes; otherwise nothing runs and
    /// [`ComposeError::UnsupportedOperation`] is returned. Effects are only
    /// handed back when every part succeeded.
    pub fn dispatch_from(
        &self,
        tree: &ComponentTree,
        start: NodeId,
        operation: &str,
    ) -> Result<DispatchReport> {
        match self.try_dispatch(tree, start, operation) {
            Ok(report) => {
                let effects = report.effects.len();
                self.with_metrics(|metrics| metrics.record_dispatch(effects));
                self.emit(
                    LogLevel::Debug,
                    "dispatch.done",
                    [
                        json_kv("operation", operation),
                        json_kv("effects", effects),
                        json_kv("visited", report.visited),
                        json_kv("skipped", report.skipped),
                    ],
                );
                Ok(report)
            }
            Err(err) => {
                self.with_metrics(EngineMetrics::record_dispatch_failure);
                self.emit(
                    LogLevel::Warn,
                    "dispatch.failed",
                    [
                        json_kv("operation", operation),
                        json_kv("error", err.to_string()),
                    ],
                );
                Err(err)
            }
        }
    }

    fn try_dispatch(
        &self,
        tree: &ComponentTree,
        start: NodeId,
        operation: &str,
    ) -> Result<DispatchReport> {
        let capability = Capability::from_name(operation)
            .ok_or_else(|| ComposeError::UnsupportedOperation(operation.to_string()))?;

        let mut supported = false;
        tree.visit(start, |_, node| {
            if let Some(part) = node.part() {
                supported |= part.supports(capability);
            }
            Ok(())
        })?;
        if !supported {
            return Err(ComposeError::UnsupportedOperation(operation.to_string()));
        }

        let mut report = DispatchReport::new(capability);
        tree.visit(start, |id, node| {
            report.visited += 1;
            if let ComponentNode::Leaf(part) = node {
                if !part.supports(capability) {
                    report.skipped += 1;
                    return Ok(());
                }
                let output = part.perform(capability)?;
                report.effects.push(Effect {
                    node: id,
                    role: part.role(),
                    family: part.family().clone(),
                    label: part.label().to_string(),
                    output,
                });
            }
            Ok(())
        })?;
        Ok(report)
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let handle = self.config.metrics.as_ref()?;
        handle.lock().ok().map(|metrics| metrics.snapshot())
    }

    /// Log the current metrics snapshot, if metrics and a logger are configured.
    pub fn emit_metrics(&self) {
        let (Some(logger), Some(snapshot)) = (self.config.logger.as_ref(), self.metrics_snapshot())
        else {
            return;
        };
        let target = format!("{}.metrics", self.config.log_target);
        let _ = logger.log_event(snapshot.to_log_event(&target));
    }

    fn with_metrics(&self, record: impl FnOnce(&mut EngineMetrics)) {
        if let Some(handle) = &self.config.metrics {
            if let Ok(mut metrics) = handle.lock() {
                record(&mut metrics);
            }
        }
    }

    fn emit(&self, level: LogLevel, message: &str, fields: impl IntoIterator<Item = (String, Value)>) {
        if let Some(logger) = &self.config.logger {
            let event = event_with_fields(level, &self.config.log_target, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Logger, MemorySink};
    use serde_json::json;

    fn engine_with_sink(registry: &FamilyRegistry) -> (CompositionEngine<'_>, MemorySink) {
        let sink = MemorySink::new();
        let mut config = EngineConfig::default().with_logger(Logger::new(sink.clone()));
        config.enable_metrics();
        (CompositionEngine::with_config(registry, config), sink)
    }

    fn form() -> Blueprint {
        Blueprint::group(
            "form",
            vec![
                Blueprint::labeled(Role::Button, "OK"),
                Blueprint::labeled(Role::Text, "Name"),
            ],
        )
    }

    #[test]
    fn dark_apply_runs_in_insertion_order() {
        let registry = FamilyRegistry::with_presets();
        let engine = CompositionEngine::new(&registry);
        let tree = engine.assemble(&"dark".into(), &form()).unwrap();

        let report = engine.dispatch(&tree, "apply").unwrap();
        assert_eq!(report.roles(), vec![Role::Button, Role::Text]);
        assert!(report.effects.iter().all(|e| e.family.as_str() == "dark"));
        assert_eq!(
            report.outputs(),
            vec![
                "[dark] button `OK` applied fg=#e0e0e0 bg=#121212",
                "[dark] text `Name` applied fg=#e0e0e0 bg=#121212",
            ]
        );
        assert_eq!(report.visited, 3);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn unknown_operation_has_no_effects() {
        let registry = FamilyRegistry::with_presets();
        let (engine, sink) = engine_with_sink(&registry);
        let tree = engine.assemble(&"dark".into(), &form()).unwrap();

        let err = engine.dispatch(&tree, "explode").unwrap_err();
        assert!(matches!(err, ComposeError::UnsupportedOperation(ref op) if op == "explode"));
        let err = engine.dispatch(&tree, "draw").unwrap_err();
        assert!(matches!(err, ComposeError::UnsupportedOperation(_)));

        let snapshot = engine.metrics_snapshot().unwrap();
        assert_eq!(snapshot.dispatches, 0);
        assert_eq!(snapshot.effects, 0);
        assert_eq!(snapshot.dispatch_failures, 2);
        assert!(sink.messages().iter().all(|m| m != "dispatch.done"));
    }

    #[test]
    fn parts_without_capability_are_skipped() {
        let registry = FamilyRegistry::with_presets();
        let engine = CompositionEngine::new(&registry);
        let blueprint = Blueprint::group(
            "canvas",
            vec![
                Blueprint::part(Role::Button),
                Blueprint::part(Role::Drawable)
                    .with_prop("shape", json!({"kind": "circle", "radius": 3})),
            ],
        );
        let tree = engine.assemble(&"dark".into(), &blueprint).unwrap();
        let report = engine.dispatch(&tree, "draw").unwrap();
        assert_eq!(report.roles(), vec![Role::Drawable]);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            report.outputs(),
            vec!["[dark] drawable `drawable` vector circle r=3 stroke=#bb86fc fill=#121212"]
        );
    }

    #[test]
    fn unknown_role_for_family_fails_assembly() {
        let registry = FamilyRegistry::with_presets();
        let (engine, sink) = engine_with_sink(&registry);
        let blueprint = Blueprint::group(
            "mixed",
            vec![Blueprint::part(Role::Button), Blueprint::part(Role::Drawable)],
        );
        let err = engine.assemble(&"legacy".into(), &blueprint).unwrap_err();
        assert!(matches!(err, ComposeError::UnknownRole { .. }));
        assert_eq!(sink.messages(), ["assemble.start", "assemble.failed"]);
        assert_eq!(engine.metrics_snapshot().unwrap().assembly_failures, 1);
    }

    #[test]
    fn required_props_flow_through_builder() {
        let registry = FamilyRegistry::with_presets();
        let config = EngineConfig::default().require(Role::Button, "label");
        let engine = CompositionEngine::with_config(&registry, config);

        let err = engine
            .assemble(&"light".into(), &Blueprint::part(Role::Button))
            .unwrap_err();
        assert_eq!(err.missing_fields(), ["label"]);

        let tree = engine
            .assemble(&"light".into(), &Blueprint::labeled(Role::Button, "Go"))
            .unwrap();
        let root = tree.root().unwrap();
        assert!(tree.is_leaf(root).unwrap());
        assert_eq!(tree.get(root).unwrap().label(), "Go");
    }

    #[test]
    fn depth_limit_is_enforced() {
        let registry = FamilyRegistry::with_presets();
        let mut engine = CompositionEngine::new(&registry);
        engine.config_mut().max_depth = 2;
        let nested = Blueprint::group(
            "a",
            vec![Blueprint::group("b", vec![Blueprint::part(Role::Text)])],
        );
        assert!(matches!(
            engine.assemble(&"dark".into(), &nested),
            Err(ComposeError::InvalidBlueprint(_))
        ));
    }

    #[test]
    fn deep_blueprint_is_rejected_before_building() {
        let registry = FamilyRegistry::with_presets();
        let (engine, sink) = engine_with_sink(&registry);
        let mut nested = Blueprint::part(Role::Button);
        for level in 0..1_000 {
            nested = Blueprint::group(format!("level-{level}"), vec![nested]);
        }

        let err = engine.assemble(&"dark".into(), &nested).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidBlueprint(_)));
        assert_eq!(sink.events()[0].field("nodes"), Some(&json!(1_001)));
        assert_eq!(engine.metrics_snapshot().unwrap().parts_created, 0);
        assert!(registry.resources().is_empty());
    }

    #[test]
    fn adapter_failure_discards_partial_effects() {
        let registry = FamilyRegistry::with_presets();
        let engine = CompositionEngine::new(&registry);
        let blueprint = Blueprint::group(
            "legacy",
            vec![
                Blueprint::labeled(Role::Button, "Save"),
                Blueprint::labeled(Role::Text, " "),
            ],
        );
        let tree = engine.assemble(&"legacy".into(), &blueprint).unwrap();
        let err = engine.dispatch(&tree, "apply").unwrap_err();
        assert!(matches!(err, ComposeError::Part(_)));
    }

    #[test]
    fn dispatch_from_subtree_and_metrics_event() {
        let registry = FamilyRegistry::with_presets();
        let (engine, sink) = engine_with_sink(&registry);
        let blueprint = Blueprint::group(
            "window",
            vec![
                Blueprint::labeled(Role::Text, "title"),
                Blueprint::group("body", vec![Blueprint::labeled(Role::Button, "OK")]),
            ],
        );
        let tree = engine.assemble(&"light".into(), &blueprint).unwrap();
        let body = tree.children(tree.root().unwrap()).unwrap()[1];
        let report = engine.dispatch_from(&tree, body, "render").unwrap();
        assert_eq!(report.outputs(), vec!["[light] button <OK> accent=#0066cc"]);

        engine.emit_metrics();
        let events = sink.events();
        let last = events.last().unwrap();
        assert_eq!(last.target, "trellis::engine.metrics");
        assert_eq!(last.field("trees_assembled"), Some(&json!(1)));
        assert_eq!(last.field("effects"), Some(&json!(1)));
    }

    #[test]
    fn empty_tree_cannot_dispatch() {
        let registry = FamilyRegistry::with_presets();
        let engine = CompositionEngine::new(&registry);
        let tree = ComponentTree::new();
        assert!(matches!(
            engine.dispatch(&tree, "apply"),
            Err(ComposeError::InvalidOperation(_))
        ));
    }
}
