use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::parts::Role;

/// Caller supplied tree shape: which roles to create and how to nest them.
///
/// In JSON a node with a `role` is a part and a node with `children` is a
/// group; naming both on one node does not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Blueprint {
    Part(PartSpec),
    Group(GroupSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartSpec {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    #[serde(default = "default_group_label")]
    pub label: String,
    pub children: Vec<Blueprint>,
}

fn default_group_label() -> String {
    "group".to_string()
}

impl Blueprint {
    pub fn part(role: Role) -> Self {
        Blueprint::Part(PartSpec {
            role,
            props: Map::new(),
        })
    }

    pub fn labeled(role: Role, label: impl Into<String>) -> Self {
        let label: String = label.into();
        Blueprint::part(role).with_prop("label", label)
    }

    pub fn group(label: impl Into<String>, children: Vec<Blueprint>) -> Self {
        Blueprint::Group(GroupSpec {
            label: label.into(),
            children,
        })
    }

    /// Attach a configuration value to a part node. Groups carry no props and
    /// are returned unchanged.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Blueprint::Part(leaf) = &mut self {
            leaf.props.insert(key.into(), value.into());
        }
        self
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Levels in the blueprint; a lone part has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        self.walk(|_, level| {
            deepest = deepest.max(level);
            true
        });
        deepest
    }

    /// True when some node sits deeper than `limit`. The walk stops at the
    /// first such node.
    pub fn exceeds_depth(&self, limit: usize) -> bool {
        let mut exceeded = false;
        self.walk(|_, level| {
            exceeded = level > limit;
            !exceeded
        });
        exceeded
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| {
            count += 1;
            true
        });
        count
    }

    pub fn part_count(&self) -> usize {
        let mut count = 0;
        self.walk(|node, _| {
            if let Blueprint::Part(_) = node {
                count += 1;
            }
            true
        });
        count
    }

    /// Pre-order walk on an explicit stack; `visit` gets each node with its
    /// 1-based level and returns `false` to stop.
    fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&Blueprint, usize) -> bool,
    {
        let mut pending = vec![(self, 1)];
        while let Some((node, level)) = pending.pop() {
            if !visit(node, level) {
                return;
            }
            if let Blueprint::Group(group) = node {
                pending.extend(group.children.iter().rev().map(|child| (child, level + 1)));
            }
        }
    }
}
