use std::fmt;

use crate::error::{ComposeError, Result};
use crate::parts::PartHandle;

/// Stable handle to a node inside one [`ComponentTree`].
///
/// The generation changes every time a slot is reused, so a handle to a
/// removed node never resolves to a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}.{}", self.index, self.generation)
    }
}

/// Leaf or composite node.
#[derive(Debug)]
pub enum ComponentNode {
    Leaf(PartHandle),
    Composite { label: String, children: Vec<NodeId> },
}

impl ComponentNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, ComponentNode::Leaf(_))
    }

    pub fn part(&self) -> Option<&PartHandle> {
        match self {
            ComponentNode::Leaf(part) => Some(part),
            ComponentNode::Composite { .. } => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ComponentNode::Leaf(part) => part.label(),
            ComponentNode::Composite { label, .. } => label,
        }
    }

    /// Children in insertion order; a leaf has none to give.
    pub fn children(&self) -> Result<&[NodeId]> {
        match self {
            ComponentNode::Composite { children, .. } => Ok(children),
            ComponentNode::Leaf(part) => Err(ComposeError::InvalidOperation(format!(
                "{} leaf `{}` has no children",
                part.role(),
                part.label()
            ))),
        }
    }
}

#[derive(Debug)]
struct Entry {
    node: ComponentNode,
    parent: Option<NodeId>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena owning every node of a component tree.
///
/// Each node has at most one parent. Attaching a node under one of its own
/// descendants is rejected, so the parent links always form a forest, and a
/// designated root gives the tree handed to callers.
#[derive(Debug, Default)]
pub struct ComponentTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<NodeId>,
    live: usize,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Create a detached leaf.
    pub fn insert_leaf(&mut self, part: PartHandle) -> NodeId {
        self.allocate(ComponentNode::Leaf(part))
    }

    /// Create a detached, empty composite.
    pub fn insert_composite(&mut self, label: impl Into<String>) -> NodeId {
        self.allocate(ComponentNode::Composite {
            label: label.into(),
            children: Vec::new(),
        })
    }

    fn allocate(&mut self, node: ComponentNode) -> NodeId {
        let entry = Entry { node, parent: None };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn entry(&self, id: NodeId) -> Result<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(ComposeError::NodeNotFound(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut Entry> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(ComposeError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    pub fn get(&self, id: NodeId) -> Result<&ComponentNode> {
        self.entry(id).map(|entry| &entry.node)
    }

    pub fn is_leaf(&self, id: NodeId) -> Result<bool> {
        self.get(id).map(ComponentNode::is_leaf)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        self.get(id)?.children()
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.entry(id).map(|entry| entry.parent)
    }

    /// Parent chain from the immediate parent upwards.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut cursor = self.parent(id)?;
        while let Some(current) = cursor {
            if chain.len() > self.live {
                return Err(ComposeError::CycleDetected {
                    parent: current,
                    child: id,
                });
            }
            chain.push(current);
            cursor = self.parent(current)?;
        }
        Ok(chain)
    }

    pub fn depth(&self, id: NodeId) -> Result<usize> {
        self.ancestors(id).map(|chain| chain.len())
    }

    /// Mark a detached node as the root handed to callers.
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.parent(id)? {
            return Err(ComposeError::InvalidOperation(format!(
                "{id} is attached under {parent} and cannot be the root"
            )));
        }
        self.root = Some(id);
        Ok(())
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Fails without touching the tree when `parent` is a leaf, when `child`
    /// is `parent` or one of its ancestors, or when `child` is already owned
    /// by another composite or is the root.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_entry = self.entry(parent)?;
        let child_entry = self.entry(child)?;

        if let ComponentNode::Leaf(part) = &parent_entry.node {
            return Err(ComposeError::InvalidOperation(format!(
                "cannot add a child to {} leaf `{}`",
                part.role(),
                part.label()
            )));
        }
        if child == parent || self.ancestors(parent)?.contains(&child) {
            return Err(ComposeError::CycleDetected { parent, child });
        }
        if let Some(owner) = child_entry.parent {
            return Err(ComposeError::InvalidOperation(format!(
                "{child} is already a child of {owner}"
            )));
        }
        if self.root == Some(child) {
            return Err(ComposeError::InvalidOperation(format!(
                "{child} is the root and cannot be attached"
            )));
        }

        if let ComponentNode::Composite { children, .. } = &mut self.entry_mut(parent)?.node {
            children.push(child);
        }
        self.entry_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent` and destroy its whole subtree.
    ///
    /// Returns the number of nodes destroyed. Handles into the subtree go
    /// stale and resolve to [`ComposeError::NodeNotFound`].
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize> {
        let position = self
            .children(parent)?
            .iter()
            .position(|id| *id == child)
            .ok_or_else(|| {
                ComposeError::InvalidOperation(format!("{child} is not a child of {parent}"))
            })?;
        let doomed = self.preorder(child)?;

        if let ComponentNode::Composite { children, .. } = &mut self.entry_mut(parent)?.node {
            children.remove(position);
        }
        for id in &doomed {
            let slot = &mut self.slots[id.index as usize];
            slot.entry = None;
            // A slot whose generation is exhausted is retired, never reused.
            if let Some(next) = slot.generation.checked_add(1) {
                slot.generation = next;
                self.free.push(id.index);
            }
        }
        self.live -= doomed.len();
        Ok(doomed.len())
    }

    /// Apply `operation` to `id` and then, depth-first, to every descendant in
    /// insertion order. The first error stops the walk.
    pub fn visit<F>(&self, id: NodeId, mut operation: F) -> Result<()>
    where
        F: FnMut(NodeId, &ComponentNode) -> Result<()>,
    {
        self.visit_node(id, &mut operation)
    }

    fn visit_node<F>(&self, id: NodeId, operation: &mut F) -> Result<()>
    where
        F: FnMut(NodeId, &ComponentNode) -> Result<()>,
    {
        let node = self.get(id)?;
        operation(id, node)?;

        if let ComponentNode::Composite { children, .. } = node {
            for child in children {
                self.visit_node(*child, operation)?;
            }
        }
        Ok(())
    }

    /// Pre-order listing of the subtree rooted at `id`.
    pub fn preorder(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        self.visit(id, |visited, _| {
            order.push(visited);
            Ok(())
        })?;
        Ok(order)
    }

    /// Check structural invariants over every live node.
    ///
    /// Parent and child links must agree, every child must be live, no
    /// composite may list a child twice, the root must be detached and no
    /// parent chain may loop.
    pub fn check_invariants(&self) -> Result<()> {
        if let Some(root) = self.root {
            if self.parent(root)?.is_some() {
                return Err(ComposeError::InvalidOperation(format!(
                    "root {root} has a parent"
                )));
            }
        }

        for (index, slot) in self.slots.iter().enumerate() {
            let Some(entry) = slot.entry.as_ref() else {
                continue;
            };
            let id = NodeId {
                index: index as u32,
                generation: slot.generation,
            };

            if let Some(parent) = entry.parent {
                let listed = self.children(parent)?.iter().filter(|c| **c == id).count();
                if listed != 1 {
                    return Err(ComposeError::InvalidOperation(format!(
                        "{id} names {parent} as parent but is listed {listed} times"
                    )));
                }
            }

            if let ComponentNode::Composite { children, .. } = &entry.node {
                for child in children {
                    if self.parent(*child)? != Some(id) {
                        return Err(ComposeError::InvalidOperation(format!(
                            "{child} is listed under {id} but points elsewhere"
                        )));
                    }
                }
            }

            self.ancestors(id)?;
        }
        Ok(())
    }

    /// Indented text rendering of the rooted tree.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            let _ = self.visit(root, |id, node| {
                let depth = self.depth(id)?;
                out.push_str(&"  ".repeat(depth));
                match node {
                    ComponentNode::Leaf(part) => out.push_str(&format!(
                        "- {} [{} {}]\n",
                        part.label(),
                        part.family(),
                        part.role()
                    )),
                    ComponentNode::Composite { label, children } => {
                        out.push_str(&format!("+ {label} ({})\n", children.len()))
                    }
                }
                Ok(())
            });
        }
        out
    }
}
