//! Hierarchy navigation.
//!
//! A Hierarchy is one design's nodes stored once in a petgraph arena, with
//! containment edges from parent to child and a [`PathIndex`] for lookups.
//! Navigation never builds a nested node tree; every query returns
//! references into the arena.

use crate::index::PathIndex;
use crate::rollup::Rollup;
use crate::search_index::SearchIndex;
use bomtree_core::{AssemblyNode, BomError, BuildWarning, DesignId, QuantityMode, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a node's children are all present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChildStatus {
    /// Declares no children and has none.
    Leaf,
    /// Every declared child is present (or more than declared).
    Complete { count: usize },
    /// Declares more children than the fetched set contains.
    Partial { declared: u32, present: usize },
}

impl ChildStatus {
    /// Returns true if some declared children were not supplied.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }

    /// Number of children actually present.
    pub fn present(&self) -> usize {
        match self {
            Self::Leaf => 0,
            Self::Complete { count } => *count,
            Self::Partial { present, .. } => *present,
        }
    }

    /// Returns true if the node has children to show.
    pub fn has_children(&self) -> bool {
        self.present() > 0
    }
}

/// The navigable assembly tree of one design.
#[derive(Debug)]
pub struct Hierarchy {
    pub(crate) design_id: DesignId,

    /// Node arena; edges point from parent to child.
    pub(crate) graph: DiGraph<AssemblyNode, ()>,

    pub(crate) index: PathIndex,

    /// Substring index over names, part numbers and designators.
    pub(crate) search: SearchIndex,

    /// Per-node subtree aggregates.
    pub(crate) rollups: HashMap<NodeIndex, Rollup>,

    /// Position of each indexed node in a full preorder walk.
    pub(crate) preorder: HashMap<NodeIndex, usize>,

    pub(crate) warnings: Vec<BuildWarning>,

    pub(crate) quantity_mode: QuantityMode,
}

impl Hierarchy {
    /// The design this hierarchy belongs to.
    pub fn design_id(&self) -> &str {
        &self.design_id
    }

    /// Quantity semantics used for rollups.
    pub fn quantity_mode(&self) -> QuantityMode {
        self.quantity_mode
    }

    /// Warnings raised while building this hierarchy.
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// Number of navigable nodes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no node could be indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Looks up a navigable node by id.
    pub fn get(&self, id: &str) -> Option<&AssemblyNode> {
        self.index.get_by_id(id).map(|slot| &self.graph[slot])
    }

    /// Looks up a navigable node by materialized path.
    pub fn get_by_path(&self, path: &str) -> Option<&AssemblyNode> {
        self.index.get_by_path(path).map(|slot| &self.graph[slot])
    }

    /// Returns true if the id is navigable in this hierarchy.
    pub fn contains(&self, id: &str) -> bool {
        self.index.get_by_id(id).is_some()
    }

    /// Depth-0 nodes in sibling order.
    pub fn roots(&self) -> Vec<&AssemblyNode> {
        self.resolve(self.index.roots())
    }

    /// Heads of detached subtrees whose parent is missing.
    pub fn orphans(&self) -> Vec<&AssemblyNode> {
        self.resolve(self.index.orphans())
    }

    /// Roots followed by orphans, or just roots.
    pub fn display_roots(&self, include_orphans: bool) -> Vec<&AssemblyNode> {
        let mut result = self.roots();
        if include_orphans {
            result.extend(self.orphans());
        }
        result
    }

    /// Returns true if the node heads a detached subtree.
    pub fn is_orphan(&self, id: &str) -> Result<bool> {
        let slot = self.slot(id)?;
        Ok(self.index.is_orphan(slot))
    }

    /// Direct children of a node, in sibling order.
    ///
    /// Cost is proportional to the number of children.
    pub fn children(&self, id: &str) -> Result<Vec<&AssemblyNode>> {
        let slot = self.slot(id)?;
        Ok(self.resolve(self.index.children(slot)))
    }

    /// The node's parent, or `None` for roots and orphans.
    pub fn parent(&self, id: &str) -> Result<Option<&AssemblyNode>> {
        let slot = self.slot(id)?;
        Ok(self
            .graph
            .neighbors_directed(slot, Direction::Incoming)
            .next()
            .map(|parent| &self.graph[parent]))
    }

    /// Ancestors from the parent up to the root.
    ///
    /// Walks path prefixes through the index. For nodes inside a detached
    /// subtree the chain stops at the orphan that heads it.
    pub fn ancestors(&self, id: &str) -> Result<Vec<&AssemblyNode>> {
        let slot = self.slot(id)?;
        Ok(self
            .ancestor_slots(slot)
            .into_iter()
            .map(|s| &self.graph[s])
            .collect())
    }

    /// Whether the node's declared children were all supplied.
    pub fn child_status(&self, id: &str) -> Result<ChildStatus> {
        let slot = self.slot(id)?;
        Ok(self.child_status_at(slot))
    }

    /// Every node below `id` in preorder, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Result<Vec<&AssemblyNode>> {
        let slot = self.slot(id)?;
        let mut result = Vec::new();
        let mut stack: Vec<NodeIndex> = self
            .index
            .children(slot)
            .iter()
            .rev()
            .copied()
            .collect();

        while let Some(current) = stack.pop() {
            result.push(&self.graph[current]);
            stack.extend(self.index.children(current).iter().rev().copied());
        }

        Ok(result)
    }

    /// Every navigable node in preorder: roots first, then orphan subtrees.
    pub fn nodes(&self) -> Vec<&AssemblyNode> {
        let mut slots: Vec<(usize, NodeIndex)> = self
            .preorder
            .iter()
            .map(|(&slot, &rank)| (rank, slot))
            .collect();
        slots.sort_unstable();
        slots
            .into_iter()
            .map(|(_, slot)| &self.graph[slot])
            .collect()
    }

    pub(crate) fn slot(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get_by_id(id)
            .ok_or_else(|| BomError::NodeNotFound(id.to_string()))
    }

    pub(crate) fn ancestor_slots(&self, slot: NodeIndex) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        for prefix in self.graph[slot].path.ancestors() {
            match self.index.get_by_path(prefix) {
                Some(ancestor) => result.push(ancestor),
                None => break,
            }
        }
        result
    }

    pub(crate) fn child_status_at(&self, slot: NodeIndex) -> ChildStatus {
        let declared = self.graph[slot].numchild;
        let present = self.index.child_count(slot);

        if (declared as usize) > present {
            ChildStatus::Partial { declared, present }
        } else if present == 0 {
            ChildStatus::Leaf
        } else {
            ChildStatus::Complete { count: present }
        }
    }

    pub(crate) fn display_root_slots(&self, include_orphans: bool) -> Vec<NodeIndex> {
        let mut slots = self.index.roots().to_vec();
        if include_orphans {
            slots.extend_from_slice(self.index.orphans());
        }
        slots
    }

    fn resolve(&self, slots: &[NodeIndex]) -> Vec<&AssemblyNode> {
        slots.iter().map(|&slot| &self.graph[slot]).collect()
    }
}
