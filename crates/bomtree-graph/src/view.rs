//! Views for presentation layers.
//!
//! The engine holds no expand/collapse state. Callers pass in the set of
//! expanded ids and get back exactly the rows to draw, or ask for a
//! depth-bounded nested tree that carries each node's rollup so that a
//! collapsed row can still show its totals.

use crate::hierarchy::{ChildStatus, Hierarchy};
use crate::rollup::Rollup;
use bomtree_core::{AssemblyNode, NodeId, NodeType, Result};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of a collapsible tree table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleRow {
    pub id: NodeId,
    /// Indentation level below the display root.
    pub level: usize,
    pub child_status: ChildStatus,
    /// True if the row's children are emitted below it.
    pub expanded: bool,
    /// True for rows heading a detached subtree.
    pub orphan: bool,
}

/// A depth-bounded nested view of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeView {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub part_number: Option<String>,
    pub reference_designator: Option<String>,
    pub quantity: u32,
    pub rollup: Rollup,
    pub child_status: ChildStatus,
    /// True if children exist below the materialization cut.
    pub truncated: bool,
    pub orphan: bool,
    pub children: Vec<TreeView>,
}

impl TreeView {
    /// Number of nodes in this view, including itself.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeView::len).sum::<usize>()
    }

    /// Always false; a view contains at least its own node.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Hierarchy {
    /// Flattens the tree into the rows a collapsible table would show.
    ///
    /// Display roots always appear; a row's children appear only when its id
    /// is in `expanded`. Work is proportional to the rows returned.
    pub fn visible_rows(
        &self,
        expanded: &HashSet<NodeId>,
        include_orphans: bool,
    ) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(NodeIndex, usize)> = self
            .display_root_slots(include_orphans)
            .into_iter()
            .rev()
            .map(|slot| (slot, 0))
            .collect();

        while let Some((slot, level)) = stack.pop() {
            let node = &self.graph[slot];
            let child_status = self.child_status_at(slot);
            let is_expanded = child_status.has_children() && expanded.contains(&node.id);

            rows.push(VisibleRow {
                id: node.id.clone(),
                level,
                child_status,
                expanded: is_expanded,
                orphan: self.index.is_orphan(slot),
            });

            if is_expanded {
                stack.extend(
                    self.index
                        .children(slot)
                        .iter()
                        .rev()
                        .map(|&child| (child, level + 1)),
                );
            }
        }

        rows
    }

    /// Materializes the subtree under `id` down to `max_depth` levels.
    ///
    /// `max_depth == 0` returns only the node itself.
    pub fn materialize(&self, id: &str, max_depth: usize) -> Result<TreeView> {
        let slot = self.slot(id)?;
        Ok(self.view_at(slot, 0, max_depth))
    }

    /// Materializes every display root down to `max_depth` levels.
    pub fn materialize_all(&self, max_depth: usize, include_orphans: bool) -> Vec<TreeView> {
        self.display_root_slots(include_orphans)
            .into_iter()
            .map(|slot| self.view_at(slot, 0, max_depth))
            .collect()
    }

    fn view_at(&self, slot: NodeIndex, level: usize, max_depth: usize) -> TreeView {
        let node: &AssemblyNode = &self.graph[slot];
        let child_slots = self.index.children(slot);
        let truncated = level >= max_depth && !child_slots.is_empty();

        let children = if truncated {
            Vec::new()
        } else {
            child_slots
                .iter()
                .map(|&child| self.view_at(child, level + 1, max_depth))
                .collect()
        };

        TreeView {
            id: node.id.clone(),
            name: node.name.clone(),
            node_type: node.node_type,
            part_number: node.part_number.clone(),
            reference_designator: node.reference_designator.clone(),
            quantity: node.quantity,
            rollup: self.rollup_at(slot),
            child_status: self.child_status_at(slot),
            truncated,
            orphan: self.index.is_orphan(slot),
            children,
        }
    }
}
