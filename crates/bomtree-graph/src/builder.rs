//! Hierarchy builder.
//!
//! The builder takes one design's nodes and turns them into a
//! [`Hierarchy`] in two passes:
//! 1. Place every node in the arena and index it by path
//! 2. Resolve parent paths into containment edges, then derive the
//!    preorder ranks, rollups and search index from the linked tree

use crate::hierarchy::Hierarchy;
use crate::index::PathIndex;
use crate::rollup;
use crate::search_index::SearchIndex;
use bomtree_core::{AssemblyNode, BuildWarning, DesignId, NodeRecord, QuantityMode};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Builds a [`Hierarchy`] for a single design.
pub struct HierarchyBuilder {
    design_id: DesignId,
    nodes: Vec<AssemblyNode>,
    warnings: Vec<BuildWarning>,
    quantity_mode: QuantityMode,
}

impl HierarchyBuilder {
    /// Creates a builder for the given design.
    pub fn new(design_id: impl Into<DesignId>) -> Self {
        Self {
            design_id: design_id.into(),
            nodes: Vec::new(),
            warnings: Vec::new(),
            quantity_mode: QuantityMode::default(),
        }
    }

    /// Sets the quantity semantics used for rollups.
    pub fn with_quantity_mode(mut self, mode: QuantityMode) -> Self {
        self.quantity_mode = mode;
        self
    }

    /// Adds normalized nodes.
    ///
    /// Nodes belonging to another design are skipped; designs are never
    /// merged.
    pub fn add_nodes(&mut self, nodes: Vec<AssemblyNode>) {
        for node in nodes {
            if node.design_id != self.design_id {
                warn!(
                    node = %node.id,
                    design = %node.design_id,
                    expected = %self.design_id,
                    "Skipping node from another design"
                );
                continue;
            }
            self.nodes.push(node);
        }
    }

    /// Normalizes and adds raw records.
    pub fn add_records(&mut self, records: Vec<NodeRecord>) {
        let mut nodes = Vec::with_capacity(records.len());
        for record in records {
            if let Some(node) = AssemblyNode::from_record(record, &mut self.warnings) {
                nodes.push(node);
            }
        }
        self.add_nodes(nodes);
    }

    /// Finishes building and returns the hierarchy.
    pub fn build(mut self) -> Hierarchy {
        // Arena slots follow path order so that every derived structure is
        // independent of the order records arrived in.
        self.nodes.sort_by(|a, b| {
            a.path
                .as_str()
                .cmp(b.path.as_str())
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut graph: DiGraph<AssemblyNode, ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        for node in self.nodes {
            graph.add_node(node);
        }

        let (index, index_warnings) =
            PathIndex::build(graph.node_indices().map(|slot| (slot, &graph[slot])));
        self.warnings.extend(index_warnings);

        // Resolve containment edges
        let mut edges_to_add = Vec::new();
        for parent in index.slots() {
            for &child in index.children(parent) {
                edges_to_add.push((parent, child));
            }
        }
        edges_to_add.sort();
        for (parent, child) in edges_to_add {
            graph.add_edge(parent, child, ());
        }

        let preorder = preorder_ranks(&index);
        let rollups = rollup::compute(&graph, &index, self.quantity_mode);

        let mut search = SearchIndex::new();
        for slot in index.slots() {
            let node = &graph[slot];
            search.insert(&node.name, slot);
            if let Some(part_number) = &node.part_number {
                search.insert(part_number, slot);
            }
            if let Some(designator) = &node.reference_designator {
                search.insert(designator, slot);
            }
        }

        debug!(
            design = %self.design_id,
            nodes = index.len(),
            edges = graph.edge_count(),
            warnings = self.warnings.len(),
            mode = %self.quantity_mode,
            "Built hierarchy"
        );

        Hierarchy {
            design_id: self.design_id,
            graph,
            index,
            search,
            rollups,
            preorder,
            warnings: self.warnings,
            quantity_mode: self.quantity_mode,
        }
    }
}

/// Numbers every indexed node in a preorder walk of roots, then orphans.
fn preorder_ranks(index: &PathIndex) -> HashMap<NodeIndex, usize> {
    let mut ranks = HashMap::with_capacity(index.len());
    let mut stack: Vec<NodeIndex> = index
        .roots()
        .iter()
        .chain(index.orphans())
        .rev()
        .copied()
        .collect();

    while let Some(slot) = stack.pop() {
        ranks.insert(slot, ranks.len());
        stack.extend(index.children(slot).iter().rev().copied());
    }

    ranks
}
