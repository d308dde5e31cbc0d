//! Subtree and whole-design aggregates.
//!
//! Rollups are computed once per hierarchy in a single post-order pass, so
//! the totals shown for a collapsed node are the same numbers the expanded
//! subtree adds up to. How quantities combine along the tree is decided by
//! [`QuantityMode`]:
//!
//! - `Exploded`: a node's quantity multiplies everything below it.
//!   2 sub-assemblies × 3 bolts each = 2 + 6 occurrences.
//! - `Flat`: quantities are summed as they appear.

use crate::hierarchy::Hierarchy;
use crate::index::PathIndex;
use bomtree_core::{AssemblyNode, DesignId, NodeType, QuantityMode, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A summed physical quantity that may be missing contributions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measure {
    /// Sum of the known contributions.
    pub value: f64,
    /// True if at least one contributing node had no value, or part of the
    /// subtree was not supplied.
    pub partial: bool,
}

impl Measure {
    fn of(own: Option<f64>) -> Self {
        match own {
            Some(value) => Self {
                value,
                partial: false,
            },
            None => Self {
                value: 0.0,
                partial: true,
            },
        }
    }

    fn add(&mut self, other: Measure) {
        self.value += other.value;
        self.partial |= other.partial;
    }

    fn scaled(self, factor: u32) -> Self {
        Self {
            value: self.value * f64::from(factor),
            partial: self.partial,
        }
    }
}

/// Aggregates for the subtree rooted at one node, including the node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rollup {
    /// Occurrence count.
    pub quantity: u64,
    pub mass: Measure,
    pub volume: Measure,
    /// Number of distinct node records.
    pub node_count: usize,
    /// False if some node in the subtree has children that were not supplied.
    pub complete: bool,
}

/// Whole-design aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomSummary {
    pub design_id: DesignId,
    pub quantity_mode: QuantityMode,
    /// Number of node records in the hierarchy.
    pub node_count: usize,
    /// Occurrences, after applying the quantity mode.
    pub total_occurrences: u64,
    /// Distinct non-empty part numbers.
    pub unique_part_numbers: usize,
    pub total_mass: f64,
    pub mass_partial: bool,
    pub total_volume: f64,
    pub volume_partial: bool,
    /// Node records per type.
    pub counts_by_node_type: BTreeMap<NodeType, usize>,
    /// Occurrences per type, after applying the quantity mode.
    pub occurrences_by_node_type: BTreeMap<NodeType, u64>,
    pub orphan_count: usize,
    /// Nodes whose declared children were not all supplied.
    pub partial_subtrees: usize,
    pub max_depth: u32,
}

impl BomSummary {
    /// The all-zero summary of a design with no nodes.
    pub fn empty(design_id: impl Into<DesignId>, quantity_mode: QuantityMode) -> Self {
        Self {
            design_id: design_id.into(),
            quantity_mode,
            node_count: 0,
            total_occurrences: 0,
            unique_part_numbers: 0,
            total_mass: 0.0,
            mass_partial: false,
            total_volume: 0.0,
            volume_partial: false,
            counts_by_node_type: BTreeMap::new(),
            occurrences_by_node_type: BTreeMap::new(),
            orphan_count: 0,
            partial_subtrees: 0,
            max_depth: 0,
        }
    }
}

/// Computes the rollup of every indexed node.
pub(crate) fn compute(
    graph: &DiGraph<AssemblyNode, ()>,
    index: &PathIndex,
    mode: QuantityMode,
) -> HashMap<NodeIndex, Rollup> {
    let mut rollups: HashMap<NodeIndex, Rollup> = HashMap::with_capacity(index.len());

    for &start in index.roots().iter().chain(index.orphans()) {
        let mut dfs = DfsPostOrder::new(graph, start);
        while let Some(slot) = dfs.next(graph) {
            let node = &graph[slot];
            let children = index.children(slot);

            let mut below_quantity: u64 = 0;
            let mut below_mass = Measure::default();
            let mut below_volume = Measure::default();
            let mut node_count = 1;
            let mut complete = (node.numchild as usize) <= children.len();

            for child in children {
                let r = &rollups[child];
                below_quantity = below_quantity.saturating_add(r.quantity);
                below_mass.add(r.mass);
                below_volume.add(r.volume);
                node_count += r.node_count;
                complete &= r.complete;
            }

            let quantity = u64::from(node.quantity);
            let (quantity, mass, volume) = match mode {
                QuantityMode::Exploded => {
                    let mut mass = Measure::of(node.mass);
                    mass.add(below_mass);
                    let mut volume = Measure::of(node.volume);
                    volume.add(below_volume);
                    (
                        quantity.saturating_mul(below_quantity.saturating_add(1)),
                        mass.scaled(node.quantity),
                        volume.scaled(node.quantity),
                    )
                }
                QuantityMode::Flat => {
                    let mut mass = Measure::of(node.mass).scaled(node.quantity);
                    mass.add(below_mass);
                    let mut volume = Measure::of(node.volume).scaled(node.quantity);
                    volume.add(below_volume);
                    (quantity.saturating_add(below_quantity), mass, volume)
                }
            };

            let mass = Measure {
                partial: mass.partial || !complete,
                ..mass
            };
            let volume = Measure {
                partial: volume.partial || !complete,
                ..volume
            };

            rollups.insert(
                slot,
                Rollup {
                    quantity,
                    mass,
                    volume,
                    node_count,
                    complete,
                },
            );
        }
    }

    rollups
}

impl Hierarchy {
    /// All aggregates for the subtree rooted at `id`.
    pub fn rollup(&self, id: &str) -> Result<Rollup> {
        let slot = self.slot(id)?;
        Ok(self.rollup_at(slot))
    }

    /// Mass of the subtree: own mass × quantity plus the children's rollups.
    ///
    /// Missing masses count as zero and mark the result partial.
    pub fn subtree_mass(&self, id: &str) -> Result<Measure> {
        Ok(self.rollup(id)?.mass)
    }

    /// Volume of the subtree, with the same rules as mass.
    pub fn subtree_volume(&self, id: &str) -> Result<Measure> {
        Ok(self.rollup(id)?.volume)
    }

    /// Occurrence count of the subtree, including the node itself.
    pub fn subtree_quantity(&self, id: &str) -> Result<u64> {
        Ok(self.rollup(id)?.quantity)
    }

    /// Whole-design metrics, computed in one pass over every navigable
    /// node (detached subtrees included).
    pub fn summary(&self) -> BomSummary {
        let mut summary = BomSummary::empty(self.design_id.clone(), self.quantity_mode);
        let mut part_numbers: HashSet<&str> = HashSet::new();

        let starts = self.display_root_slots(true);
        let mut stack: Vec<(NodeIndex, u64)> = starts.iter().map(|&slot| (slot, 1)).collect();

        while let Some((slot, multiplier)) = stack.pop() {
            let node = &self.graph[slot];
            let occurrences = multiplier.saturating_mul(u64::from(node.quantity));

            summary.node_count += 1;
            summary.total_occurrences = summary.total_occurrences.saturating_add(occurrences);
            *summary.counts_by_node_type.entry(node.node_type).or_default() += 1;
            let by_type = summary
                .occurrences_by_node_type
                .entry(node.node_type)
                .or_default();
            *by_type = by_type.saturating_add(occurrences);
            summary.max_depth = summary.max_depth.max(node.depth);

            if let Some(part_number) = node.part_number.as_deref() {
                part_numbers.insert(part_number);
            }
            if self.child_status_at(slot).is_partial() {
                summary.partial_subtrees += 1;
            }

            let child_multiplier = match self.quantity_mode {
                QuantityMode::Exploded => occurrences,
                QuantityMode::Flat => 1,
            };
            for &child in self.index.children(slot) {
                stack.push((child, child_multiplier));
            }
        }

        for slot in starts {
            let rollup = self.rollup_at(slot);
            summary.total_mass += rollup.mass.value;
            summary.mass_partial |= rollup.mass.partial;
            summary.total_volume += rollup.volume.value;
            summary.volume_partial |= rollup.volume.partial;
        }

        summary.unique_part_numbers = part_numbers.len();
        summary.orphan_count = self.index.orphans().len();
        summary
    }

    pub(crate) fn rollup_at(&self, slot: NodeIndex) -> Rollup {
        self.rollups[&slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use bomtree_core::NodeRecord;

    fn build(mode: QuantityMode, records: Vec<NodeRecord>) -> Hierarchy {
        let mut builder = HierarchyBuilder::new("d").with_quantity_mode(mode);
        builder.add_records(records);
        builder.build()
    }

    /// Frame with two brackets, each holding three bolts.
    fn frame() -> Vec<NodeRecord> {
        vec![
            NodeRecord::new("frame", "d", "Frame", "ASSEMBLY", "1")
                .with_numchild(1)
                .with_mass(10.0)
                .with_part_number("FR-1"),
            NodeRecord::new("bracket", "d", "Bracket", "SUBASSEMBLY", "1/1")
                .with_numchild(1)
                .with_quantity(2)
                .with_mass(1.5)
                .with_part_number("BR-1"),
            NodeRecord::new("bolt", "d", "Bolt", "HARDWARE", "1/1/1")
                .with_quantity(3)
                .with_mass(0.25)
                .with_part_number("M6"),
        ]
    }

    #[test]
    fn test_exploded_quantity() {
        let h = build(QuantityMode::Exploded, frame());

        assert_eq!(h.subtree_quantity("bolt").unwrap(), 3);
        assert_eq!(h.subtree_quantity("bracket").unwrap(), 2 * (1 + 3));
        assert_eq!(h.subtree_quantity("frame").unwrap(), 1 + 2 + 6);
    }

    #[test]
    fn test_flat_quantity() {
        let h = build(QuantityMode::Flat, frame());

        assert_eq!(h.subtree_quantity("bracket").unwrap(), 2 + 3);
        assert_eq!(h.subtree_quantity("frame").unwrap(), 1 + 2 + 3);
    }

    #[test]
    fn test_exploded_mass() {
        let h = build(QuantityMode::Exploded, frame());

        let bolt = h.subtree_mass("bolt").unwrap();
        assert_eq!(bolt.value, 0.75);
        assert!(!bolt.partial);

        // 2 × (1.5 + 0.75)
        assert_eq!(h.subtree_mass("bracket").unwrap().value, 4.5);
        assert_eq!(h.subtree_mass("frame").unwrap().value, 14.5);
    }

    #[test]
    fn test_flat_mass() {
        let h = build(QuantityMode::Flat, frame());

        // 1.5 × 2 + 0.25 × 3
        assert_eq!(h.subtree_mass("bracket").unwrap().value, 3.75);
        assert_eq!(h.subtree_mass("frame").unwrap().value, 13.75);
    }

    #[test]
    fn test_missing_mass_marks_partial() {
        let mut records = frame();
        records[2].mass = None;
        let h = build(QuantityMode::Exploded, records);

        let bolt = h.subtree_mass("bolt").unwrap();
        assert_eq!(bolt.value, 0.0);
        assert!(bolt.partial);
        let frame = h.subtree_mass("frame").unwrap();
        assert!(frame.partial);
        assert_eq!(frame.value, 13.0);
    }

    #[test]
    fn test_partial_subtree_marks_rollup_incomplete() {
        let h = build(
            QuantityMode::Exploded,
            vec![
                NodeRecord::new("a", "d", "Frame", "ASSEMBLY", "1")
                    .with_numchild(2)
                    .with_mass(1.0)
                    .with_volume(1.0),
                NodeRecord::new("b", "d", "Plate", "PART", "1/1")
                    .with_mass(1.0)
                    .with_volume(1.0),
            ],
        );

        let rollup = h.rollup("a").unwrap();
        assert!(!rollup.complete);
        assert!(rollup.mass.partial);
        assert!(rollup.volume.partial);
        assert!(h.rollup("b").unwrap().complete);
    }

    #[test]
    fn test_summary() {
        let h = build(QuantityMode::Exploded, frame());
        let summary = h.summary();

        assert_eq!(summary.node_count, 3);
        assert_eq!(summary.total_occurrences, 9);
        assert_eq!(summary.unique_part_numbers, 3);
        assert_eq!(summary.total_mass, 14.5);
        assert!(!summary.mass_partial);
        assert!(summary.volume_partial);
        assert_eq!(summary.counts_by_node_type[&NodeType::Hardware], 1);
        assert_eq!(summary.occurrences_by_node_type[&NodeType::Hardware], 6);
        assert_eq!(summary.occurrences_by_node_type[&NodeType::Subassembly], 2);
        assert_eq!(summary.max_depth, 2);
        assert_eq!(summary.orphan_count, 0);
        assert_eq!(summary.partial_subtrees, 0);
    }

    #[test]
    fn test_summary_matches_root_rollups() {
        for mode in [QuantityMode::Exploded, QuantityMode::Flat] {
            let h = build(mode, frame());
            let summary = h.summary();
            assert_eq!(
                summary.total_occurrences,
                h.subtree_quantity("frame").unwrap()
            );
            assert_eq!(summary.total_mass, h.subtree_mass("frame").unwrap().value);
        }
    }

    #[test]
    fn test_summary_counts_shared_part_numbers_once() {
        let h = build(
            QuantityMode::Exploded,
            vec![
                NodeRecord::new("a", "d", "Frame", "ASSEMBLY", "1").with_numchild(2),
                NodeRecord::new("b", "d", "Bolt", "HARDWARE", "1/1").with_part_number("M6"),
                NodeRecord::new("c", "d", "Bolt", "HARDWARE", "1/2").with_part_number("M6"),
            ],
        );
        assert_eq!(h.summary().unique_part_numbers, 1);
    }

    #[test]
    fn test_empty_summary() {
        let h = build(QuantityMode::Exploded, Vec::new());
        let summary = h.summary();

        assert_eq!(summary, BomSummary::empty("d", QuantityMode::Exploded));
        assert_eq!(summary.total_occurrences, 0);
        assert_eq!(summary.total_mass, 0.0);
        assert!(summary.counts_by_node_type.is_empty());
    }
}
