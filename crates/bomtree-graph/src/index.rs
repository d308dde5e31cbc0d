//! Path index over one design's nodes.
//!
//! Replaces a linear scan of the flat node list with hash lookups:
//! path → node, id → node, and node → ordered direct children. Building
//! the index is the only place where parent links are derived, and it is
//! where the structural invariants (depth vs. path, unique paths, declared
//! child counts, missing parents) are checked.

use bomtree_core::{natural_cmp, AssemblyNode, BuildWarning, NodeId};
use petgraph::graph::NodeIndex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Deterministic order for siblings.
///
/// Nodes with a reference designator come first, ordered naturally
/// (`R2` before `R10`), then by name, then by last path segment, then by
/// id. The result never depends on input order.
pub fn sibling_order(a: &AssemblyNode, b: &AssemblyNode) -> Ordering {
    let by_designator = match (&a.reference_designator, &b.reference_designator) {
        (Some(x), Some(y)) => natural_cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_designator
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| natural_cmp(a.path.last_segment(), b.path.last_segment()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Path and child lookups for a single design.
#[derive(Debug, Default, Clone)]
pub struct PathIndex {
    /// Maps materialized paths to arena slots.
    by_path: HashMap<String, NodeIndex>,

    /// Maps node ids to arena slots.
    by_id: HashMap<NodeId, NodeIndex>,

    /// Ordered direct children of each node that has any.
    children: HashMap<NodeIndex, Vec<NodeIndex>>,

    /// Depth-0 nodes in sibling order.
    roots: Vec<NodeIndex>,

    /// Nodes whose parent path is missing, in sibling order.
    orphans: Vec<NodeIndex>,

    /// Membership lookup for `orphans`.
    orphan_set: HashSet<NodeIndex>,
}

impl PathIndex {
    /// Builds the index from arena slots and their nodes.
    ///
    /// Nodes whose declared depth disagrees with their path, and nodes that
    /// lose a duplicate-path contest, are left out of the index. Everything
    /// found along the way is returned as warnings.
    pub fn build<'a, I>(nodes: I) -> (Self, Vec<BuildWarning>)
    where
        I: IntoIterator<Item = (NodeIndex, &'a AssemblyNode)>,
    {
        let mut warnings = Vec::new();
        let mut entries: Vec<(NodeIndex, &AssemblyNode)> = nodes.into_iter().collect();
        entries.sort_by(|(_, a), (_, b)| {
            a.path
                .as_str()
                .cmp(b.path.as_str())
                .then_with(|| a.id.cmp(&b.id))
        });

        let lookup: HashMap<NodeIndex, &AssemblyNode> = entries.iter().copied().collect();
        let mut index = PathIndex::default();

        // Pass 1: register paths
        for &(slot, node) in &entries {
            if !node.depth_matches_path() {
                let warning = BuildWarning::DepthMismatch {
                    node_id: node.id.clone(),
                    path: node.path.to_string(),
                    declared: node.depth,
                    implied: node.path.implied_depth(),
                };
                warn!("{}", warning);
                warnings.push(warning);
                continue;
            }

            match index.by_path.get(node.path.as_str()).copied() {
                None => {
                    index.by_path.insert(node.path.to_string(), slot);
                }
                Some(existing) => {
                    // Entries are sorted by (path, id), so the registered
                    // node always has the smaller id.
                    let kept = lookup[&existing];
                    let warning = BuildWarning::DuplicatePath {
                        path: node.path.to_string(),
                        kept_id: kept.id.clone(),
                        dropped_id: node.id.clone(),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        for &slot in index.by_path.values() {
            index.by_id.insert(lookup[&slot].id.clone(), slot);
        }

        // Pass 2: link children to parents
        for &(slot, node) in &entries {
            if index.by_id.get(&node.id) != Some(&slot) {
                continue;
            }

            match node.path.parent() {
                None => index.roots.push(slot),
                Some(parent_path) => match index.by_path.get(parent_path) {
                    Some(&parent) => index.children.entry(parent).or_default().push(slot),
                    None => {
                        let warning = BuildWarning::Orphan {
                            node_id: node.id.clone(),
                            path: node.path.to_string(),
                            missing_parent: parent_path.to_string(),
                        };
                        warn!("{}", warning);
                        warnings.push(warning);
                        index.orphans.push(slot);
                        index.orphan_set.insert(slot);
                    }
                },
            }
        }

        let order = |a: &NodeIndex, b: &NodeIndex| sibling_order(lookup[a], lookup[b]);
        index.roots.sort_by(order);
        index.orphans.sort_by(order);
        for list in index.children.values_mut() {
            list.sort_by(order);
        }

        // Pass 3: compare declared child counts with what arrived
        for &(slot, node) in &entries {
            if index.by_id.get(&node.id) != Some(&slot) {
                continue;
            }

            let present = index.child_count(slot);
            let declared = node.numchild;
            let warning = match (declared as usize).cmp(&present) {
                Ordering::Equal => continue,
                Ordering::Greater => BuildWarning::PartialSubtree {
                    node_id: node.id.clone(),
                    declared,
                    present,
                },
                Ordering::Less => BuildWarning::ChildCountMismatch {
                    node_id: node.id.clone(),
                    declared,
                    present,
                },
            };
            warn!("{}", warning);
            warnings.push(warning);
        }

        debug!(
            nodes = index.len(),
            roots = index.roots.len(),
            orphans = index.orphans.len(),
            warnings = warnings.len(),
            "Built path index"
        );

        (index, warnings)
    }

    /// Looks up a node by its materialized path.
    pub fn get_by_path(&self, path: &str) -> Option<NodeIndex> {
        self.by_path.get(path).copied()
    }

    /// Looks up a node by id.
    pub fn get_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    /// Ordered direct children of a slot.
    pub fn children(&self, slot: NodeIndex) -> &[NodeIndex] {
        self.children
            .get(&slot)
            .map(|list| list.as_slice())
            .unwrap_or_default()
    }

    /// Number of direct children present for a slot.
    pub fn child_count(&self, slot: NodeIndex) -> usize {
        self.children.get(&slot).map_or(0, |list| list.len())
    }

    /// Depth-0 nodes in sibling order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Heads of detached subtrees in sibling order.
    pub fn orphans(&self) -> &[NodeIndex] {
        &self.orphans
    }

    /// Returns true if the slot heads a detached subtree.
    pub fn is_orphan(&self, slot: NodeIndex) -> bool {
        self.orphan_set.contains(&slot)
    }

    /// Iterates over every indexed slot, in no particular order.
    pub fn slots(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.by_id.values().copied()
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomtree_core::{NodeRecord, WarningKind};

    fn nodes(records: Vec<NodeRecord>) -> Vec<AssemblyNode> {
        let mut warnings = Vec::new();
        records
            .into_iter()
            .filter_map(|r| AssemblyNode::from_record(r, &mut warnings))
            .collect()
    }

    fn build(nodes: &[AssemblyNode]) -> (PathIndex, Vec<BuildWarning>) {
        PathIndex::build(
            nodes
                .iter()
                .enumerate()
                .map(|(i, node)| (NodeIndex::new(i), node)),
        )
    }

    fn paths(nodes: &[AssemblyNode], slots: &[NodeIndex]) -> Vec<String> {
        slots
            .iter()
            .map(|slot| nodes[slot.index()].path.to_string())
            .collect()
    }

    #[test]
    fn test_links_children() {
        let nodes = nodes(vec![
            NodeRecord::new("c", "d", "Right", "PART", "1/3"),
            NodeRecord::new("a", "d", "Frame", "ASSEMBLY", "1").with_numchild(2),
            NodeRecord::new("b", "d", "Left", "PART", "1/2"),
        ]);
        let (index, warnings) = build(&nodes);

        assert!(warnings.is_empty());
        assert_eq!(paths(&nodes, index.roots()), vec!["1"]);
        let root = index.get_by_path("1").unwrap();
        assert_eq!(paths(&nodes, index.children(root)), vec!["1/2", "1/3"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_children_ordered_by_designator() {
        let nodes = nodes(vec![
            NodeRecord::new("r", "d", "Board", "ASSEMBLY", "1").with_numchild(4),
            NodeRecord::new("x", "d", "Bracket", "PART", "1/1"),
            NodeRecord::new("y", "d", "Resistor", "PART", "1/2").with_reference_designator("R10"),
            NodeRecord::new("z", "d", "Resistor", "PART", "1/3").with_reference_designator("R2"),
            NodeRecord::new("w", "d", "Capacitor", "PART", "1/4").with_reference_designator("C1"),
        ]);
        let (index, _) = build(&nodes);

        let root = index.get_by_id("r").unwrap();
        assert_eq!(
            paths(&nodes, index.children(root)),
            vec!["1/4", "1/3", "1/2", "1/1"]
        );
    }

    #[test]
    fn test_orphan_is_reported() {
        let nodes = nodes(vec![
            NodeRecord::new("a", "d", "Frame", "ASSEMBLY", "1"),
            NodeRecord::new("b", "d", "Bolt", "HARDWARE", "5/2"),
        ]);
        let (index, warnings) = build(&nodes);

        assert_eq!(paths(&nodes, index.roots()), vec!["1"]);
        assert_eq!(paths(&nodes, index.orphans()), vec!["5/2"]);
        assert!(index.is_orphan(index.get_by_id("b").unwrap()));
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0],
            BuildWarning::Orphan {
                node_id: "b".to_string(),
                path: "5/2".to_string(),
                missing_parent: "5".to_string(),
            }
        );
    }

    #[test]
    fn test_detached_level_is_all_orphans() {
        // One level fetched without its parent
        let nodes = nodes(
            (1..=300)
                .map(|i| NodeRecord::new(format!("p{i}"), "d", "Pin", "PART", format!("9/{i}")))
                .chain([NodeRecord::new("a", "d", "Frame", "ASSEMBLY", "1")])
                .collect(),
        );
        let (index, warnings) = build(&nodes);

        assert_eq!(index.orphans().len(), 300);
        assert_eq!(warnings.len(), 300);
        assert!(index.orphans().iter().all(|&slot| index.is_orphan(slot)));
        assert!(!index.is_orphan(index.get_by_id("a").unwrap()));
    }

    #[test]
    fn test_depth_mismatch_excludes_node() {
        let nodes = nodes(vec![
            NodeRecord::new("a", "d", "Frame", "ASSEMBLY", "1").with_numchild(1),
            NodeRecord::new("b", "d", "Plate", "PART", "1/2").with_depth(3),
        ]);
        let (index, warnings) = build(&nodes);

        assert!(index.get_by_id("b").is_none());
        let kinds: Vec<WarningKind> = warnings.iter().map(|w| w.kind()).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::DepthMismatch, WarningKind::PartialSubtree]
        );
    }

    #[test]
    fn test_duplicate_path_keeps_smallest_id() {
        let nodes = nodes(vec![
            NodeRecord::new("n9", "d", "Copy", "PART", "1"),
            NodeRecord::new("n1", "d", "Original", "PART", "1"),
        ]);
        let (index, warnings) = build(&nodes);

        assert_eq!(index.len(), 1);
        assert!(index.get_by_id("n1").is_some());
        assert!(index.get_by_id("n9").is_none());
        assert_eq!(
            warnings,
            vec![BuildWarning::DuplicatePath {
                path: "1".to_string(),
                kept_id: "n1".to_string(),
                dropped_id: "n9".to_string(),
            }]
        );
    }

    #[test]
    fn test_partial_and_excess_children() {
        let nodes = nodes(vec![
            NodeRecord::new("a", "d", "Frame", "ASSEMBLY", "1").with_numchild(2),
            NodeRecord::new("b", "d", "Plate", "PART", "1/1"),
            NodeRecord::new("c", "d", "Loose", "ASSEMBLY", "2"),
            NodeRecord::new("e", "d", "Pin", "PART", "2/1"),
        ]);
        let (_, warnings) = build(&nodes);

        assert_eq!(
            warnings,
            vec![
                BuildWarning::PartialSubtree {
                    node_id: "a".to_string(),
                    declared: 2,
                    present: 1,
                },
                BuildWarning::ChildCountMismatch {
                    node_id: "c".to_string(),
                    declared: 0,
                    present: 1,
                },
            ]
        );
    }

    #[test]
    fn test_prefix_lookalike_is_not_a_child() {
        let nodes = nodes(vec![
            NodeRecord::new("a", "d", "One", "ASSEMBLY", "1"),
            NodeRecord::new("b", "d", "Eleven", "ASSEMBLY", "11"),
            NodeRecord::new("c", "d", "Child", "PART", "11/1"),
        ]);
        let (index, _) = build(&nodes);

        let one = index.get_by_path("1").unwrap();
        assert!(index.children(one).is_empty());
        let eleven = index.get_by_path("11").unwrap();
        assert_eq!(paths(&nodes, index.children(eleven)), vec!["11/1"]);
    }

    #[test]
    fn test_empty() {
        let (index, warnings) = build(&[]);
        assert!(index.is_empty());
        assert!(index.roots().is_empty());
        assert!(warnings.is_empty());
    }
}
