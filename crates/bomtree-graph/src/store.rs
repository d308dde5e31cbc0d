//! Node store.
//!
//! Holds normalized nodes keyed by id and grouped by design. This is the
//! leaf of the engine: it does not know about paths or parents, only that
//! ids are unique and that designs are never mixed.

use bomtree_core::{AssemblyNode, BuildWarning, DesignId, NodeId, NodeRecord};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Normalized nodes, keyed by id, grouped by design.
#[derive(Debug, Default, Clone)]
pub struct NodeStore {
    nodes: HashMap<NodeId, AssemblyNode>,
    by_design: BTreeMap<DesignId, Vec<NodeId>>,
}

impl NodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes backend records and stores the usable ones.
    pub fn from_records(records: Vec<NodeRecord>) -> (Self, Vec<BuildWarning>) {
        let mut warnings = Vec::new();
        let nodes: Vec<AssemblyNode> = records
            .into_iter()
            .filter_map(|record| AssemblyNode::from_record(record, &mut warnings))
            .collect();
        for warning in &warnings {
            warn!("{}", warning);
        }

        let (store, store_warnings) = Self::from_nodes(nodes);
        warnings.extend(store_warnings);
        (store, warnings)
    }

    /// Stores already-normalized nodes.
    ///
    /// When an id occurs more than once, the occurrence with the smallest
    /// `(design_id, path)` is kept, so the outcome does not depend on input
    /// order.
    pub fn from_nodes(nodes: Vec<AssemblyNode>) -> (Self, Vec<BuildWarning>) {
        let mut store = Self::new();
        let mut warnings = Vec::new();

        for node in nodes {
            if let Some(warning) = store.insert(node) {
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        for ids in store.by_design.values_mut() {
            ids.sort();
        }

        (store, warnings)
    }

    /// Inserts one node, resolving id collisions.
    fn insert(&mut self, node: AssemblyNode) -> Option<BuildWarning> {
        let Some(existing) = self.nodes.get(&node.id) else {
            self.by_design
                .entry(node.design_id.clone())
                .or_default()
                .push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
            return None;
        };

        let existing_key = (existing.design_id.as_str(), existing.path.as_str());
        let incoming_key = (node.design_id.as_str(), node.path.as_str());

        if incoming_key < existing_key {
            let warning = BuildWarning::DuplicateId {
                node_id: node.id.clone(),
                kept_path: node.path.to_string(),
                dropped_path: existing.path.to_string(),
            };
            let previous_design = existing.design_id.clone();
            if let Some(ids) = self.by_design.get_mut(&previous_design) {
                ids.retain(|id| id != &node.id);
                if ids.is_empty() {
                    self.by_design.remove(&previous_design);
                }
            }
            self.by_design
                .entry(node.design_id.clone())
                .or_default()
                .push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
            Some(warning)
        } else {
            Some(BuildWarning::DuplicateId {
                node_id: node.id.clone(),
                kept_path: existing.path.to_string(),
                dropped_path: node.path.to_string(),
            })
        }
    }

    /// Looks up a node by id.
    pub fn get(&self, id: &str) -> Option<&AssemblyNode> {
        self.nodes.get(id)
    }

    /// Designs present in the store, sorted.
    pub fn designs(&self) -> impl Iterator<Item = &str> {
        self.by_design.keys().map(String::as_str)
    }

    /// Nodes of one design, sorted by id.
    pub fn nodes(&self, design_id: &str) -> Vec<&AssemblyNode> {
        self.by_design
            .get(design_id)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    /// Consumes the store, yielding each design's nodes.
    pub fn into_designs(mut self) -> Vec<(DesignId, Vec<AssemblyNode>)> {
        let by_design = std::mem::take(&mut self.by_design);
        by_design
            .into_iter()
            .map(|(design_id, ids)| {
                let nodes = ids
                    .into_iter()
                    .filter_map(|id| self.nodes.remove(&id))
                    .collect();
                (design_id, nodes)
            })
            .collect()
    }

    /// Total number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
