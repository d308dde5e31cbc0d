//! Query and filter operations.
//!
//! Two contracts live here:
//! - `search*` results keep hierarchy context. Every match brings its
//!   ancestor chain along, so a deeply nested part still renders inside
//!   the assemblies that contain it.
//! - `filter_by_type` is a flat view. It returns only the matching nodes
//!   and never adds ancestors.

use crate::hierarchy::Hierarchy;
use bomtree_core::{AssemblyNode, NodeId, NodeType};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A composable node predicate. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeQuery {
    /// Case-insensitive substring of name, part number or designator.
    pub text: Option<String>,
    pub node_type: Option<NodeType>,
    /// Exact part number.
    pub part_number: Option<String>,
    pub min_depth: Option<u32>,
    pub max_depth: Option<u32>,
    /// Only nodes without mass data.
    pub missing_mass: bool,
}

impl NodeQuery {
    /// Matches nodes whose text fields contain `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Matches nodes of one type.
    pub fn of_type(node_type: NodeType) -> Self {
        Self {
            node_type: Some(node_type),
            ..Self::default()
        }
    }

    pub fn with_node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Evaluates the predicate against one node.
    pub fn matches(&self, node: &AssemblyNode) -> bool {
        if let Some(node_type) = self.node_type {
            if node.node_type != node_type {
                return false;
            }
        }
        if let Some(part_number) = &self.part_number {
            if node.part_number.as_deref() != Some(part_number.as_str()) {
                return false;
            }
        }
        if self.min_depth.is_some_and(|min| node.depth < min) {
            return false;
        }
        if self.max_depth.is_some_and(|max| node.depth > max) {
            return false;
        }
        if self.missing_mass && node.mass.is_some() {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text_matches(node, &text.to_lowercase()),
            _ => true,
        }
    }

    fn search_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

fn text_matches(node: &AssemblyNode, needle: &str) -> bool {
    std::iter::once(Some(node.name.as_str()))
        .chain([
            node.part_number.as_deref(),
            node.reference_designator.as_deref(),
        ])
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Matches plus the ancestors needed to show them in context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Nodes satisfying the predicate, in tree order.
    pub matches: Vec<NodeId>,
    /// Matches together with all of their ancestors, in tree order.
    pub visible: Vec<NodeId>,
}

impl SearchResult {
    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns true if the node matched the predicate itself.
    pub fn is_match(&self, id: &str) -> bool {
        self.matches.iter().any(|m| m == id)
    }

    /// Returns true if the node should be shown, as a match or as context.
    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.iter().any(|v| v == id)
    }
}

impl Hierarchy {
    /// Finds nodes satisfying `predicate`, with their ancestor chains.
    pub fn search<F>(&self, predicate: F) -> SearchResult
    where
        F: Fn(&AssemblyNode) -> bool,
    {
        let hits: Vec<NodeIndex> = self
            .index
            .slots()
            .filter(|&slot| predicate(&self.graph[slot]))
            .collect();
        self.with_ancestors(hits)
    }

    /// Evaluates a [`NodeQuery`], using the text index when it has text.
    pub fn search_query(&self, query: &NodeQuery) -> SearchResult {
        let hits: Vec<NodeIndex> = match query.search_text() {
            Some(text) => self
                .search
                .search(text)
                .into_iter()
                .filter(|&slot| query.matches(&self.graph[slot]))
                .collect(),
            None => self
                .index
                .slots()
                .filter(|&slot| query.matches(&self.graph[slot]))
                .collect(),
        };
        self.with_ancestors(hits)
    }

    /// Case-insensitive substring search over names, part numbers and
    /// reference designators, with ancestor chains.
    pub fn search_text(&self, text: &str) -> SearchResult {
        self.with_ancestors(self.search.search(text))
    }

    /// Nodes of one type, in tree order.
    ///
    /// This is a flat view: ancestors are not included. Use
    /// [`search_query`](Self::search_query) with [`NodeQuery::of_type`] to
    /// keep the containing assemblies.
    pub fn filter_by_type(&self, node_type: NodeType) -> Vec<&AssemblyNode> {
        let mut slots: Vec<NodeIndex> = self
            .index
            .slots()
            .filter(|&slot| self.graph[slot].node_type == node_type)
            .collect();
        self.sort_tree_order(&mut slots);
        slots.into_iter().map(|slot| &self.graph[slot]).collect()
    }

    fn with_ancestors(&self, mut hits: Vec<NodeIndex>) -> SearchResult {
        let mut seen: HashSet<NodeIndex> = hits.iter().copied().collect();
        let mut visible: Vec<NodeIndex> = hits.clone();

        for &hit in &hits {
            for ancestor in self.ancestor_slots(hit) {
                // Once an ancestor is known, the rest of its chain is too
                if !seen.insert(ancestor) {
                    break;
                }
                visible.push(ancestor);
            }
        }

        self.sort_tree_order(&mut hits);
        self.sort_tree_order(&mut visible);

        SearchResult {
            matches: hits.iter().map(|&s| self.graph[s].id.clone()).collect(),
            visible: visible.iter().map(|&s| self.graph[s].id.clone()).collect(),
        }
    }

    fn sort_tree_order(&self, slots: &mut [NodeIndex]) {
        slots.sort_by_key(|slot| self.preorder.get(slot).copied().unwrap_or(usize::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use bomtree_core::NodeRecord;

    fn pump() -> Hierarchy {
        let mut builder = HierarchyBuilder::new("d");
        builder.add_records(vec![
            NodeRecord::new("pump", "d", "Pump", "ASSEMBLY", "1").with_numchild(2),
            NodeRecord::new("motor", "d", "Motor", "SUBASSEMBLY", "1/1").with_numchild(2),
            NodeRecord::new("rotor", "d", "Rotor", "PART", "1/1/1")
                .with_part_number("RT-200")
                .with_mass(3.0),
            NodeRecord::new("screw", "d", "Screw", "HARDWARE", "1/1/2").with_part_number("M4"),
            NodeRecord::new("casing", "d", "Casing", "PART", "1/2")
                .with_part_number("CS-100")
                .with_mass(5.0),
        ]);
        builder.build()
    }

    #[test]
    fn test_search_restores_ancestors() {
        let h = pump();
        let result = h.search(|n| n.id == "rotor");

        assert_eq!(result.matches, vec!["rotor"]);
        assert_eq!(result.visible, vec!["pump", "motor", "rotor"]);
        assert!(result.is_match("rotor"));
        assert!(!result.is_match("motor"));
        assert!(result.is_visible("motor"));
        assert!(!result.is_visible("casing"));
    }

    #[test]
    fn test_search_shared_ancestors_once() {
        let h = pump();
        let result = h.search(|n| n.node_type == NodeType::Part);

        // Siblings sort by name, so Casing precedes Motor
        assert_eq!(result.matches, vec!["casing", "rotor"]);
        assert_eq!(result.visible, vec!["pump", "casing", "motor", "rotor"]);
    }

    #[test]
    fn test_search_text() {
        let h = pump();

        assert_eq!(h.search_text("rt-2").matches, vec!["rotor"]);
        assert_eq!(h.search_text("CASING").visible, vec!["pump", "casing"]);
        assert!(h.search_text("impeller").is_empty());
    }

    #[test]
    fn test_search_query_combines_fields() {
        let h = pump();

        let query = NodeQuery::text("r").with_node_type(NodeType::Part);
        assert_eq!(h.search_query(&query).matches, vec!["rotor"]);

        let query = NodeQuery {
            missing_mass: true,
            min_depth: Some(1),
            ..NodeQuery::default()
        };
        assert_eq!(h.search_query(&query).matches, vec!["motor", "screw"]);

        let query = NodeQuery {
            part_number: Some("M4".to_string()),
            ..NodeQuery::default()
        };
        assert_eq!(h.search_query(&query).visible, vec!["pump", "motor", "screw"]);
    }

    #[test]
    fn test_filter_by_type_is_flat() {
        let h = pump();
        let ids: Vec<&str> = h
            .filter_by_type(NodeType::Part)
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["casing", "rotor"]);
        assert!(h.filter_by_type(NodeType::Unknown).is_empty());
    }

    #[test]
    fn test_node_query_deserializes_partially() {
        let query: NodeQuery = serde_json::from_str(r#"{"node_type":"HARDWARE"}"#).unwrap();
        assert_eq!(query, NodeQuery::of_type(NodeType::Hardware));
    }

    #[test]
    fn test_single_character_text_is_substring() {
        let h = pump();
        let query = NodeQuery::text("4");

        let indexed = h.search_query(&query);
        let scanned = h.search(|n| query.matches(n));

        assert_eq!(indexed.matches, vec!["screw"]);
        assert_eq!(indexed, scanned);
        assert_eq!(h.search_text("4"), indexed);
    }
}
