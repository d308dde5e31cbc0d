//! Engine facade.
//!
//! `BomEngine` takes the flat record list the backend returned for one or
//! more designs and builds an independent [`Hierarchy`] per design. It
//! routes node-id based navigation to the owning design and keeps the
//! combined warning report.

use crate::builder::HierarchyBuilder;
use crate::hierarchy::{ChildStatus, Hierarchy};
use crate::query::SearchResult;
use crate::rollup::BomSummary;
use crate::store::NodeStore;
use crate::view::VisibleRow;
use bomtree_core::{
    AssemblyNode, BomError, BuildWarning, DesignId, EngineConfig, NodeId, NodeRecord, Result,
    WarningKind,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;
use tracing::info;

/// Outcome of a build: counts plus every warning raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Records received from the caller.
    pub records: usize,
    /// Nodes that ended up navigable.
    pub indexed: usize,
    pub designs: usize,
    /// Warnings sorted by node id, then kind.
    pub warnings: Vec<BuildWarning>,
    pub build_time_ms: u64,
}

impl BuildReport {
    /// Returns true if the input had no data-integrity issues.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Warnings grouped by kind.
    pub fn by_kind(&self) -> BTreeMap<WarningKind, Vec<&BuildWarning>> {
        let mut groups: BTreeMap<WarningKind, Vec<&BuildWarning>> = BTreeMap::new();
        for warning in &self.warnings {
            groups.entry(warning.kind()).or_default().push(warning);
        }
        groups
    }

    /// Number of records that were dropped entirely.
    pub fn excluded(&self) -> usize {
        self.records.saturating_sub(self.indexed)
    }
}

/// Per-design hierarchies built from one batch of records.
#[derive(Debug)]
pub struct BomEngine {
    hierarchies: BTreeMap<DesignId, Hierarchy>,
    owners: HashMap<NodeId, DesignId>,
    config: EngineConfig,
    report: BuildReport,
}

impl BomEngine {
    /// Normalizes records and builds a hierarchy for every design in them.
    pub fn build(records: Vec<NodeRecord>, config: EngineConfig) -> Self {
        let start = Instant::now();
        let record_count = records.len();
        let (store, warnings) = NodeStore::from_records(records);
        Self::from_store(store, warnings, record_count, config, start)
    }

    /// Builds from already-normalized nodes.
    pub fn from_nodes(nodes: Vec<AssemblyNode>, config: EngineConfig) -> Self {
        let start = Instant::now();
        let node_count = nodes.len();
        let (store, warnings) = NodeStore::from_nodes(nodes);
        Self::from_store(store, warnings, node_count, config, start)
    }

    fn from_store(
        store: NodeStore,
        mut warnings: Vec<BuildWarning>,
        record_count: usize,
        config: EngineConfig,
        start: Instant,
    ) -> Self {
        let mut hierarchies = BTreeMap::new();
        let mut owners = HashMap::new();

        for (design_id, nodes) in store.into_designs() {
            let mut builder =
                HierarchyBuilder::new(design_id.clone()).with_quantity_mode(config.quantity_mode);
            builder.add_nodes(nodes);
            let hierarchy = builder.build();

            for node in hierarchy.nodes() {
                owners.insert(node.id.clone(), design_id.clone());
            }
            warnings.extend(hierarchy.warnings().iter().cloned());
            hierarchies.insert(design_id, hierarchy);
        }

        warnings.sort_by(|a, b| {
            a.node_id()
                .cmp(b.node_id())
                .then_with(|| a.kind().cmp(&b.kind()))
        });

        let report = BuildReport {
            records: record_count,
            indexed: owners.len(),
            designs: hierarchies.len(),
            warnings,
            build_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            records = report.records,
            indexed = report.indexed,
            designs = report.designs,
            warnings = report.warnings.len(),
            "Built BOM engine"
        );

        Self {
            hierarchies,
            owners,
            config,
            report,
        }
    }

    /// The build report.
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Designs present in the input, sorted.
    pub fn designs(&self) -> impl Iterator<Item = &str> {
        self.hierarchies.keys().map(String::as_str)
    }

    /// The hierarchy of one design, if the input contained it.
    pub fn hierarchy(&self, design_id: &str) -> Option<&Hierarchy> {
        self.hierarchies.get(design_id)
    }

    /// The hierarchy of one design, or an error naming it.
    pub fn require(&self, design_id: &str) -> Result<&Hierarchy> {
        self.hierarchy(design_id)
            .ok_or_else(|| BomError::DesignNotFound(design_id.to_string()))
    }

    /// Depth-0 nodes of a design. Empty for designs with no nodes.
    pub fn roots(&self, design_id: &str) -> Vec<&AssemblyNode> {
        self.hierarchy(design_id)
            .map(Hierarchy::roots)
            .unwrap_or_default()
    }

    /// Direct children of a node in any design.
    pub fn children(&self, id: &str) -> Result<Vec<&AssemblyNode>> {
        self.owner(id)?.children(id)
    }

    /// Ancestor chain of a node in any design.
    pub fn ancestors(&self, id: &str) -> Result<Vec<&AssemblyNode>> {
        self.owner(id)?.ancestors(id)
    }

    /// Child status of a node in any design.
    pub fn child_status(&self, id: &str) -> Result<ChildStatus> {
        self.owner(id)?.child_status(id)
    }

    /// Looks up a navigable node in any design.
    pub fn get(&self, id: &str) -> Option<&AssemblyNode> {
        self.owner(id).ok().and_then(|h| h.get(id))
    }

    /// Aggregate metrics of a design. All zeros for designs with no nodes.
    pub fn summary(&self, design_id: &str) -> BomSummary {
        match self.hierarchy(design_id) {
            Some(hierarchy) => hierarchy.summary(),
            None => BomSummary::empty(design_id, self.config.quantity_mode),
        }
    }

    /// Predicate search with ancestor chains. Empty for unknown designs.
    pub fn search<F>(&self, design_id: &str, predicate: F) -> SearchResult
    where
        F: Fn(&AssemblyNode) -> bool,
    {
        self.hierarchy(design_id)
            .map(|h| h.search(predicate))
            .unwrap_or_default()
    }

    /// Rows to draw for a design given the expanded ids. Orphan subtrees
    /// are included as configured.
    pub fn visible_rows(&self, design_id: &str, expanded: &HashSet<NodeId>) -> Vec<VisibleRow> {
        self.hierarchy(design_id)
            .map(|h| h.visible_rows(expanded, self.config.include_orphans_in_display))
            .unwrap_or_default()
    }

    fn owner(&self, id: &str) -> Result<&Hierarchy> {
        self.owners
            .get(id)
            .and_then(|design_id| self.hierarchies.get(design_id))
            .ok_or_else(|| BomError::NodeNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomtree_core::NodeType;

    fn records() -> Vec<NodeRecord> {
        vec![
            NodeRecord::new("a1", "d1", "Frame", "ASSEMBLY", "1").with_numchild(1),
            NodeRecord::new("a2", "d1", "Plate", "PART", "1/1"),
            NodeRecord::new("b1", "d2", "Frame", "ASSEMBLY", "1").with_numchild(1),
            NodeRecord::new("b2", "d2", "Bolt", "HARDWARE", "1/1").with_quantity(4),
        ]
    }

    #[test]
    fn test_designs_are_separate() {
        let engine = BomEngine::build(records(), EngineConfig::default());

        assert_eq!(engine.designs().collect::<Vec<_>>(), vec!["d1", "d2"]);
        let children = |id: &str| -> Vec<String> {
            engine
                .children(id)
                .unwrap()
                .iter()
                .map(|n| n.id.clone())
                .collect()
        };
        assert_eq!(children("a1"), vec!["a2"]);
        assert_eq!(children("b1"), vec!["b2"]);
        assert_eq!(engine.summary("d2").total_occurrences, 5);
        assert_eq!(engine.report().indexed, 4);
        assert!(engine.report().is_clean());
    }

    #[test]
    fn test_unknown_design_is_empty() {
        let engine = BomEngine::build(records(), EngineConfig::default());

        assert!(engine.roots("d9").is_empty());
        assert_eq!(engine.summary("d9").node_count, 0);
        assert!(engine.search("d9", |_| true).is_empty());
        assert!(engine.visible_rows("d9", &HashSet::new()).is_empty());
        assert!(matches!(
            engine.require("d9"),
            Err(BomError::DesignNotFound(_))
        ));
    }

    #[test]
    fn test_visible_rows_follow_config() {
        let mut input = records();
        input.push(NodeRecord::new("lost", "d1", "Shim", "PART", "7/1"));
        let expanded: HashSet<NodeId> = ["a1".to_string()].into_iter().collect();

        let shown = BomEngine::build(input.clone(), EngineConfig::default());
        let ids: Vec<String> = shown
            .visible_rows("d1", &expanded)
            .into_iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "lost"]);

        let hidden = BomEngine::build(
            input,
            EngineConfig {
                include_orphans_in_display: false,
                ..EngineConfig::default()
            },
        );
        assert_eq!(hidden.visible_rows("d1", &expanded).len(), 2);
    }

    #[test]
    fn test_duplicate_id_counts_as_excluded() {
        let mut input = records();
        input.push(NodeRecord::new("a2", "d1", "Plate", "PART", "1/2"));
        let engine = BomEngine::build(input, EngineConfig::default());
        let report = engine.report();

        assert_eq!(report.excluded(), 1);
        assert_eq!(report.warnings[0].kind(), WarningKind::DuplicateId);
        assert!(report.warnings[0].excludes_node());
        assert_eq!(engine.get("a2").unwrap().path.as_str(), "1/1");
    }

    #[test]
    fn test_unknown_node_is_error() {
        let engine = BomEngine::build(records(), EngineConfig::default());
        assert!(matches!(
            engine.children("zz"),
            Err(BomError::NodeNotFound(_))
        ));
        assert!(engine.get("zz").is_none());
        assert_eq!(engine.get("b2").unwrap().node_type, NodeType::Hardware);
    }

    #[test]
    fn test_report_groups_and_counts_exclusions() {
        let mut input = records();
        input.push(NodeRecord::new("bad", "d1", "Shim", "PART", "1//2"));
        input.push(NodeRecord::new("deep", "d1", "Pin", "PART", "1/1").with_depth(5));
        input.push(NodeRecord::new("odd", "d1", "Weld", "WELD", "2"));
        let engine = BomEngine::build(input, EngineConfig::default());
        let report = engine.report();

        assert_eq!(report.records, 7);
        assert_eq!(report.indexed, 5);
        assert_eq!(report.excluded(), 2);
        let excluding = report.warnings.iter().filter(|w| w.excludes_node()).count();
        assert_eq!(excluding, report.excluded());
        let groups = report.by_kind();
        assert_eq!(groups[&WarningKind::MalformedPath].len(), 1);
        assert_eq!(groups[&WarningKind::DepthMismatch].len(), 1);
        assert_eq!(groups[&WarningKind::UnknownNodeType].len(), 1);
        let ids: Vec<&str> = report.warnings.iter().map(|w| w.node_id()).collect();
        assert_eq!(ids, vec!["bad", "deep", "odd"]);
    }
}
