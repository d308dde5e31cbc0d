//! Bomtree Graph - Assembly hierarchy reconstruction
//!
//! This crate turns a flat list of materialized-path records into a
//! navigable bill-of-materials tree. It provides O(1) path and child
//! lookups, ancestor chains, subtree rollups and search that keeps the
//! containing assemblies in view.
//!
//! # Architecture
//!
//! Nodes are stored once per design in a petgraph arena, with:
//! - A path index for path, id and ordered child lookups
//! - Containment edges from parent to child
//! - Precomputed subtree rollups
//! - An n-gram index for text search
//!
//! Every structure is immutable after the build. Refreshing a design means
//! building a new hierarchy, see [`HierarchyCache`].
//!
//! # Example
//!
//! ```
//! use bomtree_core::{EngineConfig, NodeRecord};
//! use bomtree_graph::BomEngine;
//!
//! let records = vec![
//!     NodeRecord::new("a", "design-1", "Frame", "ASSEMBLY", "1").with_numchild(2),
//!     NodeRecord::new("b", "design-1", "Bracket", "SUBASSEMBLY", "1/1").with_quantity(2),
//!     NodeRecord::new("c", "design-1", "Bolt", "HARDWARE", "1/2").with_quantity(4),
//! ];
//!
//! let engine = BomEngine::build(records, EngineConfig::default());
//!
//! let roots = engine.roots("design-1");
//! assert_eq!(roots[0].id, "a");
//!
//! let children = engine.children("a").unwrap();
//! assert_eq!(children.len(), 2);
//!
//! let summary = engine.summary("design-1");
//! assert_eq!(summary.total_occurrences, 7);
//! ```

mod builder;
mod cache;
mod engine;
mod hierarchy;
mod index;
mod query;
mod rollup;
mod search_index;
mod store;
mod view;

pub use builder::HierarchyBuilder;
pub use cache::HierarchyCache;
pub use engine::{BomEngine, BuildReport};
pub use hierarchy::{ChildStatus, Hierarchy};
pub use index::{sibling_order, PathIndex};
pub use query::{NodeQuery, SearchResult};
pub use rollup::{BomSummary, Measure, Rollup};
pub use search_index::SearchIndex;
pub use store::NodeStore;
pub use view::{TreeView, VisibleRow};
