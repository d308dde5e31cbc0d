//! Bomtree Core - Assembly node model and validation
//!
//! This crate defines the records the engine consumes and the vocabulary
//! it reports in. It knows nothing about trees; see `bomtree-graph` for
//! indexing and navigation.
//!
//! # Example
//!
//! ```
//! use bomtree_core::{AssemblyNode, NodeRecord, NodeType};
//!
//! let record = NodeRecord::new("n1", "design-1", "Gearbox", "ASSEMBLY", "0001")
//!     .with_quantity(2)
//!     .with_mass(4.5);
//!
//! let mut warnings = Vec::new();
//! let node = AssemblyNode::from_record(record, &mut warnings).unwrap();
//!
//! assert_eq!(node.node_type, NodeType::Assembly);
//! assert_eq!(node.occurrence_mass(), Some(9.0));
//! assert!(warnings.is_empty());
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod path;
pub mod warning;

pub use config::{EngineConfig, QuantityMode};
pub use error::{BomError, Result};
pub use node::{AssemblyNode, DesignId, NodeId, NodeRecord, NodeType};
pub use path::{natural_cmp, MaterializedPath, PathDefect};
pub use warning::{BuildWarning, PhysicalProperty, WarningKind};
