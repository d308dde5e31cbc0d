//! Data-integrity warnings collected while building an index.
//!
//! None of these abort a build. The engine always returns a best-effort
//! hierarchy plus the list of warnings explaining what it had to skip,
//! detach or substitute.

use crate::path::PathDefect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical property a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalProperty {
    Mass,
    Volume,
}

impl fmt::Display for PhysicalProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mass => write!(f, "mass"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

/// A recoverable problem found in the input records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildWarning {
    /// The path string could not be parsed. The node is excluded.
    MalformedPath {
        node_id: String,
        path: String,
        defect: PathDefect,
    },

    /// Declared depth disagrees with the path. The node is excluded.
    DepthMismatch {
        node_id: String,
        path: String,
        declared: u32,
        implied: usize,
    },

    /// Parent path is absent from the set. The node heads a detached subtree.
    Orphan {
        node_id: String,
        path: String,
        missing_parent: String,
    },

    /// Fewer children present than `numchild` declares.
    PartialSubtree {
        node_id: String,
        declared: u32,
        present: usize,
    },

    /// More children present than `numchild` declares.
    ChildCountMismatch {
        node_id: String,
        declared: u32,
        present: usize,
    },

    /// `node_type` is not a known classification; mapped to `UNKNOWN`.
    UnknownNodeType { node_id: String, raw: String },

    /// Quantity was zero or negative (treated as 1), or too large to
    /// represent (clamped).
    InvalidQuantity { node_id: String, raw: i64 },

    /// Negative or non-finite mass/volume; treated as missing.
    InvalidPhysicalProperty {
        node_id: String,
        property: PhysicalProperty,
        raw: f64,
    },

    /// The same id appeared more than once. Only one record is kept.
    DuplicateId {
        node_id: String,
        kept_path: String,
        dropped_path: String,
    },

    /// Two nodes of one design share a path. Only one node is kept.
    DuplicatePath {
        path: String,
        kept_id: String,
        dropped_id: String,
    },
}

/// Coarse classification of warnings, used for grouping in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MalformedPath,
    DepthMismatch,
    Orphan,
    PartialSubtree,
    ChildCountMismatch,
    UnknownNodeType,
    InvalidQuantity,
    InvalidPhysicalProperty,
    DuplicateId,
    DuplicatePath,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedPath => "malformed_path",
            Self::DepthMismatch => "depth_mismatch",
            Self::Orphan => "orphan",
            Self::PartialSubtree => "partial_subtree",
            Self::ChildCountMismatch => "child_count_mismatch",
            Self::UnknownNodeType => "unknown_node_type",
            Self::InvalidQuantity => "invalid_quantity",
            Self::InvalidPhysicalProperty => "invalid_physical_property",
            Self::DuplicateId => "duplicate_id",
            Self::DuplicatePath => "duplicate_path",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BuildWarning {
    /// The coarse kind of this warning.
    pub fn kind(&self) -> WarningKind {
        match self {
            Self::MalformedPath { .. } => WarningKind::MalformedPath,
            Self::DepthMismatch { .. } => WarningKind::DepthMismatch,
            Self::Orphan { .. } => WarningKind::Orphan,
            Self::PartialSubtree { .. } => WarningKind::PartialSubtree,
            Self::ChildCountMismatch { .. } => WarningKind::ChildCountMismatch,
            Self::UnknownNodeType { .. } => WarningKind::UnknownNodeType,
            Self::InvalidQuantity { .. } => WarningKind::InvalidQuantity,
            Self::InvalidPhysicalProperty { .. } => WarningKind::InvalidPhysicalProperty,
            Self::DuplicateId { .. } => WarningKind::DuplicateId,
            Self::DuplicatePath { .. } => WarningKind::DuplicatePath,
        }
    }

    /// The id of the node the warning is about.
    ///
    /// For duplicate paths this is the node that was dropped.
    pub fn node_id(&self) -> &str {
        match self {
            Self::MalformedPath { node_id, .. }
            | Self::DepthMismatch { node_id, .. }
            | Self::Orphan { node_id, .. }
            | Self::PartialSubtree { node_id, .. }
            | Self::ChildCountMismatch { node_id, .. }
            | Self::UnknownNodeType { node_id, .. }
            | Self::InvalidQuantity { node_id, .. }
            | Self::InvalidPhysicalProperty { node_id, .. }
            | Self::DuplicateId { node_id, .. } => node_id,
            Self::DuplicatePath { dropped_id, .. } => dropped_id,
        }
    }

    /// Returns true if the warned-about node was left out of the hierarchy.
    pub fn excludes_node(&self) -> bool {
        matches!(
            self,
            Self::MalformedPath { .. }
                | Self::DepthMismatch { .. }
                | Self::DuplicateId { .. }
                | Self::DuplicatePath { .. }
        )
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPath {
                node_id,
                path,
                defect,
            } => write!(f, "node {node_id}: malformed path '{path}' ({defect})"),
            Self::DepthMismatch {
                node_id,
                path,
                declared,
                implied,
            } => write!(
                f,
                "node {node_id}: depth {declared} does not match path '{path}' (expected {implied})"
            ),
            Self::Orphan {
                node_id,
                path,
                missing_parent,
            } => write!(
                f,
                "node {node_id}: parent '{missing_parent}' of '{path}' is missing"
            ),
            Self::PartialSubtree {
                node_id,
                declared,
                present,
            } => write!(
                f,
                "node {node_id}: {present} of {declared} declared children present"
            ),
            Self::ChildCountMismatch {
                node_id,
                declared,
                present,
            } => write!(
                f,
                "node {node_id}: {present} children present but only {declared} declared"
            ),
            Self::UnknownNodeType { node_id, raw } => {
                write!(f, "node {node_id}: unknown node type '{raw}'")
            }
            Self::InvalidQuantity { node_id, raw } => {
                let used = if *raw > 0 { u32::MAX } else { 1 };
                write!(f, "node {node_id}: invalid quantity {raw}, using {used}")
            }
            Self::InvalidPhysicalProperty {
                node_id,
                property,
                raw,
            } => write!(f, "node {node_id}: invalid {property} {raw}, ignored"),
            Self::DuplicateId {
                node_id,
                kept_path,
                dropped_path,
            } => write!(
                f,
                "node {node_id}: duplicate id, kept '{kept_path}', dropped '{dropped_path}'"
            ),
            Self::DuplicatePath {
                path,
                kept_id,
                dropped_id,
            } => write!(
                f,
                "path '{path}': shared by {kept_id} and {dropped_id}, dropped {dropped_id}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_node_id() {
        let warning = BuildWarning::PartialSubtree {
            node_id: "n1".to_string(),
            declared: 2,
            present: 1,
        };
        assert_eq!(warning.kind(), WarningKind::PartialSubtree);
        assert_eq!(warning.node_id(), "n1");
        assert!(!warning.excludes_node());

        let warning = BuildWarning::DuplicatePath {
            path: "1/2".to_string(),
            kept_id: "a".to_string(),
            dropped_id: "b".to_string(),
        };
        assert_eq!(warning.node_id(), "b");
        assert!(warning.excludes_node());
    }

    #[test]
    fn test_duplicate_id_excludes_dropped_record() {
        let warning = BuildWarning::DuplicateId {
            node_id: "x".to_string(),
            kept_path: "1/1".to_string(),
            dropped_path: "1/2".to_string(),
        };
        assert!(warning.excludes_node());
    }

    #[test]
    fn test_display_oversized_quantity() {
        let warning = BuildWarning::InvalidQuantity {
            node_id: "n1".to_string(),
            raw: 5_000_000_000,
        };
        assert_eq!(
            warning.to_string(),
            format!("node n1: invalid quantity 5000000000, using {}", u32::MAX)
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let warning = BuildWarning::Orphan {
            node_id: "n9".to_string(),
            path: "7/3".to_string(),
            missing_parent: "7".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "orphan");
        assert_eq!(json["missing_parent"], "7");
    }

    #[test]
    fn test_display() {
        let warning = BuildWarning::DepthMismatch {
            node_id: "n2".to_string(),
            path: "1/2".to_string(),
            declared: 3,
            implied: 1,
        };
        assert_eq!(
            warning.to_string(),
            "node n2: depth 3 does not match path '1/2' (expected 1)"
        );
    }
}
