//! Assembly node types.
//!
//! A [`NodeRecord`] is what the backend sends: loosely typed, possibly
//! malformed. An [`AssemblyNode`] is the normalized form the index works
//! with. Normalization never fails outright; it reports what it had to
//! change as [`BuildWarning`]s and drops only records whose path is
//! unusable.

use crate::path::MaterializedPath;
use crate::warning::{BuildWarning, PhysicalProperty};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a node record.
pub type NodeId = String;

/// Identifier of the design a node belongs to.
pub type DesignId = String;

/// Classification of a node within the bill of materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Top-level assembly.
    Assembly,
    /// Assembly nested inside another assembly.
    Subassembly,
    /// Manufactured or purchased part.
    Part,
    /// Fasteners and other commodity hardware.
    Hardware,
    /// The backend sent a classification we do not recognize.
    Unknown,
}

impl NodeType {
    /// All known types, in display order.
    pub const ALL: [NodeType; 5] = [
        NodeType::Assembly,
        NodeType::Subassembly,
        NodeType::Part,
        NodeType::Hardware,
        NodeType::Unknown,
    ];

    /// Parses a wire value, ignoring case and `-`, `_` or space separators.
    ///
    /// Returns `None` for values that are not one of the four known types.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        match normalized.as_str() {
            "ASSEMBLY" => Some(Self::Assembly),
            "SUBASSEMBLY" => Some(Self::Subassembly),
            "PART" => Some(Self::Part),
            "HARDWARE" => Some(Self::Hardware),
            _ => None,
        }
    }

    /// Returns the canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assembly => "ASSEMBLY",
            Self::Subassembly => "SUBASSEMBLY",
            Self::Part => "PART",
            Self::Hardware => "HARDWARE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns true for types that are expected to have children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Assembly | Self::Subassembly)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as received from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub design_id: DesignId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub reference_designator: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node_type: String,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    pub depth: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub numchild: u32,
    pub path: String,
}

impl NodeRecord {
    /// Creates a record whose depth is derived from the path.
    ///
    /// Quantity, mass and child count start unset; use the `with_*`
    /// builders to fill them in.
    pub fn new(
        id: impl Into<String>,
        design_id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let depth = path.matches(crate::path::SEPARATOR).count() as u32;
        Self {
            id: id.into(),
            design_id: design_id.into(),
            name: name.into(),
            part_number: None,
            reference_designator: None,
            node_type: node_type.into(),
            quantity: None,
            mass: None,
            volume: None,
            depth,
            numchild: 0,
            path,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_numchild(mut self, numchild: u32) -> Self {
        self.numchild = numchild;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_part_number(mut self, part_number: impl Into<String>) -> Self {
        self.part_number = Some(part_number.into());
        self
    }

    pub fn with_reference_designator(mut self, designator: impl Into<String>) -> Self {
        self.reference_designator = Some(designator.into());
        self
    }
}

/// A normalized component occurrence within one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyNode {
    pub id: NodeId,
    pub design_id: DesignId,
    pub name: String,
    pub part_number: Option<String>,
    pub reference_designator: Option<String>,
    pub node_type: NodeType,
    /// Occurrence count at this position, always at least 1.
    pub quantity: u32,
    /// Mass of a single unit.
    pub mass: Option<f64>,
    /// Volume of a single unit.
    pub volume: Option<f64>,
    /// Declared distance from the root.
    pub depth: u32,
    /// Declared number of direct children.
    pub numchild: u32,
    pub path: MaterializedPath,
}

impl AssemblyNode {
    /// Normalizes a backend record.
    ///
    /// Returns `None` only when the path cannot be parsed. Every other
    /// defect is repaired and reported through `warnings`.
    pub fn from_record(record: NodeRecord, warnings: &mut Vec<BuildWarning>) -> Option<Self> {
        let path = match MaterializedPath::parse(&record.path) {
            Ok(path) => path,
            Err(defect) => {
                warnings.push(BuildWarning::MalformedPath {
                    node_id: record.id,
                    path: record.path,
                    defect,
                });
                return None;
            }
        };

        let node_type = match NodeType::parse(&record.node_type) {
            Some(node_type) => node_type,
            None => {
                warnings.push(BuildWarning::UnknownNodeType {
                    node_id: record.id.clone(),
                    raw: record.node_type.clone(),
                });
                NodeType::Unknown
            }
        };

        let quantity = match record.quantity {
            None => 1,
            Some(q) if q > 0 => match u32::try_from(q) {
                Ok(quantity) => quantity,
                Err(_) => {
                    warnings.push(BuildWarning::InvalidQuantity {
                        node_id: record.id.clone(),
                        raw: q,
                    });
                    u32::MAX
                }
            },
            Some(q) => {
                warnings.push(BuildWarning::InvalidQuantity {
                    node_id: record.id.clone(),
                    raw: q,
                });
                1
            }
        };

        let mass = checked_property(&record.id, PhysicalProperty::Mass, record.mass, warnings);
        let volume = checked_property(
            &record.id,
            PhysicalProperty::Volume,
            record.volume,
            warnings,
        );

        Some(Self {
            id: record.id,
            design_id: record.design_id,
            name: record.name,
            part_number: record.part_number.filter(|p| !p.trim().is_empty()),
            reference_designator: record
                .reference_designator
                .filter(|r| !r.trim().is_empty()),
            node_type,
            quantity,
            mass,
            volume,
            depth: record.depth,
            numchild: record.numchild,
            path,
        })
    }

    /// Returns true if the declared depth agrees with the path.
    pub fn depth_matches_path(&self) -> bool {
        self.depth as usize == self.path.implied_depth()
    }

    /// Mass of all units at this occurrence, if known.
    pub fn occurrence_mass(&self) -> Option<f64> {
        self.mass.map(|m| m * f64::from(self.quantity))
    }

    /// Volume of all units at this occurrence, if known.
    pub fn occurrence_volume(&self) -> Option<f64> {
        self.volume.map(|v| v * f64::from(self.quantity))
    }
}

/// Treats an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn checked_property(
    node_id: &str,
    property: PhysicalProperty,
    value: Option<f64>,
    warnings: &mut Vec<BuildWarning>,
) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Some(v),
        Some(v) => {
            warnings.push(BuildWarning::InvalidPhysicalProperty {
                node_id: node_id.to_string(),
                property,
                raw: v,
            });
            None
        }
        None => None,
    }
}
