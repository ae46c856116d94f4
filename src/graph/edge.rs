//! Edge representation: typed relationships between nodes

use super::node::NodeId;
use serde::{Deserialize, Serialize};

/// Closed set of relationship kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Explicit ordering hint, carries no data
    StructuralDependency,
    /// Reference to the whole target node
    ValueReference,
    /// Reference to a named attribute of the target
    AttributeReference,
    /// Cross-group consumption of a published export
    ImportedValue,
    /// Link from a materialized export artifact to its source node
    ExportLink,
}

impl EdgeKind {
    /// Whether the edge carries a value (as opposed to pure ordering)
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Self::ValueReference | Self::AttributeReference | Self::ImportedValue
        )
    }

    /// The in-group reference kind for an optional attribute
    pub fn local_reference(attribute: Option<&str>) -> Self {
        if attribute.is_some() {
            Self::AttributeReference
        } else {
            Self::ValueReference
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::StructuralDependency => "STRUCTURAL_DEPENDENCY",
            Self::ValueReference => "VALUE_REFERENCE",
            Self::AttributeReference => "ATTRIBUTE_REFERENCE",
            Self::ImportedValue => "IMPORTED_VALUE",
            Self::ExportLink => "EXPORT_LINK",
        };
        f.write_str(label)
    }
}

/// A directed edge. The source depends on (or refers to) the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    /// True when the endpoints live in different groups. Always true for
    /// `ImportedValue`.
    pub cross_group: bool,
    /// Attribute name for attribute references and imports of an attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Edge {
    /// Create an edge; the cross-group flag is derived from the endpoints.
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        let cross_group = kind == EdgeKind::ImportedValue || source.group != target.group;
        Self {
            source,
            target,
            kind,
            cross_group,
            attribute: None,
        }
    }

    /// Set the referenced attribute
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether either endpoint is `id`
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    /// Recompute the cross-group flag from the current endpoint groups
    pub(crate) fn refresh_cross_group(&mut self) {
        self.cross_group =
            self.kind == EdgeKind::ImportedValue || self.source.group != self.target.group;
    }

    /// The same edge with source and target swapped
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}", self.source, self.kind)?;
        if let Some(attribute) = &self.attribute {
            write!(f, " .{}", attribute)?;
        }
        write!(f, "]-> {}", self.target)?;
        if self.cross_group {
            write!(f, " (cross-group)")?;
        }
        Ok(())
    }
}
