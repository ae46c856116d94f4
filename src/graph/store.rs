//! GraphStore: the owning aggregate for nodes, edges, and exports

use super::edge::Edge;
use super::export::ExportRegistration;
use super::node::{GroupId, Node, NodeId, PropertyValue};
use super::reference::ReferenceScanner;
use crate::config::GraphConfig;
use crate::intrinsic::IntrinsicScanner;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur in graph operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Address already occupied: {0}")]
    AlreadyExists(NodeId),

    #[error("Edge endpoint missing: {from} -> {to}")]
    DanglingEdge { from: NodeId, to: NodeId },

    #[error("Cycle detected at {0}")]
    CycleDetected(NodeId),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory dependency graph over one or more groups
///
/// Nodes are held behind `Arc` so that [`GraphStore::opposite`] can share
/// them; every mutation goes through copy-on-write, so a shared node is
/// never changed underneath another store. Readers only ever get `&Node`.
#[derive(Debug, Clone)]
pub struct GraphStore {
    pub(super) nodes: IndexMap<NodeId, Arc<Node>>,
    pub(super) edges: Vec<Edge>,
    pub(super) exports: IndexMap<String, ExportRegistration>,
    pub(super) scanner: Arc<dyn ReferenceScanner>,
    pub(super) config: GraphConfig,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// Create an empty store using the intrinsic-function scanner
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Create an empty store with explicit export naming settings
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: Vec::new(),
            exports: IndexMap::new(),
            scanner: Arc::new(IntrinsicScanner),
            config,
        }
    }

    /// Swap in a different reference scanner
    pub fn with_scanner(mut self, scanner: Arc<dyn ReferenceScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn scanner(&self) -> &dyn ReferenceScanner {
        self.scanner.as_ref()
    }

    // === Nodes ===

    /// Add a node. Fails if its id is already taken.
    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeId> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::AlreadyExists(node.id));
        }
        let id = node.id.clone();
        self.nodes.insert(id.clone(), Arc::new(node));
        Ok(id)
    }

    /// Remove a node together with its incident edges and the exports it sources
    pub fn remove_node(&mut self, id: &NodeId) -> GraphResult<Node> {
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;
        self.edges.retain(|e| !e.touches(id));
        self.exports.retain(|_, export| &export.source != id);
        Ok(Arc::unwrap_or_clone(node))
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in insertion order
    pub fn get_all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(Arc::as_ref)
    }

    /// Nodes owned by `group`, in insertion order
    pub fn get_nodes_by_group(&self, group: &GroupId) -> Vec<&Node> {
        self.get_all_nodes()
            .filter(|node| node.group() == group)
            .collect()
    }

    /// Distinct groups in order of first appearance
    pub fn groups(&self) -> Vec<GroupId> {
        let mut groups: Vec<GroupId> = Vec::new();
        for id in self.nodes.keys() {
            if !groups.contains(&id.group) {
                groups.push(id.group.clone());
            }
        }
        groups
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Replace a node's property tree
    pub fn set_properties(&mut self, id: &NodeId, properties: PropertyValue) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;
        Arc::make_mut(node).properties = properties;
        Ok(())
    }

    // === Edges ===

    /// Append an edge. Both endpoints must exist; the cross-group flag is
    /// recomputed from the endpoints' groups.
    pub fn add_edge(&mut self, mut edge: Edge) -> GraphResult<()> {
        if !self.nodes.contains_key(&edge.source) || !self.nodes.contains_key(&edge.target) {
            return Err(GraphError::DanglingEdge {
                from: edge.source,
                to: edge.target,
            });
        }
        edge.refresh_cross_group();
        self.edges.push(edge);
        Ok(())
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving `id`: what the node depends on
    pub fn get_dependencies(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| &e.source == id).collect()
    }

    /// Edges arriving at `id`: what depends on the node
    pub fn get_dependents(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| &e.target == id).collect()
    }

    pub fn get_cross_group_edges(&self) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.cross_group).collect()
    }

    // === Exports ===

    /// Register an export under `name`, replacing any prior registration of
    /// the same name (last write wins). Returns the replaced registration.
    pub fn register_export(
        &mut self,
        name: impl Into<String>,
        source: NodeId,
        output_id: Option<String>,
        value: Option<PropertyValue>,
    ) -> GraphResult<Option<ExportRegistration>> {
        if !self.nodes.contains_key(&source) {
            return Err(GraphError::NotFound(source));
        }
        let name = name.into();
        let registration = ExportRegistration {
            name: name.clone(),
            source,
            output_id,
            value,
        };
        Ok(self.exports.insert(name, registration))
    }

    /// Node that owns the export `name`
    pub fn resolve_export(&self, name: &str) -> Option<&NodeId> {
        self.exports.get(name).map(|export| &export.source)
    }

    pub fn get_export(&self, name: &str) -> Option<&ExportRegistration> {
        self.exports.get(name)
    }

    /// All export registrations in registration order
    pub fn exports(&self) -> impl Iterator<Item = &ExportRegistration> {
        self.exports.values()
    }

    /// Exports whose source node lives in `group`
    pub fn exports_in_group(&self, group: &GroupId) -> Vec<&ExportRegistration> {
        self.exports
            .values()
            .filter(|export| &export.source.group == group)
            .collect()
    }

    /// The export publishing exactly `attribute` (or the whole node) of `node`
    pub fn find_export(&self, node: &NodeId, attribute: Option<&str>) -> Option<&ExportRegistration> {
        self.exports
            .values()
            .find(|export| export.exposes(node, attribute, self.scanner.as_ref()))
    }

    // === Reversal ===

    /// A store over the same nodes with every edge reversed
    ///
    /// Nodes are shared, not copied. Exports are carried over verbatim.
    pub fn opposite(&self) -> GraphStore {
        GraphStore {
            nodes: self.nodes.clone(),
            edges: self.edges.iter().map(Edge::reversed).collect(),
            exports: self.exports.clone(),
            scanner: Arc::clone(&self.scanner),
            config: self.config.clone(),
        }
    }

    /// Whether `other` holds the very same node allocation for `id`
    pub fn shares_node(&self, other: &GraphStore, id: &NodeId) -> bool {
        match (self.nodes.get(id), other.nodes.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
