//! Stackgraph: dependency graph IR for declarative infrastructure templates
//!
//! Parses one or more templates into a mutable graph, lets resources be
//! moved between groups (stacks) or renamed while keeping every reference
//! valid, and regenerates templates from the result.
//!
//! # Core Concepts
//!
//! - **Groups**: one deployable template each
//! - **Nodes**: declared resources, identified by group and local name
//! - **Edges**: ordering hints, value and attribute references, and
//!   imports of values exported by another group
//! - **Exports**: named values a group publishes for other groups to import
//!
//! # Example
//!
//! ```
//! use stackgraph::{Edge, EdgeKind, GraphStore, Node, NodeId};
//!
//! let mut store = GraphStore::new();
//! let topic = store.add_node(Node::new(NodeId::new("infra", "Topic"), "AWS::SNS::Topic")).unwrap();
//! let sub = store
//!     .add_node(Node::new(NodeId::new("infra", "Subscription"), "AWS::SNS::Subscription"))
//!     .unwrap();
//! store.add_edge(Edge::new(sub.clone(), topic, EdgeKind::ValueReference)).unwrap();
//!
//! store.relocate(&sub, &NodeId::new("services", "Subscription")).unwrap();
//! assert_eq!(store.exports().count(), 1);
//! ```

pub mod config;
pub mod document;
mod graph;
pub mod intrinsic;

pub use config::{ConfigError, GraphConfig};
pub use graph::{
    Edge, EdgeKind, ExportRegistration, GraphError, GraphResult, GraphStore, GroupId, Node,
    NodeId, Properties, PropertyValue, Reference, ReferenceScanner, Relocation,
};
pub use intrinsic::IntrinsicScanner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
