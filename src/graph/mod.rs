//! Core graph data structures

mod edge;
mod export;
mod node;
mod order;
mod reference;
mod relocate;
mod store;


pub use edge::{Edge, EdgeKind};
pub use export::ExportRegistration;
pub use node::{GroupId, Node, NodeId, Properties, PropertyValue};
pub use reference::{Reference, ReferenceScanner};
pub use relocate::Relocation;
pub use store::{GraphError, GraphResult, GraphStore};
