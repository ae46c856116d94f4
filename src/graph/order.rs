//! Topological ordering of the graph

use super::node::{Node, NodeId};
use super::store::{GraphError, GraphResult, GraphStore};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl GraphStore {
    /// Nodes ordered so that every node comes after everything it depends on
    ///
    /// A node depends on the target of every out-edge, whatever its kind:
    /// references and imports order nodes just as structural dependencies do.
    /// Depth-first over out-edges. Unconstrained nodes keep insertion order.
    /// A cycle fails the whole call with no partial result.
    pub fn sorted_nodes(&self) -> GraphResult<Vec<&Node>> {
        let mut successors: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for edge in &self.edges {
            successors.entry(&edge.source).or_default().push(&edge.target);
        }

        let mut marks: HashMap<&NodeId, Mark> = HashMap::with_capacity(self.nodes.len());
        let mut order: Vec<&Node> = Vec::with_capacity(self.nodes.len());

        for root in self.nodes.keys() {
            if marks.contains_key(root) {
                continue;
            }
            // Explicit stack of (node, next successor index) so deep chains
            // don't overflow the call stack.
            let mut stack: Vec<(&NodeId, usize)> = vec![(root, 0)];
            marks.insert(root, Mark::InProgress);

            while let Some((current, cursor)) = stack.last_mut() {
                let next = successors
                    .get(*current)
                    .and_then(|targets| targets.get(*cursor))
                    .copied();
                match next {
                    Some(target) => {
                        *cursor += 1;
                        match marks.get(target) {
                            Some(Mark::Done) => {}
                            Some(Mark::InProgress) => {
                                return Err(GraphError::CycleDetected(target.clone()));
                            }
                            None => {
                                marks.insert(target, Mark::InProgress);
                                stack.push((target, 0));
                            }
                        }
                    }
                    None => {
                        let id = *current;
                        stack.pop();
                        marks.insert(id, Mark::Done);
                        if let Some(node) = self.get_node(id) {
                            order.push(node);
                        }
                    }
                }
            }
        }

        Ok(order)
    }
}
