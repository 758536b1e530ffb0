//! Query operations on the call graph.

use crate::edges::CallEdge;
use crate::CallGraph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Result of a query operation.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// The nodes matching the query
    pub nodes: Vec<NodeIndex>,
}

impl QueryResult {
    /// Check if the query returned any results.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the number of results.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl CallGraph {
    /// Find all nodes that call the given node, once per call site.
    pub fn callers_of(&self, target: NodeIndex) -> QueryResult {
        let nodes = self
            .graph
            .edges_directed(target, Direction::Incoming)
            .map(|e| e.source())
            .collect();

        QueryResult { nodes }
    }

    /// Find all nodes the given node calls, once per call site.
    pub fn callees_of(&self, source: NodeIndex) -> QueryResult {
        let nodes = self
            .graph
            .edges_directed(source, Direction::Outgoing)
            .map(|e| e.target())
            .collect();

        QueryResult { nodes }
    }

    /// Call sites of the given node that sit inside a `while` or
    /// `repeatRange` body.
    pub fn loop_call_sites(&self, target: NodeIndex) -> Vec<&str> {
        self.graph
            .edges_directed(target, Direction::Incoming)
            .filter(|e| matches!(e.weight(), CallEdge::CallsInLoop { .. }))
            .map(|e| e.weight().path())
            .collect()
    }

    /// Every function name reachable from `main`, sorted.
    pub fn reachable_functions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .find_reachable_from(self.main)
            .into_iter()
            .filter_map(|idx| self.graph.node_weight(idx))
            .filter(|node| !node.is_main())
            .map(|node| node.name())
            .collect();
        names.sort();
        names
    }
}
