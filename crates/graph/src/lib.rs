//! # botmaze-graph
//!
//! Call graph analysis for loaded botmaze programs.
//!
//! Every `callFunction` block becomes an edge from the calling function (or
//! the top-level `main` list) to the callee. The graph is used by the
//! `check` command to report problems before a program ever runs:
//!
//! - **Unresolved calls**: `callFunction` naming a function that does not exist
//! - **Recursion**: functions that reach themselves, which only terminate
//!   through a condition and otherwise run into the executor's limits
//! - **Unused functions**: definitions no call chain from `main` reaches
//!
//! ## Example
//!
//! ```rust
//! use botmaze_graph::CallGraph;
//!
//! let program = botmaze_program::load(r#"{
//!   "version": "1",
//!   "functions": [
//!     { "name": "hop", "body": [{ "type": "forward" }] },
//!     { "name": "spare", "body": [] }
//!   ],
//!   "actions": [{ "type": "callFunction", "functionName": "hop" }]
//! }"#).unwrap();
//!
//! let graph = CallGraph::from_program(&program).unwrap();
//! let result = graph.validate();
//! assert!(result.is_ok());
//! assert_eq!(result.warnings[0].message(), "Function 'spare' is never called");
//! ```

mod builder;
mod edges;
mod error;
mod nodes;
mod queries;
mod validation;

pub use builder::CallGraphBuilder;
pub use edges::CallEdge;
pub use error::{GraphBuildError, ValidationError};
pub use nodes::CallNode;
pub use queries::QueryResult;
pub use validation::ValidationResult;

use botmaze_program::Program;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A call graph built from a loaded program.
#[derive(Debug)]
pub struct CallGraph {
    /// The underlying directed graph
    graph: DiGraph<CallNode, CallEdge>,

    /// Index of function nodes by name
    functions: HashMap<String, NodeIndex>,

    /// The node standing for the top-level actions
    main: NodeIndex,

    /// Calls whose target could not be found during build
    unresolved_calls: Vec<ValidationError>,
}

impl CallGraph {
    /// Build a call graph from a loaded program.
    pub fn from_program(program: &Program) -> Result<Self, GraphBuildError> {
        CallGraphBuilder::new().build(program)
    }

    /// Get the underlying petgraph for advanced operations.
    pub fn inner(&self) -> &DiGraph<CallNode, CallEdge> {
        &self.graph
    }

    /// Get a node by its index.
    pub fn get_node(&self, index: NodeIndex) -> Option<&CallNode> {
        self.graph.node_weight(index)
    }

    /// Look up a function node by name.
    pub fn get_function(&self, name: &str) -> Option<NodeIndex> {
        self.functions.get(name).copied()
    }

    /// Get the node for the top-level actions.
    pub fn main(&self) -> NodeIndex {
        self.main
    }

    /// Get all function names in the graph.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }

    /// Calls that named a missing function.
    pub fn unresolved_calls(&self) -> &[ValidationError] {
        &self.unresolved_calls
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
