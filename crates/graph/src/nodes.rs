//! Node types for the call graph.

use serde::{Deserialize, Serialize};

/// A node in the call graph: the top-level action list or one function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallNode {
    /// The program's top-level `actions`
    Main,

    /// A user-defined function
    Function {
        /// Function name
        name: String,
        /// Number of nodes in the loaded body, nested ones included
        size: usize,
    },
}

impl CallNode {
    /// Get the display name of this node.
    pub fn name(&self) -> &str {
        match self {
            CallNode::Main => "main",
            CallNode::Function { name, .. } => name,
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, CallNode::Main)
    }
}
