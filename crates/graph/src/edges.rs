//! Edge types for the call graph.

use serde::{Deserialize, Serialize};

/// A `callFunction` block from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallEdge {
    /// Called once per pass over the enclosing list
    Calls {
        /// Location of the call, e.g. `actions[2].then[0]`
        path: String,
    },

    /// Called from inside a `while` or `repeatRange` body
    CallsInLoop {
        /// Location of the call
        path: String,
    },
}

impl CallEdge {
    /// Get a human-readable label for this edge type.
    pub fn label(&self) -> &'static str {
        match self {
            CallEdge::Calls { .. } => "calls",
            CallEdge::CallsInLoop { .. } => "calls_in_loop",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            CallEdge::Calls { path } | CallEdge::CallsInLoop { path } => path,
        }
    }
}
