//! Error types for graph building and validation.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when building a call graph from a program.
#[derive(Debug, Error)]
pub enum GraphBuildError {
    /// A function table entry whose key differs from the function's name
    #[error("Function registered as '{key}' is named '{name}'")]
    NameMismatch { key: String, name: String },
}

/// Findings about a program's function calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    /// A `callFunction` names a function that does not exist
    UnresolvedCall {
        /// The called name
        name: String,
        /// The calling function, or `main`
        caller: String,
        /// Location of the call
        path: String,
    },

    /// Functions that call themselves, directly or through each other
    Recursion {
        /// The functions involved
        cycle: Vec<String>,
    },

    /// A function that no call chain from the top-level actions reaches
    UnusedFunction {
        /// The function name
        name: String,
    },
}

impl ValidationError {
    /// Get a human-readable error message.
    pub fn message(&self) -> String {
        match self {
            ValidationError::UnresolvedCall { name, caller, path } => {
                format!("Call to undefined function '{}' in {} at {}", name, caller, path)
            }
            ValidationError::Recursion { cycle } if cycle.len() == 1 => {
                format!("Function '{}' calls itself", cycle[0])
            }
            ValidationError::Recursion { cycle } => {
                format!("Functions call each other in a cycle: {}", cycle.join(" -> "))
            }
            ValidationError::UnusedFunction { name } => {
                format!("Function '{}' is never called", name)
            }
        }
    }

    /// Check if this finding makes the program fail at run time.
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationError::UnresolvedCall { .. })
    }
}
