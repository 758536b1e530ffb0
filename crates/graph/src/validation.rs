//! Validation and analysis of call graphs.

use crate::error::ValidationError;
use crate::CallGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

/// Result of validating a call graph.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Findings that make the program fail when reached
    pub errors: Vec<ValidationError>,
    /// Findings that may indicate problems
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Check if validation passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any issues (errors or warnings).
    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    /// Get all issues (errors and warnings combined).
    pub fn all_issues(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

impl CallGraph {
    /// Perform full validation of the call graph.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        result.errors.extend(self.unresolved_calls.iter().cloned());

        // Recursion can be guarded by a condition, so it is only a warning.
        result.warnings.extend(self.find_recursion());
        result.warnings.extend(self.find_unused_functions());

        result
    }

    /// Find groups of functions that call back into themselves.
    ///
    /// Each group is reported once, with names in sorted order.
    pub fn find_recursion(&self) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut cycle: Vec<String> = scc
                    .iter()
                    .filter_map(|&idx| self.graph.node_weight(idx))
                    .map(|node| node.name().to_string())
                    .collect();
                cycle.sort();
                ValidationError::Recursion { cycle }
            })
            .collect();

        errors.sort_by(|a, b| a.message().cmp(&b.message()));
        errors
    }

    /// Find functions never reached from the top-level actions.
    pub fn find_unused_functions(&self) -> Vec<ValidationError> {
        let reachable = self.find_reachable_from(self.main);

        let mut unused: Vec<String> = self
            .functions
            .iter()
            .filter(|(_, idx)| !reachable.contains(idx))
            .map(|(name, _)| name.clone())
            .collect();
        unused.sort();

        unused
            .into_iter()
            .map(|name| ValidationError::UnusedFunction { name })
            .collect()
    }

    /// Find all nodes reachable from a starting node.
    pub(crate) fn find_reachable_from(&self, start: NodeIndex) -> HashSet<NodeIndex> {
        let mut reachable = HashSet::new();
        let mut stack = vec![start];

        while let Some(idx) = stack.pop() {
            if reachable.insert(idx) {
                stack.extend(self.graph.neighbors(idx));
            }
        }

        reachable
    }
}
