//! Builder for constructing a CallGraph from a loaded program.

use crate::edges::CallEdge;
use crate::error::{GraphBuildError, ValidationError};
use crate::nodes::CallNode;
use crate::CallGraph;
use botmaze_program::{ActionNode, Program};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Builder for constructing a call graph from a program.
pub struct CallGraphBuilder {
    graph: DiGraph<CallNode, CallEdge>,
    functions: HashMap<String, NodeIndex>,
    main: NodeIndex,
    unresolved_calls: Vec<ValidationError>,
}

impl CallGraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let main = graph.add_node(CallNode::Main);
        Self {
            graph,
            functions: HashMap::new(),
            main,
            unresolved_calls: Vec::new(),
        }
    }

    /// Build a CallGraph from a program.
    pub fn build(mut self, program: &Program) -> Result<CallGraph, GraphBuildError> {
        // Phase 1: one node per function
        self.add_functions(program)?;

        // Phase 2: one edge per callFunction block
        let main = self.main;
        self.add_call_edges(main, "main", "actions", &program.actions, false);
        for (name, function) in &program.functions {
            let idx = self.functions[name];
            let prefix = format!("functions[{}].body", name);
            self.add_call_edges(idx, name, &prefix, &function.body, false);
        }

        Ok(CallGraph {
            graph: self.graph,
            functions: self.functions,
            main: self.main,
            unresolved_calls: self.unresolved_calls,
        })
    }

    fn add_functions(&mut self, program: &Program) -> Result<(), GraphBuildError> {
        for (key, function) in &program.functions {
            if key != &function.name {
                return Err(GraphBuildError::NameMismatch {
                    key: key.clone(),
                    name: function.name.clone(),
                });
            }

            let mut size = 0;
            botmaze_program::ast::visit_actions(&function.body, &mut |_| size += 1);

            let idx = self.graph.add_node(CallNode::Function {
                name: function.name.clone(),
                size,
            });
            self.functions.insert(function.name.clone(), idx);
        }
        Ok(())
    }

    fn add_call_edges(
        &mut self,
        caller: NodeIndex,
        caller_name: &str,
        prefix: &str,
        actions: &[ActionNode],
        in_loop: bool,
    ) {
        for (i, action) in actions.iter().enumerate() {
            let path = format!("{}[{}]", prefix, i);

            if let ActionNode::CallFunction { name } = action {
                match self.functions.get(name) {
                    Some(&callee) => {
                        let edge = if in_loop {
                            CallEdge::CallsInLoop { path }
                        } else {
                            CallEdge::Calls { path }
                        };
                        self.graph.add_edge(caller, callee, edge);
                    }
                    None => self.unresolved_calls.push(ValidationError::UnresolvedCall {
                        name: name.clone(),
                        caller: caller_name.to_string(),
                        path,
                    }),
                }
                continue;
            }

            let repeats = matches!(action, ActionNode::While { .. } | ActionNode::RepeatRange(_));
            for (label, list) in action.nested_lists() {
                let nested = format!("{}.{}", path, label);
                self.add_call_edges(caller, caller_name, &nested, list, in_loop || repeats);
            }
        }
    }
}

impl Default for CallGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
