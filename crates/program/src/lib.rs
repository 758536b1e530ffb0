//! # botmaze-program
//!
//! Program model and JSON loader for the botmaze robot coding game.
//!
//! The block editor serializes a player's program as a JSON action tree.
//! This crate validates that tree, builds the function table, unrolls static
//! `repeat` blocks, and produces a typed [`Program`] for the executors in
//! `botmaze-runtime`.
//!
//! ## Quick Start
//!
//! ```rust
//! use botmaze_program::{load, ActionNode};
//!
//! let source = r#"{
//!   "version": "1.0",
//!   "programName": "first steps",
//!   "functions": [
//!     { "name": "hop", "body": [{ "type": "forward", "count": 2 }] }
//!   ],
//!   "actions": [
//!     { "type": "callFunction", "functionName": "hop" },
//!     { "type": "turnLeft" }
//!   ]
//! }"#;
//!
//! let program = load(source).unwrap();
//! assert_eq!(program.name.as_deref(), Some("first steps"));
//! assert!(program.function("hop").is_some());
//! assert_eq!(program.actions[1], ActionNode::TurnLeft);
//! assert_eq!(program.block_count, 3);
//! ```
//!
//! ## Program Format
//!
//! | Block | Fields |
//! |-------|--------|
//! | `forward` | `count` |
//! | `turnLeft`, `turnRight`, `turnBack` | |
//! | `collect` | `count`, `color` / `colors` |
//! | `putBox`, `takeBox` | `count` |
//! | `repeat` | `count`, `body` |
//! | `repeatRange` | `variable`, `from`, `to`, `step`, `body` |
//! | `if` | `condition`, `then`, `elseIf: [{condition, then}]`, `else` |
//! | `while` | `condition`, `body` |
//! | `callFunction` | `functionName` |
//!
//! ## Module Overview
//!
//! - [`ast`] - Typed program tree
//! - [`parser`] - JSON loader
//! - [`validation`] - Static lints over a loaded program
//! - [`error`] - Load errors and pretty reporting via ariadne
//!
//! ## Feature Flags
//!
//! - `wasm` - WebAssembly bindings for the browser-based block editor

pub mod ast;
pub mod error;
pub mod parser;
pub mod validation;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use ast::{
    ActionNode, ArithOp, CompareOp, Condition, ElseIf, Expr, Function, LoadWarning, Loop, Program,
    StatementKind,
};
pub use error::{ErrorReporter, LoadError};
pub use parser::{load, load_value};
pub use validation::{validate_program, SemanticError, Severity};
