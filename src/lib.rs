//! # botmaze
//!
//! Block-program interpreter for the botmaze robot coding game.
//!
//! ## Features
//!
//! | Feature | Crate | Description |
//! |---------|-------|-------------|
//! | `program` | [`botmaze-program`] | JSON loader, program tree, static lints |
//! | `runtime` | [`botmaze-runtime`] | Interactive and headless executors, grid world |
//! | `graph`   | [`botmaze-graph`]   | Call graph, recursion and unused-function checks |
//!
//! `default = ["full"]` enables all of the above.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! botmaze = "0.1"
//! ```
//!
//! ```rust,ignore
//! use botmaze::runtime::{GridWorld, Simulator, TallyEvaluator};
//!
//! let program = botmaze::load(source).unwrap();
//! let simulation = Simulator::new(TallyEvaluator::default()).simulate(&program, &mut world);
//! println!("{}", simulation.outcome.message);
//! ```

#[cfg(feature = "program")]
pub use botmaze_program as program;

#[cfg(feature = "program")]
pub use botmaze_program::{load, validate_program, ActionNode, LoadError, Program};

#[cfg(feature = "runtime")]
pub use botmaze_runtime as runtime;

#[cfg(feature = "graph")]
pub use botmaze_graph as graph;
