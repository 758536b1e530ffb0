//! # botmaze-runtime
//!
//! Executors for loaded botmaze programs.
//!
//! Both executors drive the same [`Machine`]: a flat instruction queue in
//! which control blocks are replaced by their resolved children as the
//! cursor reaches them.
//!
//! - [`InteractiveExecutor`] runs one primitive step per host timer, and can
//!   be paused, resumed and stopped between any two steps.
//! - [`Simulator`] runs a program to completion in a single call and rolls
//!   the world back afterwards.
//!
//! ## Quick Start
//!
//! ```rust
//! use botmaze_runtime::{Direction, GridWorld, Position, Simulator, TallyEvaluator};
//!
//! let program = botmaze_program::load(r#"{
//!   "version": "1",
//!   "actions": [
//!     { "type": "forward" },
//!     { "type": "while",
//!       "condition": { "type": "sensor", "functionName": "hasItem" },
//!       "body": [{ "type": "collect" }] }
//!   ]
//! }"#).unwrap();
//!
//! let mut world = GridWorld::new(3, 1)
//!     .with_robot(Position::new(0, 0), Direction::East)
//!     .with_items(Position::new(1, 0), "green", 2);
//!
//! let goal = TallyEvaluator {
//!     collect: [("green".to_string(), 2)].into_iter().collect(),
//!     ..Default::default()
//! };
//!
//! let simulation = Simulator::new(goal).simulate(&program, &mut world);
//! assert!(simulation.outcome.won);
//! assert_eq!(simulation.actions.len(), 3);
//! // the world is untouched
//! assert_eq!(world.inventory.total_collected(), 0);
//! ```
//!
//! ## Module Overview
//!
//! - [`world`] - The [`WorldState`] trait executors act through
//! - [`grid`] - In-memory [`GridWorld`]
//! - [`eval`] - Conditions, expressions and [`ExecutionContext`]
//! - [`sensor`] - Sensor variables and predicates
//! - [`machine`] - The shared expansion engine
//! - [`interactive`] - Timer-driven live execution
//! - [`headless`] - Synchronous, transactional simulation
//! - [`outcome`] - Win/lose evaluation

pub mod action;
pub mod config;
pub mod error;
pub mod eval;
pub mod grid;
pub mod headless;
pub mod interactive;
pub mod machine;
pub mod outcome;
pub mod scheduler;
pub mod sensor;
pub mod world;

pub use action::PrimitiveAction;
pub use config::{ExecutorConfig, Limits};
pub use error::{ExecutionError, ExecutorError};
pub use eval::{Evaluator, ExecutionContext};
pub use grid::{GridSnapshot, GridWorld};
pub use headless::{Simulation, Simulator, Transaction};
pub use interactive::{ExecutorEvent, ExecutorState, ExecutorStatus, InteractiveExecutor};
pub use machine::{Failure, Instruction, Machine};
pub use outcome::{Outcome, OutcomeEvaluator, TallyEvaluator, UsedStatements};
pub use scheduler::{ManualScheduler, Scheduler, TimerId};
pub use world::{Direction, Inventory, Position, TileContents, WorldError, WorldState};
