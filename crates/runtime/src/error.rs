//! Run-time error types.

use crate::world::WorldError;
use botmaze_program::StatementKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure that ends a run.
///
/// Every variant names what was asked for and what was available or
/// allowed, so the message can be shown to the player as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "error", rename_all = "camelCase")]
pub enum ExecutionError {
    #[error("function '{name}' is not defined")]
    UnknownFunction { name: String },

    #[error("while loop condition is true but its body is empty")]
    EmptyWhileBody,

    #[error(
        "cannot collect {requested} {} item(s): only {available} available on this tile",
        describe_colors(.colors)
    )]
    InsufficientItems {
        requested: u32,
        available: u32,
        colors: Vec<String>,
    },

    #[error("two {kind} blocks in a row are not allowed")]
    ConsecutiveBoxAction { kind: StatementKind },

    #[error("repeatRange over '{variable}' has a step of 0 and would never end")]
    ZeroStep { variable: String },

    #[error("repeatRange over '{variable}' would run {iterations} times; at most {limit} are allowed")]
    RangeLimitExceeded {
        variable: String,
        iterations: usize,
        limit: usize,
    },

    #[error("program ran for more than {limit} steps without finishing")]
    StepLimitExceeded { limit: usize },

    #[error("program expanded to more than {limit} pending instructions")]
    QueueLimitExceeded { limit: usize },

    #[error(transparent)]
    World(#[from] WorldError),
}

fn describe_colors(colors: &[String]) -> String {
    if colors.is_empty() {
        "matching".to_string()
    } else {
        colors.join(" or ")
    }
}

/// Misuse of the interactive executor's control API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("the program is already running")]
    AlreadyRunning,

    #[error("no program is loaded")]
    NoProgram,

    #[error("the game is already over")]
    GameOver,

    #[error("the run has finished; stop it before starting again")]
    Finished,

    #[error("the program is not running")]
    NotRunning,

    #[error("the program is not paused")]
    NotPaused,
}
