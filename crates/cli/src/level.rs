//! Files the CLI reads besides the program itself.

use anyhow::Context;
use botmaze_program::{ErrorReporter, Program};
use botmaze_runtime::{ExecutorConfig, GridWorld, TallyEvaluator};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A playable level: the starting map and what counts as solving it.
#[derive(Debug, Clone, Deserialize)]
pub struct Level {
    pub world: GridWorld,
    #[serde(default)]
    pub goal: TallyEvaluator,
}

/// Settings for `simulate` and `play`, read from `--config`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub executor: ExecutorConfig,
}

impl RunConfig {
    pub fn read(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => read_json(path),
            None => Ok(Self::default()),
        }
    }
}

pub fn read_level(path: &Path) -> anyhow::Result<Level> {
    read_json(path)
}

/// Load a program file, printing a labelled report for load errors.
pub fn read_program(path: &Path) -> anyhow::Result<Program> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    match botmaze_program::load(&source) {
        Ok(program) => {
            for warning in &program.warnings {
                tracing::warn!(path = %warning.path, "{}", warning.message);
            }
            Ok(program)
        }
        Err(err) => {
            let name = path.display().to_string();
            ErrorReporter::new(name, &source).report_load_error(&err)?;
            Err(err).with_context(|| format!("failed to load {}", path.display()))
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("invalid JSON in {}", path.display()))
}
