//! Executor configuration.
//!
//! Both structs deserialize from partial JSON; missing fields take their
//! defaults.
//!
//! ```rust
//! use botmaze_runtime::ExecutorConfig;
//!
//! let config: ExecutorConfig = serde_json::from_str(r#"{"limits": {"maxSteps": 500}}"#).unwrap();
//! assert_eq!(config.limits.max_steps, 500);
//! assert_eq!(config.limits.max_queue_len, 100_000);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runaway guards for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    /// Instructions processed, control nodes included.
    pub max_steps: usize,
    /// Instructions waiting in the queue at any time.
    pub max_queue_len: usize,
    /// Iterations of a single `repeatRange` activation.
    pub max_range_iterations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_queue_len: 100_000,
            max_range_iterations: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorConfig {
    /// Delay between two primitive steps of a live run.
    pub step_delay_ms: u64,
    pub limits: Limits,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 400,
            limits: Limits::default(),
        }
    }
}

impl ExecutorConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}
