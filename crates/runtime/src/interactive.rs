//! Live, pausable execution.
//!
//! The [`InteractiveExecutor`] advances one primitive action per timer
//! firing so the host can animate each step. All scheduling goes through a
//! [`Scheduler`]; the executor itself never blocks.
//!
//! ```text
//!            start            pause
//!   Idle ─────────────▶ Running ◀──────▶ Paused
//!    ▲                    │      resume
//!    │ stop               ├──▶ Completed { outcome }
//!    └────────────────────┴──▶ Failed { reason }
//! ```

use crate::action::PrimitiveAction;
use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::machine::Machine;
use crate::outcome::{Outcome, OutcomeEvaluator, UsedStatements};
use crate::scheduler::{Scheduler, TimerId};
use crate::world::WorldState;
use botmaze_program::Program;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ExecutorState {
    Idle,
    Running,
    Paused,
    Completed { outcome: Outcome },
    Failed { reason: String },
}

impl ExecutorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutorState::Completed { .. } | ExecutorState::Failed { .. })
    }
}

/// Snapshot for a host progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorStatus {
    /// A run is in progress, paused or not.
    pub running: bool,
    pub paused: bool,
    pub step_index: usize,
    /// Current queue length; grows as control blocks expand.
    pub total_steps: usize,
}

/// Notifications for the host UI, collected with
/// [`InteractiveExecutor::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ExecutorEvent {
    Started {
        total: usize,
    },
    Step {
        index: usize,
        total: usize,
        action: PrimitiveAction,
    },
    Paused {
        index: usize,
    },
    Resumed {
        index: usize,
    },
    Stopped,
    Finished {
        won: bool,
        message: String,
    },
    Failed {
        reason: String,
        action: Option<PrimitiveAction>,
    },
}

pub struct InteractiveExecutor<W, E, S> {
    world: W,
    evaluator: E,
    scheduler: S,
    config: ExecutorConfig,
    program: Option<Program>,
    machine: Option<Machine>,
    /// The only timer whose firing may run a step.
    pending: Option<TimerId>,
    state: ExecutorState,
    events: Vec<ExecutorEvent>,
}

impl<W, E, S> InteractiveExecutor<W, E, S>
where
    W: WorldState,
    E: OutcomeEvaluator<W>,
    S: Scheduler,
{
    pub fn new(world: W, evaluator: E, scheduler: S) -> Self {
        Self {
            world,
            evaluator,
            scheduler,
            config: ExecutorConfig::default(),
            program: None,
            machine: None,
            pending: None,
            state: ExecutorState::Idle,
            events: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the loaded program. Any run in progress is stopped.
    pub fn load(&mut self, program: Program) {
        self.stop();
        self.program = Some(program);
    }

    pub fn start(&mut self) -> Result<(), ExecutorError> {
        match self.state {
            ExecutorState::Running | ExecutorState::Paused => {
                return Err(ExecutorError::AlreadyRunning)
            }
            ExecutorState::Completed { .. } | ExecutorState::Failed { .. } => {
                return Err(ExecutorError::Finished)
            }
            ExecutorState::Idle => {}
        }
        let program = self.program.as_ref().ok_or(ExecutorError::NoProgram)?;
        if self.world.is_game_over() {
            return Err(ExecutorError::GameOver);
        }

        let machine = Machine::new(program, self.config.limits);
        let total = machine.queue_len();
        tracing::info!(
            program = program.name.as_deref().unwrap_or("<unnamed>"),
            total,
            "run started"
        );
        self.machine = Some(machine);
        self.state = ExecutorState::Running;
        self.events.push(ExecutorEvent::Started { total });
        self.arm(Duration::ZERO);
        Ok(())
    }

    /// Cancel the pending step, keeping the queue position.
    pub fn pause(&mut self) -> Result<(), ExecutorError> {
        if self.state != ExecutorState::Running {
            return Err(ExecutorError::NotRunning);
        }
        self.disarm();
        self.state = ExecutorState::Paused;
        self.events.push(ExecutorEvent::Paused {
            index: self.step_index(),
        });
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), ExecutorError> {
        if self.state != ExecutorState::Paused {
            return Err(ExecutorError::NotPaused);
        }
        self.state = ExecutorState::Running;
        self.events.push(ExecutorEvent::Resumed {
            index: self.step_index(),
        });
        self.arm(self.config.step_delay());
        Ok(())
    }

    /// Cancel the pending step and discard the queue. Safe to call in any
    /// state, any number of times.
    pub fn stop(&mut self) {
        self.disarm();
        self.machine = None;
        if self.state != ExecutorState::Idle {
            tracing::info!("run stopped");
            self.state = ExecutorState::Idle;
            self.events.push(ExecutorEvent::Stopped);
        }
    }

    /// Host callback for a fired timer. Ids other than the pending one are
    /// stale and ignored.
    pub fn on_timer(&mut self, id: TimerId) {
        if self.pending != Some(id) {
            tracing::debug!(timer = id.0, "ignoring stale timer");
            return;
        }
        self.pending = None;
        if self.state == ExecutorState::Running {
            self.step();
        }
    }

    /// Run until the next primitive action, then schedule the following
    /// step, or finish.
    fn step(&mut self) {
        let result = match (self.program.as_ref(), self.machine.as_mut()) {
            (Some(program), Some(machine)) => machine.advance(program, &mut self.world),
            _ => return,
        };

        match result {
            Ok(Some(action)) => {
                let (index, total) = self.progress();
                self.events.push(ExecutorEvent::Step {
                    index,
                    total,
                    action,
                });
                self.arm(self.config.step_delay());
            }
            Ok(None) => self.finish(),
            Err(failure) => {
                let reason = failure.to_string();
                tracing::info!(reason = %reason, "run failed");
                self.state = ExecutorState::Failed {
                    reason: reason.clone(),
                };
                self.events.push(ExecutorEvent::Failed {
                    reason,
                    action: failure.action,
                });
            }
        }
    }

    fn finish(&mut self) {
        let used = self.used().cloned().unwrap_or_default();
        let outcome = self.evaluator.evaluate(&self.world, &used);
        tracing::info!(won = outcome.won, message = %outcome.message, "run finished");
        self.events.push(ExecutorEvent::Finished {
            won: outcome.won,
            message: outcome.message.clone(),
        });
        self.state = ExecutorState::Completed { outcome };
    }

    fn arm(&mut self, delay: Duration) {
        self.disarm();
        self.pending = Some(self.scheduler.schedule(delay));
    }

    fn disarm(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
    }

    fn progress(&self) -> (usize, usize) {
        self.machine
            .as_ref()
            .map(|machine| (machine.cursor(), machine.queue_len()))
            .unwrap_or_default()
    }

    fn step_index(&self) -> usize {
        self.progress().0
    }

    pub fn status(&self) -> ExecutorStatus {
        let (step_index, total_steps) = self.progress();
        ExecutorStatus {
            running: matches!(self.state, ExecutorState::Running | ExecutorState::Paused),
            paused: self.state == ExecutorState::Paused,
            step_index,
            total_steps,
        }
    }

    pub fn state(&self) -> &ExecutorState {
        &self.state
    }

    /// Events since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<ExecutorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Statement kinds used by the current or last run.
    pub fn used(&self) -> Option<&UsedStatements> {
        self.machine.as_ref().map(Machine::used)
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutable access to the world, e.g. to reset a level. Only sound while
    /// no run is in progress.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn into_world(self) -> W {
        self.world
    }
}
