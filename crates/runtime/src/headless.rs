//! Headless simulation.
//!
//! Runs a program to completion in one call against a world that is rolled
//! back afterwards, whatever happens during the run.

use crate::action::PrimitiveAction;
use crate::config::Limits;
use crate::error::ExecutionError;
use crate::machine::Machine;
use crate::outcome::{Outcome, OutcomeEvaluator, UsedStatements};
use crate::world::WorldState;
use botmaze_program::Program;
use serde::Serialize;
use std::ops::{Deref, DerefMut};

/// Exclusive access to a world that is restored when dropped.
///
/// ```rust
/// use botmaze_runtime::{GridWorld, Transaction, WorldState};
///
/// let mut world = GridWorld::new(3, 1);
/// {
///     let mut tx = Transaction::new(&mut world);
///     tx.move_forward().unwrap();
///     assert_eq!(tx.position().x, 1);
/// }
/// assert_eq!(world.position().x, 0);
/// ```
pub struct Transaction<'w, W: WorldState + ?Sized> {
    world: &'w mut W,
    snapshot: Option<W::Snapshot>,
}

impl<'w, W: WorldState + ?Sized> Transaction<'w, W> {
    pub fn new(world: &'w mut W) -> Self {
        let snapshot = Some(world.snapshot());
        Self { world, snapshot }
    }
}

impl<W: WorldState + ?Sized> Deref for Transaction<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        &*self.world
    }
}

impl<W: WorldState + ?Sized> DerefMut for Transaction<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut *self.world
    }
}

impl<W: WorldState + ?Sized> Drop for Transaction<'_, W> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.world.restore(snapshot);
        }
    }
}

/// Result of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    /// Primitive actions in execution order. When the run failed on a
    /// primitive, that primitive is the last entry.
    pub actions: Vec<PrimitiveAction>,
    pub outcome: Outcome,
    pub used: UsedStatements,
    pub failure: Option<ExecutionError>,
}

impl Simulation {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Synchronous executor for validation and replay.
#[derive(Debug, Clone, Default)]
pub struct Simulator<E> {
    evaluator: E,
    limits: Limits,
}

impl<E> Simulator<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Run `program` to completion or first failure. `world` is left exactly
    /// as it was.
    pub fn simulate<W>(&self, program: &Program, world: &mut W) -> Simulation
    where
        W: WorldState + ?Sized,
        E: OutcomeEvaluator<W>,
    {
        let mut world = Transaction::new(world);
        let mut machine = Machine::new(program, self.limits);
        let mut actions = Vec::new();

        let failure = loop {
            match machine.advance(program, &mut *world) {
                Ok(Some(action)) => actions.push(action),
                Ok(None) => break None,
                Err(failure) => {
                    actions.extend(failure.action);
                    break Some(failure.error);
                }
            }
        };

        // Judge the final state before the transaction rolls it back.
        let outcome = match &failure {
            None => self.evaluator.evaluate(&*world, machine.used()),
            Some(error) => Outcome::lost(error.to_string()),
        };

        tracing::info!(
            program = program.name.as_deref().unwrap_or("<unnamed>"),
            actions = actions.len(),
            steps = machine.steps(),
            won = outcome.won,
            "simulation finished"
        );

        Simulation {
            actions,
            outcome,
            used: machine.into_used(),
            failure,
        }
    }
}
