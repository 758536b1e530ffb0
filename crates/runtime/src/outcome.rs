//! Deciding whether a finished run won the level.

use crate::world::WorldState;
use botmaze_program::{Program, StatementKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Final verdict of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub won: bool,
    pub message: String,
}

impl Outcome {
    pub fn won(message: impl Into<String>) -> Self {
        Self {
            won: true,
            message: message.into(),
        }
    }

    pub fn lost(message: impl Into<String>) -> Self {
        Self {
            won: false,
            message: message.into(),
        }
    }
}

/// Statement kinds a run went through.
///
/// Seeded from [`Program::unrolled`], so a `repeat` that the loader unrolled
/// still counts as used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedStatements(BTreeSet<StatementKind>);

impl UsedStatements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(program: &Program) -> Self {
        Self(program.unrolled.clone())
    }

    /// Returns `true` if `kind` was not recorded before.
    pub fn insert(&mut self, kind: StatementKind) -> bool {
        self.0.insert(kind)
    }

    pub fn contains(&self, kind: StatementKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = StatementKind> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<StatementKind> for UsedStatements {
    fn from_iter<I: IntoIterator<Item = StatementKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decides the outcome once the instruction queue is exhausted.
pub trait OutcomeEvaluator<W: ?Sized> {
    fn evaluate(&self, world: &W, used: &UsedStatements) -> Outcome;
}

impl<W: ?Sized, F> OutcomeEvaluator<W> for F
where
    F: Fn(&W, &UsedStatements) -> Outcome,
{
    fn evaluate(&self, world: &W, used: &UsedStatements) -> Outcome {
        self(world, used)
    }
}

/// Wins when the inventory reaches every target tally and every required
/// statement kind was used.
///
/// Deserialized from the `goal` section of a level file:
///
/// ```json
/// { "collect": { "green": 3 }, "boxesPlaced": 1, "requiredStatements": ["while"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TallyEvaluator {
    /// Minimum number of items to collect, per color.
    pub collect: BTreeMap<String, u32>,
    pub boxes_placed: Option<u32>,
    pub required_statements: Vec<StatementKind>,
}

impl<W: WorldState + ?Sized> OutcomeEvaluator<W> for TallyEvaluator {
    fn evaluate(&self, world: &W, used: &UsedStatements) -> Outcome {
        let inventory = world.inventory();

        for (color, target) in &self.collect {
            let have = inventory.collected_of(color);
            if have < *target {
                return Outcome::lost(format!(
                    "collected {} of {} {} items",
                    have, target, color
                ));
            }
        }

        if let Some(target) = self.boxes_placed {
            if inventory.boxes_placed < target {
                return Outcome::lost(format!(
                    "placed {} of {} boxes",
                    inventory.boxes_placed, target
                ));
            }
        }

        if let Some(missing) = self
            .required_statements
            .iter()
            .find(|kind| !used.contains(**kind))
        {
            return Outcome::lost(format!("this level must be solved using a {} block", missing));
        }

        Outcome::won("level complete")
    }
}
