use crate::world::{WorldError, WorldState};
use botmaze_program::StatementKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit world operation. A `forward` node with `count: 3` runs as three
/// `Forward` actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PrimitiveAction {
    Forward,
    TurnLeft,
    TurnRight,
    TurnBack,
    /// Pick up one item of any of `colors` (any color when empty).
    Collect {
        colors: Vec<String>,
    },
    PutBox,
    TakeBox,
}

impl PrimitiveAction {
    pub fn kind(&self) -> StatementKind {
        match self {
            PrimitiveAction::Forward => StatementKind::Forward,
            PrimitiveAction::TurnLeft => StatementKind::TurnLeft,
            PrimitiveAction::TurnRight => StatementKind::TurnRight,
            PrimitiveAction::TurnBack => StatementKind::TurnBack,
            PrimitiveAction::Collect { .. } => StatementKind::Collect,
            PrimitiveAction::PutBox => StatementKind::PutBox,
            PrimitiveAction::TakeBox => StatementKind::TakeBox,
        }
    }

    /// Perform the action on `world`.
    pub fn apply<W: WorldState + ?Sized>(&self, world: &mut W) -> Result<(), WorldError> {
        match self {
            PrimitiveAction::Forward => world.move_forward().map(|_| ()),
            PrimitiveAction::TurnLeft => {
                world.turn_left();
                Ok(())
            }
            PrimitiveAction::TurnRight => {
                world.turn_right();
                Ok(())
            }
            PrimitiveAction::TurnBack => {
                world.turn_back();
                Ok(())
            }
            PrimitiveAction::Collect { colors } => {
                // First listed color present on the tile.
                let tile = world.collectibles_here();
                let color = colors
                    .iter()
                    .find(|color| tile.count_of(color) > 0)
                    .or_else(|| colors.first());
                world.collect(color.map(String::as_str)).map(|_| ())
            }
            PrimitiveAction::PutBox => world.put_box(),
            PrimitiveAction::TakeBox => world.take_box(),
        }
    }
}

impl fmt::Display for PrimitiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveAction::Collect { colors } if !colors.is_empty() => {
                write!(f, "collect({})", colors.join("|"))
            }
            other => f.write_str(other.kind().tag()),
        }
    }
}
