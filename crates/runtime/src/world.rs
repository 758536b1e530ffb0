//! The world the robot acts on.
//!
//! The executors never own game logic: every move, turn and pickup goes
//! through [`WorldState`]. A host game implements it over its own entities;
//! [`crate::grid::GridWorld`] is the in-memory implementation used by the
//! CLI and the tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A tile coordinate. `y` grows downwards, as on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring tile in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Parse `"x,y"`, the argument format of position queries.
    pub fn parse(s: &str) -> Option<Self> {
        let (x, y) = s.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Heading of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub fn left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    pub fn right(self) -> Self {
        self.left().back()
    }

    pub fn back(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}

/// Collectibles still available on one tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileContents {
    /// Total number of available items.
    pub count: u32,
    /// Available items per (lowercase) color.
    pub color_counts: BTreeMap<String, u32>,
}

impl TileContents {
    pub fn count_of(&self, color: &str) -> u32 {
        self.color_counts.get(color).copied().unwrap_or(0)
    }

    /// Items matching any of `colors`; every item when `colors` is empty.
    pub fn matching(&self, colors: &[String]) -> u32 {
        if colors.is_empty() {
            self.count
        } else {
            colors.iter().map(|color| self.count_of(color)).sum()
        }
    }
}

/// What the robot has gathered so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inventory {
    /// Collected items per color.
    pub collected: BTreeMap<String, u32>,
    pub boxes_carried: u32,
    pub boxes_placed: u32,
}

impl Inventory {
    pub fn collected_of(&self, color: &str) -> u32 {
        self.collected.get(color).copied().unwrap_or(0)
    }

    pub fn total_collected(&self) -> u32 {
        self.collected.values().sum()
    }
}

/// A primitive action the world refused, e.g. walking into a wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct WorldError {
    pub message: String,
}

impl WorldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Primitive queries and mutations the executors need from a game world.
///
/// `snapshot` and `restore` must cover everything a primitive action can
/// change (robot pose, inventory, collectible availability, box stacks):
/// the headless simulator relies on them to leave no trace.
pub trait WorldState {
    /// A full copy of the mutable state.
    type Snapshot;

    /// Move one tile ahead and return the new position.
    fn move_forward(&mut self) -> Result<Position, WorldError>;

    fn turn_left(&mut self);
    fn turn_right(&mut self);
    fn turn_back(&mut self);

    /// Available collectibles on the robot's tile.
    fn collectibles_here(&self) -> TileContents;

    /// Pick up one item on the robot's tile, of `color` if given.
    /// Returns the color picked up.
    fn collect(&mut self, color: Option<&str>) -> Result<String, WorldError>;

    fn take_box(&mut self) -> Result<(), WorldError>;
    fn put_box(&mut self) -> Result<(), WorldError>;

    fn position(&self) -> Position;
    fn direction(&self) -> Direction;
    fn inventory(&self) -> &Inventory;

    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Answer a function-style variable such as `boxesAt("2,3")`.
    fn query(&self, _name: &str, _argument: Option<&str>) -> Option<f64> {
        None
    }

    /// True once the level is already won or lost.
    fn is_game_over(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turning_round_trips() {
        for dir in [Direction::North, Direction::East, Direction::South, Direction::West] {
            assert_eq!(dir.left().right(), dir);
            assert_eq!(dir.back().back(), dir);
            assert_eq!(dir.left().left(), dir.back());
        }
    }

    #[test]
    fn position_parse() {
        assert_eq!(Position::parse("2, 3"), Some(Position::new(2, 3)));
        assert_eq!(Position::parse("2"), None);
        assert_eq!(Position::new(1, 1).step(Direction::North), Position::new(1, 0));
    }

    #[test]
    fn tile_matching_colors() {
        let tile = TileContents {
            count: 5,
            color_counts: [("green".to_string(), 3), ("red".to_string(), 2)]
                .into_iter()
                .collect(),
        };
        assert_eq!(tile.matching(&[]), 5);
        assert_eq!(tile.matching(&["green".to_string()]), 3);
        assert_eq!(tile.matching(&["blue".to_string()]), 0);
    }
}
