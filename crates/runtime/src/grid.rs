//! In-memory grid world.
//!
//! A rectangular map with walls, colored collectibles and box stacks. It is
//! deserialized from the `world` section of a level file:
//!
//! ```json
//! {
//!   "width": 5, "height": 5,
//!   "walls": [{"x": 2, "y": 0}],
//!   "robot": {"position": {"x": 0, "y": 0}, "direction": "east"},
//!   "items": [{"position": {"x": 1, "y": 0}, "color": "green"}],
//!   "stacks": [{"position": {"x": 3, "y": 0}, "count": 2}]
//! }
//! ```

use crate::world::{Direction, Inventory, Position, TileContents, WorldError, WorldState};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Robot {
    pub position: Position,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    pub position: Position,
    /// Always lowercase, matching how programs and sensors name colors.
    #[serde(deserialize_with = "lowercase")]
    pub color: String,
    #[serde(default = "available_by_default")]
    pub available: bool,
}

fn available_by_default() -> bool {
    true
}

fn lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|color| color.trim().to_lowercase())
}

/// Boxes piled on one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxStack {
    pub position: Position,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridWorld {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub walls: BTreeSet<Position>,
    pub robot: Robot,
    #[serde(default)]
    pub items: Vec<Collectible>,
    #[serde(default)]
    pub stacks: Vec<BoxStack>,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub game_over: bool,
}

/// Everything a primitive action can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    robot: Robot,
    items: Vec<Collectible>,
    stacks: Vec<BoxStack>,
    inventory: Inventory,
}

impl GridWorld {
    /// An empty map with the robot at the origin facing east.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            walls: BTreeSet::new(),
            robot: Robot {
                position: Position::new(0, 0),
                direction: Direction::East,
            },
            items: Vec::new(),
            stacks: Vec::new(),
            inventory: Inventory::default(),
            game_over: false,
        }
    }

    pub fn with_robot(mut self, position: Position, direction: Direction) -> Self {
        self.robot = Robot {
            position,
            direction,
        };
        self
    }

    pub fn with_wall(mut self, position: Position) -> Self {
        self.walls.insert(position);
        self
    }

    /// Add `count` items of `color` at `position`.
    pub fn with_items(mut self, position: Position, color: &str, count: u32) -> Self {
        for _ in 0..count {
            self.items.push(Collectible {
                position,
                color: color.to_lowercase(),
                available: true,
            });
        }
        self
    }

    pub fn with_stack(mut self, position: Position, count: u32) -> Self {
        self.stacks.push(BoxStack { position, count });
        self
    }

    pub fn contains(&self, position: Position) -> bool {
        (0..self.width).contains(&position.x) && (0..self.height).contains(&position.y)
    }

    /// Boxes currently stacked at `position`.
    pub fn boxes_at(&self, position: Position) -> u32 {
        self.stacks
            .iter()
            .filter(|stack| stack.position == position)
            .map(|stack| stack.count)
            .sum()
    }

    /// Available items anywhere on the map, optionally of one color.
    pub fn items_remaining(&self, color: Option<&str>) -> u32 {
        self.items
            .iter()
            .filter(|item| item.available && color.map_or(true, |c| item.color == c))
            .count() as u32
    }

    fn tile_contents(&self, position: Position) -> TileContents {
        let mut tile = TileContents::default();
        for item in self
            .items
            .iter()
            .filter(|item| item.available && item.position == position)
        {
            tile.count += 1;
            *tile.color_counts.entry(item.color.clone()).or_insert(0) += 1;
        }
        tile
    }
}

impl WorldState for GridWorld {
    type Snapshot = GridSnapshot;

    fn move_forward(&mut self) -> Result<Position, WorldError> {
        let next = self.robot.position.step(self.robot.direction);
        if !self.contains(next) {
            return Err(WorldError::new(format!(
                "cannot move {} to {}: outside the map",
                self.robot.direction, next
            )));
        }
        if self.walls.contains(&next) {
            return Err(WorldError::new(format!(
                "cannot move {} to {}: blocked by a wall",
                self.robot.direction, next
            )));
        }
        self.robot.position = next;
        Ok(next)
    }

    fn turn_left(&mut self) {
        self.robot.direction = self.robot.direction.left();
    }

    fn turn_right(&mut self) {
        self.robot.direction = self.robot.direction.right();
    }

    fn turn_back(&mut self) {
        self.robot.direction = self.robot.direction.back();
    }

    fn collectibles_here(&self) -> TileContents {
        self.tile_contents(self.robot.position)
    }

    fn collect(&mut self, color: Option<&str>) -> Result<String, WorldError> {
        let here = self.robot.position;
        let found = self.items.iter_mut().find(|item| {
            item.available && item.position == here && color.map_or(true, |c| item.color == c)
        });
        match found {
            Some(item) => {
                item.available = false;
                *self.inventory.collected.entry(item.color.clone()).or_insert(0) += 1;
                Ok(item.color.clone())
            }
            None => Err(WorldError::new(match color {
                Some(color) => format!("no {} item to collect at {}", color, here),
                None => format!("no item to collect at {}", here),
            })),
        }
    }

    fn take_box(&mut self) -> Result<(), WorldError> {
        let here = self.robot.position;
        match self
            .stacks
            .iter_mut()
            .find(|stack| stack.position == here && stack.count > 0)
        {
            Some(stack) => {
                stack.count -= 1;
                self.inventory.boxes_carried += 1;
                Ok(())
            }
            None => Err(WorldError::new(format!("no box to take at {}", here))),
        }
    }

    fn put_box(&mut self) -> Result<(), WorldError> {
        let here = self.robot.position;
        if self.inventory.boxes_carried == 0 {
            return Err(WorldError::new(format!(
                "cannot put a box at {}: not carrying any",
                here
            )));
        }
        match self.stacks.iter_mut().find(|stack| stack.position == here) {
            Some(stack) => stack.count += 1,
            None => self.stacks.push(BoxStack {
                position: here,
                count: 1,
            }),
        }
        self.inventory.boxes_carried -= 1;
        self.inventory.boxes_placed += 1;
        Ok(())
    }

    fn position(&self) -> Position {
        self.robot.position
    }

    fn direction(&self) -> Direction {
        self.robot.direction
    }

    fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            robot: self.robot.clone(),
            items: self.items.clone(),
            stacks: self.stacks.clone(),
            inventory: self.inventory.clone(),
        }
    }

    fn restore(&mut self, snapshot: GridSnapshot) {
        self.robot = snapshot.robot;
        self.items = snapshot.items;
        self.stacks = snapshot.stacks;
        self.inventory = snapshot.inventory;
    }

    fn query(&self, name: &str, argument: Option<&str>) -> Option<f64> {
        let value = match name {
            "boxesAt" | "stockAt" => self.boxes_at(Position::parse(argument?)?),
            "boxesCarried" => self.inventory.boxes_carried,
            "boxesPlaced" => self.inventory.boxes_placed,
            "collectedCount" => match argument {
                Some(color) => self.inventory.collected_of(&color.to_lowercase()),
                None => self.inventory.total_collected(),
            },
            "itemsRemaining" => self.items_remaining(argument.map(str::to_lowercase).as_deref()),
            _ => return None,
        };
        Some(f64::from(value))
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }
}
