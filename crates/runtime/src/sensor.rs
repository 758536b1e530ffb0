//! Sensor variables and predicates.
//!
//! Sensors are read from the robot's current tile each time they are
//! evaluated; nothing is cached between steps.
//!
//! | Name | Kind | Value |
//! |------|------|-------|
//! | `batteryCount`, `itemCount`, `batteryCountAtTile` | variable | all available items |
//! | `<color>Count`, `<color>BatteryCount` | variable | items of one color |
//! | `hasItem`, `isItemHere`, `hasBattery` | predicate | any item here |
//! | `is<Color>`, `has<Color>`, `has<Color>Item`, `has<Color>Battery` | predicate | an item of that color here |

use crate::world::TileContents;

const TOTAL_VARIABLES: &[&str] = &[
    "batteryCount",
    "itemCount",
    "batteryCountAtTile",
    "itemCountAtTile",
];

const ANY_ITEM_PREDICATES: &[&str] = &["hasItem", "isItemHere", "hasBattery", "isBatteryHere"];

/// Value of a sensor variable, or `None` if `name` is not one.
pub fn sensor_value(tile: &TileContents, name: &str) -> Option<f64> {
    if TOTAL_VARIABLES.contains(&name) {
        return Some(f64::from(tile.count));
    }
    let color = name
        .strip_suffix("BatteryCount")
        .or_else(|| name.strip_suffix("Count"))?;
    if color.is_empty() || !color.chars().all(char::is_alphabetic) {
        return None;
    }
    Some(f64::from(tile.count_of(&color.to_lowercase())))
}

/// Value of a sensor predicate, or `None` if `name` is not one.
pub fn sensor_predicate(tile: &TileContents, name: &str) -> Option<bool> {
    if ANY_ITEM_PREDICATES.contains(&name) {
        return Some(tile.count > 0);
    }
    let rest = name
        .strip_prefix("has")
        .or_else(|| name.strip_prefix("is"))?;
    // `isGreen`, not `island`.
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    let color = rest
        .strip_suffix("Battery")
        .or_else(|| rest.strip_suffix("Item"))
        .unwrap_or(rest);
    if color.is_empty() || !color.chars().all(char::is_alphabetic) {
        return None;
    }
    Some(tile.count_of(&color.to_lowercase()) > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> TileContents {
        TileContents {
            count: 3,
            color_counts: [("green".to_string(), 2), ("red".to_string(), 1)]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn totals_and_colors() {
        let t = tile();
        assert_eq!(sensor_value(&t, "batteryCountAtTile"), Some(3.0));
        assert_eq!(sensor_value(&t, "greenCount"), Some(2.0));
        assert_eq!(sensor_value(&t, "redBatteryCount"), Some(1.0));
        assert_eq!(sensor_value(&t, "blueCount"), Some(0.0));
        assert_eq!(sensor_value(&t, "i"), None);
        assert_eq!(sensor_value(&t, "Count"), None);
    }

    #[test]
    fn predicates() {
        let t = tile();
        assert_eq!(sensor_predicate(&t, "hasItem"), Some(true));
        assert_eq!(sensor_predicate(&t, "isGreen"), Some(true));
        assert_eq!(sensor_predicate(&t, "hasRedBattery"), Some(true));
        assert_eq!(sensor_predicate(&t, "hasBlueItem"), Some(false));
        assert_eq!(sensor_predicate(&TileContents::default(), "hasItem"), Some(false));
    }

    #[test]
    fn unknown_predicates() {
        let t = tile();
        assert_eq!(sensor_predicate(&t, "island"), None);
        assert_eq!(sensor_predicate(&t, "canMove"), None);
        assert_eq!(sensor_predicate(&t, "has"), None);
    }
}
