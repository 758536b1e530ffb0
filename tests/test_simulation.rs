//! Headless simulation against the grid world.

use botmaze::load;
use botmaze::program::StatementKind;
use botmaze::runtime::{
    Direction, ExecutionError, GridWorld, Limits, Position, PrimitiveAction, Simulator,
    TallyEvaluator, WorldState,
};
use pretty_assertions::assert_eq;

fn goal_green(n: u32) -> TallyEvaluator {
    TallyEvaluator {
        collect: [("green".to_string(), n)].into_iter().collect(),
        ..Default::default()
    }
}

fn corridor() -> GridWorld {
    GridWorld::new(6, 3).with_robot(Position::new(0, 1), Direction::East)
}

#[test]
fn flat_program_runs_one_action_per_count() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "forward", "count": 3},
            {"type": "turnLeft"},
            {"type": "turnBack", "count": 2},
            {"type": "forward"}
        ]}"#,
    )
    .unwrap();

    let mut world = corridor();
    let sim = Simulator::new(TallyEvaluator::default()).simulate(&program, &mut world);
    assert!(sim.succeeded());
    // turns take no count
    assert_eq!(sim.actions.len(), 3 + 1 + 1 + 1);
    assert_eq!(sim.actions[4], PrimitiveAction::TurnBack);
}

#[test]
fn simulation_is_repeatable_and_leaves_world_untouched() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "forward", "count": 2},
            {"type": "while",
             "condition": {"type": "sensor", "functionName": "hasItem"},
             "body": [{"type": "collect"}]},
            {"type": "forward"}
        ]}"#,
    )
    .unwrap();

    let mut world = corridor().with_items(Position::new(2, 1), "green", 3);
    let before = world.clone();
    let simulator = Simulator::new(goal_green(3));

    let first = simulator.simulate(&program, &mut world);
    let second = simulator.simulate(&program, &mut world);

    assert_eq!(first, second);
    assert!(first.outcome.won);
    assert_eq!(first.actions.len(), 6);
    assert_eq!(world, before);
}

#[test]
fn range_variable_drives_collect_count() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "repeatRange", "variable": "i", "from": 1, "to": 3, "step": 1,
             "body": [{"type": "collect", "count": "i", "color": "green"}]}
        ]}"#,
    )
    .unwrap();

    let mut world = corridor().with_items(Position::new(0, 1), "green", 6);
    let sim = Simulator::new(goal_green(6)).simulate(&program, &mut world);

    assert!(sim.outcome.won, "{}", sim.outcome.message);
    assert_eq!(sim.actions.len(), 6);
    assert!(sim
        .actions
        .iter()
        .all(|a| *a == PrimitiveAction::Collect { colors: vec!["green".to_string()] }));
    assert!(sim.used.contains(StatementKind::RepeatRange));
}

#[test]
fn if_branch_follows_tile_sensor() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "if",
             "condition": {"type": "comparison", "variable": "batteryCountAtTile", "operator": ">", "value": 0},
             "then": [{"type": "collect"}],
             "else": [{"type": "turnLeft"}]}
        ]}"#,
    )
    .unwrap();
    let simulator = Simulator::new(TallyEvaluator::default());

    let mut stocked = corridor().with_items(Position::new(0, 1), "green", 2);
    let sim = simulator.simulate(&program, &mut stocked);
    assert_eq!(sim.actions, vec![PrimitiveAction::Collect { colors: vec![] }]);

    let mut empty = corridor();
    let sim = simulator.simulate(&program, &mut empty);
    assert_eq!(sim.actions, vec![PrimitiveAction::TurnLeft]);
}

#[test]
fn short_collect_fails_with_counts_and_restores() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "forward"},
            {"type": "collect", "count": 5, "colors": ["green"]}
        ]}"#,
    )
    .unwrap();

    let mut world = corridor().with_items(Position::new(1, 1), "green", 3);
    let before = world.clone();
    let sim = Simulator::new(goal_green(3)).simulate(&program, &mut world);

    assert_eq!(
        sim.failure,
        Some(ExecutionError::InsufficientItems {
            requested: 5,
            available: 3,
            colors: vec!["green".to_string()],
        })
    );
    assert!(!sim.outcome.won);
    assert!(sim.outcome.message.contains('5'));
    assert!(sim.outcome.message.contains('3'));
    assert_eq!(world, before);
}

#[test]
fn adjacent_put_box_rejected_across_control_node() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "takeBox", "count": 1},
            {"type": "forward"},
            {"type": "putBox", "count": 1},
            {"type": "while",
             "condition": {"type": "sensor", "functionName": "hasItem"},
             "body": [{"type": "collect"}]},
            {"type": "putBox", "count": 1}
        ]}"#,
    )
    .unwrap();

    let mut world = corridor().with_stack(Position::new(0, 1), 2);
    let sim = Simulator::new(TallyEvaluator::default()).simulate(&program, &mut world);

    assert_eq!(
        sim.failure,
        Some(ExecutionError::ConsecutiveBoxAction {
            kind: StatementKind::PutBox
        })
    );
    assert_eq!(sim.actions.last(), Some(&PrimitiveAction::PutBox));
    assert_eq!(world.inventory().boxes_placed, 0);
}

#[test]
fn unrolled_repeat_satisfies_loop_requirement() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "repeat", "count": 2, "body": [{"type": "forward"}]}
        ]}"#,
    )
    .unwrap();
    let goal = TallyEvaluator {
        required_statements: vec![StatementKind::Repeat],
        ..Default::default()
    };

    let mut world = corridor();
    let sim = Simulator::new(goal).simulate(&program, &mut world);
    assert!(sim.outcome.won, "{}", sim.outcome.message);
}

#[test]
fn missing_loop_requirement_loses() {
    let program = load(r#"{"version": "1", "actions": [{"type": "forward"}]}"#).unwrap();
    let goal = TallyEvaluator {
        required_statements: vec![StatementKind::While],
        ..Default::default()
    };

    let mut world = corridor();
    let sim = Simulator::new(goal).simulate(&program, &mut world);
    assert!(sim.succeeded());
    assert_eq!(
        sim.outcome.message,
        "this level must be solved using a while block"
    );
}

#[test]
fn runaway_while_stops_at_step_limit() {
    let program = load(
        r#"{"version": "1", "actions": [
            {"type": "while",
             "condition": {"type": "comparison", "variable": "itemCount", "operator": "==", "value": 0},
             "body": [{"type": "turnLeft"}]}
        ]}"#,
    )
    .unwrap();

    let limits = Limits {
        max_steps: 50,
        ..Limits::default()
    };
    let mut world = corridor();
    let sim = Simulator::new(TallyEvaluator::default())
        .with_limits(limits)
        .simulate(&program, &mut world);

    assert_eq!(sim.failure, Some(ExecutionError::StepLimitExceeded { limit: 50 }));
    assert_eq!(world.direction(), Direction::East);
}
