//! Integration tests for loading editor-produced programs.

use botmaze_program::{load, ActionNode, CompareOp, Condition, Expr, LoadError, StatementKind};
use pretty_assertions::assert_eq;

#[test]
fn test_repeat_expands_to_count_times_body() {
    let program = load(
        r#"{
        "version": "2.1",
        "actions": [
            { "type": "repeat", "count": 4, "body": [
                { "type": "forward" },
                { "type": "turnRight" },
                { "type": "collect", "color": "red" }
            ]}
        ]
    }"#,
    )
    .unwrap();

    assert_eq!(program.actions.len(), 12);
    assert_eq!(program.block_count, 4);
    assert!(program.unrolled.contains(&StatementKind::Repeat));
    for chunk in program.actions.chunks(3) {
        assert_eq!(chunk[1], ActionNode::TurnRight);
    }
}

#[test]
fn test_nested_repeat_multiplies() {
    let program = load(
        r#"{
        "version": "1",
        "actions": [
            { "type": "repeat", "count": 2, "body": [
                { "type": "repeat", "count": 3, "body": [{ "type": "turnLeft" }] },
                { "type": "forward" }
            ]}
        ]
    }"#,
    )
    .unwrap();

    assert_eq!(program.actions.len(), 8);
    assert_eq!(program.block_count, 4);
}

#[test]
fn test_functions_may_be_called_before_definition_order() {
    let program = load(
        r#"{
        "version": "1",
        "functions": [
            { "name": "outer", "body": [{ "type": "callFunction", "functionName": "inner" }] },
            { "name": "inner", "body": [{ "type": "turnBack" }] }
        ],
        "actions": [{ "type": "callFunction", "functionName": "outer" }]
    }"#,
    )
    .unwrap();

    let names: Vec<_> = program.functions.keys().cloned().collect();
    assert_eq!(names, vec!["outer".to_string(), "inner".to_string()]);
    assert_eq!(program.block_count, 3);
}

#[test]
fn test_if_chain_is_preserved() {
    let program = load(
        r#"{
        "version": "1",
        "actions": [{
            "type": "if",
            "condition": { "type": "variableComparison", "variable": "redCount", "operator": ">=", "value": "2" },
            "thenActions": [{ "type": "collect", "count": 2, "colors": ["red"] }],
            "elseIfClauses": [
                { "condition": { "type": "sensorCheck", "functionName": "isGreen", "check": false },
                  "thenActions": [{ "type": "turnLeft" }] }
            ],
            "elseActions": [{ "type": "forward" }]
        }]
    }"#,
    )
    .unwrap();

    match &program.actions[0] {
        ActionNode::If {
            condition,
            then_actions,
            else_ifs,
            else_actions,
        } => {
            assert_eq!(
                condition,
                &Condition::Comparison {
                    variable: Expr::variable("redCount"),
                    operator: CompareOp::GreaterEqual,
                    value: Expr::number(2.0),
                }
            );
            assert_eq!(then_actions.len(), 1);
            assert_eq!(else_ifs.len(), 1);
            assert_eq!(
                else_ifs[0].condition,
                Condition::Sensor {
                    name: "isGreen".to_string(),
                    check: false
                }
            );
            assert_eq!(else_actions, &vec![ActionNode::Forward { count: Expr::number(1.0) }]);
        }
        other => panic!("expected if, got {:?}", other),
    }
    assert_eq!(program.block_count, 4);
}

#[test]
fn test_unknown_types_count_as_blocks_but_are_dropped() {
    let program = load(
        r#"{
        "version": "1",
        "actions": [
            { "type": "forward" },
            { "type": "jump", "height": 3 },
            { "type": "while", "condition": { "type": "sensor", "functionName": "hasItem" },
              "body": [{ "type": "collect" }, { "type": "teleport" }] }
        ]
    }"#,
    )
    .unwrap();

    assert_eq!(program.block_count, 5);
    assert_eq!(program.actions.len(), 2);
    assert_eq!(program.node_count(), 3);
    let paths: Vec<_> = program.warnings.iter().map(|w| w.path.as_str()).collect();
    assert_eq!(paths, vec!["actions[1]", "actions[2].body[1]"]);
}

#[test]
fn test_function_without_name_is_structural() {
    let err = load(r#"{"version": "1", "functions": [{"body": []}], "actions": []}"#).unwrap_err();
    assert_eq!(
        err,
        LoadError::InvalidFunction {
            index: 0,
            reason: "has no name".to_string()
        }
    );
}

#[test]
fn test_missing_version_is_structural() {
    let err = load(r#"{"actions": []}"#).unwrap_err();
    assert_eq!(err, LoadError::MissingField { field: "version" });
}

#[test]
fn test_duplicate_function_keeps_last() {
    let program = load(
        r#"{
        "version": "1",
        "functions": [
            { "name": "f", "body": [{ "type": "turnLeft" }] },
            { "name": "f", "body": [{ "type": "turnRight" }] }
        ],
        "actions": []
    }"#,
    )
    .unwrap();

    assert_eq!(program.function("f").unwrap().body, vec![ActionNode::TurnRight]);
    assert_eq!(program.warnings.len(), 1);
}

#[test]
fn test_huge_repeat_with_empty_or_dropped_body_loads() {
    let program = load(
        r#"{
        "version": "1",
        "actions": [
            { "type": "repeat", "count": 1e18, "body": [] },
            { "type": "repeat", "count": "1000000000000", "body": [{ "type": "jump" }] },
            { "type": "forward" }
        ]
    }"#,
    )
    .unwrap();

    assert_eq!(program.actions.len(), 1);
    assert_eq!(program.block_count, 4);
    assert!(program.unrolled.contains(&StatementKind::Repeat));
}

#[test]
fn test_huge_repeat_count_hits_expansion_limit() {
    let err = load(
        r#"{
        "version": "1",
        "actions": [{ "type": "repeat", "count": 1e18, "body": [{ "type": "turnLeft" }] }]
    }"#,
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::ExpansionLimit { .. }));
}
