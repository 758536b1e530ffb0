use crate::ast::{ActionNode, Program, StatementKind};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SemanticError {
    pub message: String,
    /// Location in the loaded tree, e.g. `functions.zigzag[2]`.
    pub path: String,
    pub severity: Severity,
    pub hint: Option<String>,
}

pub fn validate_program(program: &Program) -> Vec<SemanticError> {
    let mut errors = Vec::new();

    validate_actions(program, &program.actions, "actions", &mut errors);

    for (name, function) in &program.functions {
        validate_actions(program, &function.body, &format!("functions.{}", name), &mut errors);
    }

    errors
}

fn validate_actions(
    program: &Program,
    actions: &[ActionNode],
    path: &str,
    errors: &mut Vec<SemanticError>,
) {
    // Rule 1: Consecutive Box Actions
    // The executors reject these at run time; flag the ones visible statically.
    for (i, pair) in actions.windows(2).enumerate() {
        let (first, second) = (pair[0].kind(), pair[1].kind());
        if first.is_box_action() && first == second {
            errors.push(SemanticError {
                message: format!("Two {} blocks in a row are not allowed", first),
                path: format!("{}[{}]", path, i + 1),
                severity: Severity::Error,
                hint: Some(match first {
                    StatementKind::PutBox => "Use a single putBox with a larger count".to_string(),
                    _ => "Use a single takeBox with a larger count".to_string(),
                }),
            });
        }
    }

    for (i, action) in actions.iter().enumerate() {
        let here = format!("{}[{}]", path, i);
        match action {
            // Rule 2: Empty While Body
            ActionNode::While { body, .. } if body.is_empty() => {
                errors.push(SemanticError {
                    message: "while loop has an empty body and fails as soon as its condition is true"
                        .to_string(),
                    path: here.clone(),
                    severity: Severity::Warning,
                    hint: Some("Add at least one block inside the loop".to_string()),
                });
            }
            // Rule 3: Zero Range Step
            ActionNode::RepeatRange(lp) if lp.step.as_number() == Some(0.0) => {
                errors.push(SemanticError {
                    message: format!(
                        "repeatRange over '{}' has a step of 0 and never finishes",
                        lp.variable.as_deref().unwrap_or("?")
                    ),
                    path: here.clone(),
                    severity: Severity::Error,
                    hint: None,
                });
            }
            // Rule 4: Undefined Function
            ActionNode::CallFunction { name } if program.function(name).is_none() => {
                errors.push(SemanticError {
                    message: format!("Function '{}' is not defined", name),
                    path: here.clone(),
                    severity: Severity::Error,
                    hint: if program.functions.is_empty() {
                        None
                    } else {
                        Some(format!(
                            "Defined functions: {}",
                            program.functions.keys().cloned().collect::<Vec<_>>().join(", ")
                        ))
                    },
                });
            }
            _ => {}
        }

        for (label, nested) in action.nested_lists() {
            validate_actions(program, nested, &format!("{}.{}", here, label), errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load;

    fn issues(source: &str) -> Vec<SemanticError> {
        validate_program(&load(source).unwrap())
    }

    #[test]
    fn flags_adjacent_put_box() {
        let errors = issues(
            r#"{"version": "1", "actions": [
                {"type": "putBox"}, {"type": "putBox"}
            ]}"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "actions[1]");
        assert_eq!(errors[0].severity, Severity::Error);
    }

    #[test]
    fn separated_box_actions_are_fine() {
        let errors = issues(
            r#"{"version": "1", "actions": [
                {"type": "putBox"}, {"type": "forward"}, {"type": "putBox"},
                {"type": "takeBox"}, {"type": "putBox"}
            ]}"#,
        );
        assert!(errors.is_empty(), "unexpected issues: {:?}", errors);
    }

    #[test]
    fn flags_undefined_function_in_nested_branch() {
        let errors = issues(
            r#"{"version": "1",
                "functions": [{"name": "hop", "body": [{"type": "forward"}]}],
                "actions": [
                  {"type": "if",
                   "condition": {"type": "sensor", "functionName": "hasItem"},
                   "then": [],
                   "else": [{"type": "callFunction", "functionName": "jump"}]}
            ]}"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "actions[0].else[0]");
        assert_eq!(errors[0].hint.as_deref(), Some("Defined functions: hop"));
    }

    #[test]
    fn flags_empty_while_and_zero_step() {
        let errors = issues(
            r#"{"version": "1", "actions": [
                {"type": "while", "condition": {"type": "sensor", "functionName": "hasItem"}, "body": []},
                {"type": "repeatRange", "variable": "i", "from": 1, "to": 3, "step": 0, "body": []}
            ]}"#,
        );
        let severities: Vec<_> = errors.iter().map(|e| e.severity.clone()).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
    }
}
