//! Condition parser.

use super::expressions::parse_expr;
use super::LoadContext;
use crate::ast::{CompareOp, Condition};
use serde_json::Value;

/// Parse a condition object. Returns `None` (after recording a warning) when
/// the condition cannot be understood.
pub(crate) fn parse_condition(raw: &Value, path: &str, cx: &mut LoadContext) -> Option<Condition> {
    let Some(obj) = raw.as_object() else {
        cx.warn(path, "condition is not an object");
        return None;
    };
    let kind = obj.get("type").and_then(Value::as_str).unwrap_or("");

    match kind {
        "comparison" | "variableComparison" | "compare" => {
            let variable = obj.get("variable").and_then(parse_expr);
            let operator = obj
                .get("operator")
                .and_then(Value::as_str)
                .and_then(CompareOp::parse);
            let value = obj.get("value").and_then(parse_expr);
            match (variable, operator, value) {
                (Some(variable), Some(operator), Some(value)) => Some(Condition::Comparison {
                    variable,
                    operator,
                    value,
                }),
                (_, None, _) => {
                    cx.warn(path, "comparison has a missing or unknown operator");
                    None
                }
                _ => {
                    cx.warn(path, "comparison needs both a variable and a value");
                    None
                }
            }
        }
        "and" | "or" => {
            let Some(list) = obj.get("conditions").and_then(Value::as_array) else {
                cx.warn(path, format!("'{}' condition has no conditions list", kind));
                return None;
            };
            let mut conditions = Vec::with_capacity(list.len());
            for (i, sub) in list.iter().enumerate() {
                if let Some(condition) = parse_condition(sub, &format!("{}.conditions[{}]", path, i), cx) {
                    conditions.push(condition);
                }
            }
            Some(if kind == "and" {
                Condition::And { conditions }
            } else {
                Condition::Or { conditions }
            })
        }
        "sensor" | "sensorCheck" => {
            let name = obj
                .get("functionName")
                .or_else(|| obj.get("name"))
                .and_then(Value::as_str);
            let Some(name) = name else {
                cx.warn(path, "sensor condition has no functionName");
                return None;
            };
            let check = obj.get("check").and_then(Value::as_bool).unwrap_or(true);
            Some(Condition::Sensor {
                name: name.to_string(),
                check,
            })
        }
        other => {
            cx.warn(path, format!("unknown condition type '{}'", other));
            None
        }
    }
}
