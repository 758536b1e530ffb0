//! Expression parser.
//!
//! Accepted forms:
//!
//! | JSON | Expr |
//! |------|------|
//! | `3`, `"3"` | `Number` |
//! | `"i"` | `Variable` |
//! | `{"type": "variable", "name": "i"}` | `Variable` |
//! | `{"type": "function", "functionName": "boxesAt", "argument": "2,3"}` | `Query` |
//! | `{"type": "arithmetic", "op": "+", "left": .., "right": ..}` | `Arithmetic` |

use crate::ast::{ArithOp, Expr};
use serde_json::Value;

/// Parse a numeric operand. Returns `None` for values that cannot be an
/// operand (booleans, arrays, empty strings, malformed objects).
///
/// ```rust
/// use botmaze_program::ast::Expr;
/// use botmaze_program::parser::parse_expr;
/// use serde_json::json;
///
/// assert_eq!(parse_expr(&json!("4")), Some(Expr::number(4.0)));
/// assert_eq!(parse_expr(&json!("i")), Some(Expr::variable("i")));
/// assert_eq!(parse_expr(&json!(true)), None);
/// ```
pub fn parse_expr(raw: &Value) -> Option<Expr> {
    match raw {
        Value::Number(n) => n.as_f64().map(Expr::number),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Some(Expr::number(n)),
                _ => Some(Expr::variable(s)),
            }
        }
        Value::Object(obj) => {
            let kind = obj.get("type").and_then(Value::as_str);
            match kind {
                Some("number") | Some("literal") => obj.get("value").and_then(parse_expr),
                Some("variable") => obj
                    .get("name")
                    .or_else(|| obj.get("variable"))
                    .and_then(Value::as_str)
                    .map(Expr::variable),
                Some("arithmetic") => parse_arithmetic(obj),
                Some("function") | Some("query") => parse_query(obj),
                None if obj.contains_key("functionName") => parse_query(obj),
                None if obj.contains_key("op") => parse_arithmetic(obj),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_arithmetic(obj: &serde_json::Map<String, Value>) -> Option<Expr> {
    let op = obj
        .get("op")
        .or_else(|| obj.get("operator"))
        .and_then(Value::as_str)
        .and_then(ArithOp::parse)?;
    let left = obj.get("left").and_then(parse_expr)?;
    let right = obj.get("right").and_then(parse_expr)?;
    Some(Expr::arithmetic(op, left, right))
}

fn parse_query(obj: &serde_json::Map<String, Value>) -> Option<Expr> {
    let name = obj
        .get("functionName")
        .or_else(|| obj.get("name"))
        .and_then(Value::as_str)?
        .to_string();
    let argument = match obj.get("argument").or_else(|| obj.get("target")) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Some(Expr::Query { name, argument })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_arithmetic() {
        let raw = json!({
            "type": "arithmetic", "op": "*",
            "left": { "type": "arithmetic", "op": "+", "left": "i", "right": 1 },
            "right": "2"
        });
        assert_eq!(
            parse_expr(&raw),
            Some(Expr::arithmetic(
                ArithOp::Mul,
                Expr::arithmetic(ArithOp::Add, Expr::variable("i"), Expr::number(1.0)),
                Expr::number(2.0),
            ))
        );
    }

    #[test]
    fn arithmetic_with_missing_operand_is_rejected() {
        let raw = json!({ "type": "arithmetic", "op": "+", "left": 1 });
        assert_eq!(parse_expr(&raw), None);
    }

    #[test]
    fn parses_function_style_variable() {
        let raw = json!({ "functionName": "boxesAt", "argument": "2,3" });
        assert_eq!(
            parse_expr(&raw),
            Some(Expr::Query {
                name: "boxesAt".to_string(),
                argument: Some("2,3".to_string()),
            })
        );
    }
}
