//! Action block parser.
//!
//! Turns raw action objects into [`ActionNode`]s. A single raw block can
//! produce zero nodes (dropped), one node, or many nodes (an unrolled
//! `repeat`).

use super::conditions::parse_condition;
use super::expressions::parse_expr;
use super::{list_field, LoadContext, MAX_UNROLLED_NODES};
use crate::ast::{ActionNode, ElseIf, Expr, Loop, StatementKind};
use crate::error::LoadError;
use serde_json::{Map, Value};

impl LoadContext {
    /// Parse a list of raw actions found at `path`.
    pub(crate) fn parse_actions(
        &mut self,
        list: &[Value],
        path: &str,
    ) -> Result<Vec<ActionNode>, LoadError> {
        let mut actions = Vec::with_capacity(list.len());
        for (i, raw) in list.iter().enumerate() {
            let here = format!("{}[{}]", path, i);
            actions.extend(self.parse_action(raw, &here)?);
        }
        Ok(actions)
    }

    fn parse_action(&mut self, raw: &Value, path: &str) -> Result<Vec<ActionNode>, LoadError> {
        let Some(obj) = raw.as_object() else {
            self.warn(path, "block is not an object; ignored");
            return Ok(Vec::new());
        };
        let Some(kind) = obj.get("type").and_then(Value::as_str) else {
            self.warn(path, "block has no type; ignored");
            return Ok(Vec::new());
        };

        let node = match kind {
            "forward" | "moveForward" => ActionNode::Forward {
                count: self.count_field(obj, path),
            },
            "turnLeft" => ActionNode::TurnLeft,
            "turnRight" => ActionNode::TurnRight,
            "turnBack" | "turnAround" => ActionNode::TurnBack,
            "collect" => ActionNode::Collect {
                count: self.count_field(obj, path),
                colors: colors_field(obj),
            },
            "putBox" => ActionNode::PutBox {
                count: self.count_field(obj, path),
            },
            "takeBox" => ActionNode::TakeBox {
                count: self.count_field(obj, path),
            },
            "repeat" => return self.parse_repeat(obj, path),
            "repeatRange" => return self.parse_repeat_range(obj, path),
            "if" => match self.parse_if(obj, path)? {
                Some(node) => node,
                None => return Ok(Vec::new()),
            },
            "while" => match self.parse_while(obj, path)? {
                Some(node) => node,
                None => return Ok(Vec::new()),
            },
            "callFunction" => {
                let name = obj
                    .get("functionName")
                    .or_else(|| obj.get("name"))
                    .and_then(Value::as_str);
                match name {
                    Some(name) => ActionNode::CallFunction {
                        name: name.to_string(),
                    },
                    None => {
                        self.warn(path, "callFunction has no functionName; ignored");
                        return Ok(Vec::new());
                    }
                }
            }
            other => {
                self.warn(path, format!("unknown block type '{}'; ignored", other));
                return Ok(Vec::new());
            }
        };

        Ok(vec![node])
    }

    /// `repeat { count, body }`, unrolled here.
    fn parse_repeat(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
    ) -> Result<Vec<ActionNode>, LoadError> {
        let count = match obj.get("count").and_then(static_count) {
            Some(count) => count,
            None => {
                if obj.contains_key("count") {
                    self.warn(path, "repeat count is not a whole number; using 1");
                }
                1
            }
        };
        let body = self.parse_actions(list_field(obj, &["body", "bodyActions"]), &format!("{}.body", path))?;
        self.expand_loop(Loop::times(count, body), StatementKind::Repeat)
    }

    /// `repeatRange { variable, from, to, step, body }`, kept for run time.
    fn parse_repeat_range(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
    ) -> Result<Vec<ActionNode>, LoadError> {
        let Some(variable) = obj.get("variable").and_then(Value::as_str) else {
            self.warn(path, "repeatRange has no variable; ignored");
            return Ok(Vec::new());
        };

        let from = self.bound_field(obj, "from", 1.0, path);
        let to = self.bound_field(obj, "to", 1.0, path);
        let step = self.bound_field(obj, "step", 1.0, path);
        let body = self.parse_actions(list_field(obj, &["body", "bodyActions"]), &format!("{}.body", path))?;

        let lp = Loop {
            variable: Some(variable.to_string()),
            from,
            to,
            step,
            body,
        };
        self.expand_loop(lp, StatementKind::RepeatRange)
    }

    /// Unroll a static loop now, or keep it as a node for run time.
    fn expand_loop(&mut self, lp: Loop, kind: StatementKind) -> Result<Vec<ActionNode>, LoadError> {
        let Some(iterations) = lp.static_iterations() else {
            return Ok(vec![ActionNode::RepeatRange(lp)]);
        };

        self.unrolled.insert(kind);
        if lp.body.is_empty() || iterations == 0 {
            return Ok(Vec::new());
        }

        let produced = iterations.saturating_mul(lp.body.len());
        if iterations > MAX_UNROLLED_NODES {
            return Err(LoadError::ExpansionLimit {
                limit: MAX_UNROLLED_NODES,
            });
        }
        self.unrolled_nodes = self.unrolled_nodes.saturating_add(produced);
        if self.unrolled_nodes > MAX_UNROLLED_NODES {
            return Err(LoadError::ExpansionLimit {
                limit: MAX_UNROLLED_NODES,
            });
        }

        let mut actions = Vec::with_capacity(produced);
        for _ in 0..iterations {
            actions.extend(lp.body.iter().cloned());
        }
        Ok(actions)
    }

    fn parse_if(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
    ) -> Result<Option<ActionNode>, LoadError> {
        let condition_path = format!("{}.condition", path);
        let Some(condition) = obj
            .get("condition")
            .and_then(|raw| parse_condition(raw, &condition_path, self))
        else {
            self.warn(path, "if block has no valid condition; ignored");
            return Ok(None);
        };

        let then_actions =
            self.parse_actions(list_field(obj, &["then", "thenActions"]), &format!("{}.then", path))?;

        let mut else_ifs = Vec::new();
        let clauses = super::ELSE_IF_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for (i, raw_clause) in clauses.iter().enumerate() {
            let clause_path = format!("{}.elseIf[{}]", path, i);
            let Some(clause) = raw_clause.as_object() else {
                self.warn(&clause_path, "elseIf clause is not an object; ignored");
                continue;
            };
            let Some(condition) = clause
                .get("condition")
                .and_then(|raw| parse_condition(raw, &format!("{}.condition", clause_path), self))
            else {
                self.warn(&clause_path, "elseIf clause has no valid condition; ignored");
                continue;
            };
            let then_actions = self.parse_actions(
                list_field(clause, &["then", "thenActions"]),
                &format!("{}.then", clause_path),
            )?;
            else_ifs.push(ElseIf {
                condition,
                then_actions,
            });
        }

        let else_actions =
            self.parse_actions(list_field(obj, &["else", "elseActions"]), &format!("{}.else", path))?;

        Ok(Some(ActionNode::If {
            condition,
            then_actions,
            else_ifs,
            else_actions,
        }))
    }

    fn parse_while(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
    ) -> Result<Option<ActionNode>, LoadError> {
        let condition_path = format!("{}.condition", path);
        let Some(condition) = obj
            .get("condition")
            .and_then(|raw| parse_condition(raw, &condition_path, self))
        else {
            self.warn(path, "while block has no valid condition; ignored");
            return Ok(None);
        };
        let body = self.parse_actions(list_field(obj, &["body", "bodyActions"]), &format!("{}.body", path))?;
        Ok(Some(ActionNode::While { condition, body }))
    }

    /// The `count` of a primitive block. Missing means one.
    fn count_field(&mut self, obj: &Map<String, Value>, path: &str) -> Expr {
        match obj.get("count") {
            None | Some(Value::Null) => Expr::number(1.0),
            Some(raw) => parse_expr(raw).unwrap_or_else(|| {
                self.warn(path, "count is not a number or expression; using 1");
                Expr::number(1.0)
            }),
        }
    }

    fn bound_field(&mut self, obj: &Map<String, Value>, key: &str, default: f64, path: &str) -> Expr {
        match obj.get(key) {
            None | Some(Value::Null) => Expr::number(default),
            Some(raw) => parse_expr(raw).unwrap_or_else(|| {
                self.warn(path, format!("'{}' is not a number or expression; using {}", key, default));
                Expr::number(default)
            }),
        }
    }
}

/// A literal repeat count: a non-negative whole number, possibly written as
/// a string.
fn static_count(raw: &Value) -> Option<usize> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 {
        Some(n as usize)
    } else {
        None
    }
}

/// `color` and `colors` are both accepted; duplicates are dropped.
fn colors_field(obj: &Map<String, Value>) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    let single = obj.get("color").and_then(Value::as_str);
    let many = obj
        .get("colors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for color in single.into_iter().chain(many) {
        let color = color.trim().to_lowercase();
        if !color.is_empty() && !colors.contains(&color) {
            colors.push(color);
        }
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: Value) -> (Vec<ActionNode>, LoadContext) {
        let mut cx = LoadContext::default();
        let actions = cx
            .parse_actions(raw.as_array().unwrap(), "actions")
            .unwrap();
        (actions, cx)
    }

    #[test]
    fn repeat_unrolls_body() {
        let (actions, cx) = parse(json!([
            { "type": "repeat", "count": 3, "body": [{ "type": "forward" }, { "type": "turnLeft" }] }
        ]));
        assert_eq!(actions.len(), 6);
        assert_eq!(actions[1], ActionNode::TurnLeft);
        assert!(cx.unrolled.contains(&StatementKind::Repeat));
    }

    #[test]
    fn repeat_with_invalid_count_runs_once() {
        let (actions, cx) = parse(json!([
            { "type": "repeat", "count": "lots", "body": [{ "type": "forward" }] },
            { "type": "repeat", "count": -2, "body": [{ "type": "turnLeft" }] }
        ]));
        assert_eq!(actions.len(), 2);
        assert_eq!(cx.warnings.len(), 2);
    }

    #[test]
    fn repeat_count_zero_produces_nothing() {
        let (actions, _) = parse(json!([
            { "type": "repeat", "count": 0, "body": [{ "type": "forward" }] }
        ]));
        assert!(actions.is_empty());
    }

    #[test]
    fn repeat_range_is_deferred() {
        let (actions, _) = parse(json!([
            { "type": "repeatRange", "variable": "i", "from": 1, "to": "n", "body": [{ "type": "forward", "count": "i" }] }
        ]));
        match &actions[0] {
            ActionNode::RepeatRange(lp) => {
                assert_eq!(lp.variable.as_deref(), Some("i"));
                assert_eq!(lp.to, Expr::variable("n"));
                assert_eq!(lp.step, Expr::number(1.0));
            }
            other => panic!("expected repeatRange, got {:?}", other),
        }
    }

    #[test]
    fn unknown_blocks_are_dropped_with_warning() {
        let (actions, cx) = parse(json!([
            { "type": "dance" },
            { "type": "turnRight" },
            42
        ]));
        assert_eq!(actions, vec![ActionNode::TurnRight]);
        assert_eq!(cx.warnings.len(), 2);
        assert_eq!(cx.warnings[0].path, "actions[0]");
    }

    #[test]
    fn collect_merges_color_fields() {
        let (actions, _) = parse(json!([
            { "type": "collect", "count": 2, "color": "Green", "colors": ["red", "green"] }
        ]));
        assert_eq!(
            actions[0],
            ActionNode::Collect {
                count: Expr::number(2.0),
                colors: vec!["green".to_string(), "red".to_string()],
            }
        );
    }

    #[test]
    fn expansion_limit_is_enforced() {
        let mut cx = LoadContext::default();
        let raw = json!([
            { "type": "repeat", "count": 1000, "body": [
                { "type": "repeat", "count": 1000, "body": [{ "type": "forward" }] }
            ] }
        ]);
        let err = cx.parse_actions(raw.as_array().unwrap(), "actions").unwrap_err();
        assert!(matches!(err, LoadError::ExpansionLimit { .. }));
    }

    #[test]
    fn huge_repeat_over_nothing_loads_instantly() {
        let (actions, cx) = parse(json!([
            { "type": "repeat", "count": 1e18, "body": [] },
            { "type": "repeat", "count": 1e18, "body": [{ "type": "teleport" }] },
            { "type": "turnLeft" }
        ]));
        assert_eq!(actions, vec![ActionNode::TurnLeft]);
        assert!(cx.unrolled.contains(&StatementKind::Repeat));
    }
}
