//! JSON program loader.
//!
//! Loading happens in three passes over the raw `serde_json::Value`:
//!
//! 1. structural checks on the envelope (`version`, `actions`, `functions`),
//! 2. the function table, so calls can refer to functions declared anywhere,
//! 3. the top-level actions.
//!
//! Raw blocks are counted on the untouched input, before any `repeat` is
//! unrolled. Everything below the envelope is lenient: unknown blocks are
//! dropped with a [`LoadWarning`] instead of failing the load.

mod actions;
mod conditions;
mod expressions;

use crate::ast::{Function, LoadWarning, Program, StatementKind};
use crate::error::LoadError;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub use expressions::parse_expr;

/// Upper bound on the number of nodes produced by unrolling static loops.
pub const MAX_UNROLLED_NODES: usize = 100_000;

/// Keys holding nested action lists, in the order they are visited.
const NESTED_LIST_KEYS: &[&str] = &[
    "body",
    "bodyActions",
    "then",
    "thenActions",
    "else",
    "elseActions",
];

/// Keys holding `elseIf` clause lists.
const ELSE_IF_KEYS: &[&str] = &["elseIf", "elseIfClauses"];

/// Parse a program from JSON source text.
///
/// # Example
///
/// ```rust
/// let source = r#"{
///   "version": "1.0",
///   "actions": [
///     { "type": "repeat", "count": 2, "body": [{ "type": "forward" }] }
///   ]
/// }"#;
///
/// let program = botmaze_program::load(source).unwrap();
/// assert_eq!(program.actions.len(), 2);
/// assert_eq!(program.block_count, 2);
/// ```
pub fn load(source: &str) -> Result<Program, LoadError> {
    let value: Value = serde_json::from_str(source)?;
    load_value(&value)
}

/// Parse a program from an already-decoded JSON value.
pub fn load_value(value: &Value) -> Result<Program, LoadError> {
    let root = value.as_object().ok_or(LoadError::NotAnObject)?;

    let version = match root.get("version") {
        Some(Value::String(v)) => v.clone(),
        Some(_) => {
            return Err(LoadError::InvalidField {
                field: "version",
                expected: "a string",
            })
        }
        None => return Err(LoadError::MissingField { field: "version" }),
    };

    let raw_actions = match root.get("actions") {
        Some(Value::Array(actions)) => actions,
        Some(_) => {
            return Err(LoadError::InvalidField {
                field: "actions",
                expected: "an array",
            })
        }
        None => return Err(LoadError::MissingField { field: "actions" }),
    };

    let name = root
        .get("programName")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut cx = LoadContext::default();
    let mut block_count = count_blocks(raw_actions);

    // Functions first, so the table is complete before any body is used.
    let mut functions: IndexMap<String, Function> = IndexMap::new();
    if let Some(raw_functions) = root.get("functions") {
        let list = raw_functions.as_array().ok_or(LoadError::InvalidField {
            field: "functions",
            expected: "an array",
        })?;

        for (index, raw_function) in list.iter().enumerate() {
            let (function, blocks) = parse_function(raw_function, index, &mut cx)?;
            block_count += blocks;
            if functions.contains_key(&function.name) {
                cx.warn(
                    format!("functions[{}]", index),
                    format!(
                        "function '{}' is defined more than once; the last definition wins",
                        function.name
                    ),
                );
            }
            functions.insert(function.name.clone(), function);
        }
    }

    let actions = cx.parse_actions(raw_actions, "actions")?;

    tracing::debug!(
        program = name.as_deref().unwrap_or("<unnamed>"),
        functions = functions.len(),
        blocks = block_count,
        warnings = cx.warnings.len(),
        "program loaded"
    );

    Ok(Program {
        version,
        name,
        functions,
        actions,
        block_count,
        unrolled: cx.unrolled,
        warnings: cx.warnings,
    })
}

fn parse_function(
    raw: &Value,
    index: usize,
    cx: &mut LoadContext,
) -> Result<(Function, usize), LoadError> {
    let obj = raw.as_object().ok_or_else(|| LoadError::InvalidFunction {
        index,
        reason: "is not an object".to_string(),
    })?;

    let name = match obj.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => {
            return Err(LoadError::InvalidFunction {
                index,
                reason: "has no name".to_string(),
            })
        }
    };

    let raw_body = list_field(obj, &["body", "bodyActions", "actions"]);
    let blocks = count_blocks(raw_body);
    let body = cx.parse_actions(raw_body, &format!("functions.{}", name))?;

    Ok((Function { name, body }, blocks))
}

/// Count type-tagged blocks, recursing through every nested list.
pub(crate) fn count_blocks(list: &[Value]) -> usize {
    list.iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            let own = usize::from(obj.get("type").map_or(false, Value::is_string));
            let nested: usize = NESTED_LIST_KEYS
                .iter()
                .filter_map(|key| obj.get(*key).and_then(Value::as_array))
                .map(|list| count_blocks(list))
                .sum();
            let clauses: usize = ELSE_IF_KEYS
                .iter()
                .filter_map(|key| obj.get(*key).and_then(Value::as_array))
                .flatten()
                .filter_map(Value::as_object)
                .map(|clause| {
                    usize::from(clause.get("type").map_or(false, Value::is_string))
                        + count_blocks(list_field(clause, &["then", "thenActions"]))
                })
                .sum();
            own + nested + clauses
        })
        .sum()
}

/// The first of `keys` holding an array, or an empty slice.
pub(crate) fn list_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Mutable state threaded through a single load.
#[derive(Debug, Default)]
pub(crate) struct LoadContext {
    pub(crate) warnings: Vec<LoadWarning>,
    pub(crate) unrolled: BTreeSet<StatementKind>,
    pub(crate) unrolled_nodes: usize,
}

impl LoadContext {
    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let warning = LoadWarning {
            path: path.into(),
            message: message.into(),
        };
        tracing::warn!(path = %warning.path, "{}", warning.message);
        self.warnings.push(warning);
    }
}
