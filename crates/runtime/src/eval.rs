//! Condition and expression evaluation.
//!
//! Evaluation never fails: a value that cannot be resolved is `None`, and a
//! comparison involving `None` is `false`.

use crate::sensor::{sensor_predicate, sensor_value};
use crate::world::WorldState;
use botmaze_program::{ArithOp, CompareOp, Condition, Expr};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// Execution Context
// ============================================================================

/// Loop-variable bindings visible to one instruction.
///
/// Each `repeatRange` iteration gets a child context; spliced children carry
/// their context with them, so a binding lives exactly as long as the
/// instructions that can see it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    bindings: IndexMap<String, f64>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.bindings.get(name).copied()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: f64) {
        self.bindings.insert(name.into(), value);
    }

    /// A copy of this context with one more binding, shadowing any outer
    /// binding of the same name.
    pub fn with_binding(&self, name: &str, value: f64) -> Self {
        let mut child = self.clone();
        child.bind(name, value);
        child
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// One side of a comparison after resolution.
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Number(f64),
    Text(String),
    Missing,
}

/// Evaluates conditions and expressions against a world and a context.
pub struct Evaluator<'a, W: ?Sized> {
    world: &'a W,
    context: &'a ExecutionContext,
}

impl<'a, W: WorldState + ?Sized> Evaluator<'a, W> {
    pub fn new(world: &'a W, context: &'a ExecutionContext) -> Self {
        Self { world, context }
    }

    pub fn evaluate(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Comparison {
                variable,
                operator,
                value,
            } => compare(
                *operator,
                &self.operand(variable, false),
                &self.operand(value, true),
            ),
            Condition::And { conditions } => conditions.iter().all(|c| self.evaluate(c)),
            Condition::Or { conditions } => conditions.iter().any(|c| self.evaluate(c)),
            Condition::Sensor { name, check } => {
                match sensor_predicate(&self.world.collectibles_here(), name) {
                    Some(value) => value == *check,
                    None => {
                        tracing::warn!(sensor = %name, "unknown sensor; condition is false");
                        false
                    }
                }
            }
        }
    }

    /// Resolve a numeric operand. `None` when a variable is unbound, a query
    /// goes unanswered, or arithmetic has no finite result.
    pub fn resolve_numeric(&self, expr: &Expr) -> Option<f64> {
        let value = match expr {
            Expr::Number { value } => *value,
            Expr::Variable { name } => self.resolve_variable(name)?,
            Expr::Query { name, argument } => self.world.query(name, argument.as_deref())?,
            Expr::Arithmetic { op, left, right } => {
                let left = self.resolve_numeric(left)?;
                let right = self.resolve_numeric(right)?;
                match op {
                    ArithOp::Add => left + right,
                    ArithOp::Sub => left - right,
                    ArithOp::Mul => left * right,
                    ArithOp::Div if right == 0.0 => return None,
                    ArithOp::Div => left / right,
                    ArithOp::Pow => left.powf(right),
                }
            }
        };
        value.is_finite().then_some(value)
    }

    /// Context binding first, then sensor variables.
    fn resolve_variable(&self, name: &str) -> Option<f64> {
        self.context
            .get(name)
            .or_else(|| sensor_value(&self.world.collectibles_here(), name))
    }

    /// On the value side, a name that resolves to nothing is a string literal.
    fn operand(&self, expr: &Expr, value_side: bool) -> Operand {
        match (self.resolve_numeric(expr), expr) {
            (Some(n), _) => Operand::Number(n),
            (None, Expr::Variable { name }) if value_side => Operand::Text(name.clone()),
            (None, _) => Operand::Missing,
        }
    }
}

fn compare(op: CompareOp, left: &Operand, right: &Operand) -> bool {
    let ordering = match (left, right) {
        (Operand::Missing, _) | (_, Operand::Missing) => return false,
        (Operand::Number(a), Operand::Number(b)) => match a.partial_cmp(b) {
            Some(ordering) => ordering,
            None => return false,
        },
        (Operand::Text(a), Operand::Text(b)) => a.cmp(b),
        // A number never equals a string, and the two are not ordered.
        _ => return op == CompareOp::NotEqual,
    };
    match op {
        CompareOp::Equal => ordering == Ordering::Equal,
        CompareOp::NotEqual => ordering != Ordering::Equal,
        CompareOp::Less => ordering == Ordering::Less,
        CompareOp::Greater => ordering == Ordering::Greater,
        CompareOp::LessEqual => ordering != Ordering::Greater,
        CompareOp::GreaterEqual => ordering != Ordering::Less,
    }
}
