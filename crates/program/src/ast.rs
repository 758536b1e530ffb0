//! Typed program tree for block programs.
//!
//! This module defines every type produced by the loader. A loaded
//! [`Program`] is immutable: executors copy the nodes they need into their
//! own working queue.
//!
//! # Tree Structure
//!
//! ```text
//! Program
//! ├── functions: IndexMap<String, Function>
//! │   └── Function { name, body: Vec<ActionNode> }
//! └── actions: Vec<ActionNode>
//!     ├── primitives: forward, turnLeft, turnRight, turnBack,
//!     │               collect, putBox, takeBox
//!     └── control:    repeatRange, if, while, callFunction
//! ```
//!
//! Static `repeat` blocks never appear in a loaded tree: they share the
//! [`Loop`] representation with `repeatRange`, and loops reporting
//! [`Loop::is_static`] are unrolled by the loader.
//!
//! # Serialization
//!
//! All types implement `Serialize` and `Deserialize`. Nodes are tagged with a
//! `type` field:
//!
//! ```rust
//! use botmaze_program::ast::{ActionNode, Expr};
//!
//! let node = ActionNode::Forward { count: Expr::number(2.0) };
//! let json = serde_json::to_value(&node).unwrap();
//! assert_eq!(json["type"], "forward");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Program
// ============================================================================

/// A loaded block program.
///
/// Returned by [`crate::load()`]. The function table is keyed by function
/// name and preserves declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Format version declared by the editor that produced the program.
    pub version: String,

    /// Optional display name (`programName` in the input).
    pub name: Option<String>,

    /// User-defined functions, invoked by `callFunction`.
    pub functions: IndexMap<String, Function>,

    /// Top-level actions, after static loops were unrolled.
    pub actions: Vec<ActionNode>,

    /// Number of type-tagged blocks in the raw input, before unrolling.
    ///
    /// Used for scoring ("solve it in N blocks") and diagnostics.
    pub block_count: usize,

    /// Statement kinds that were eliminated at load time (static `repeat`).
    ///
    /// Executors seed their used-statement set with these so a level that
    /// requires a loop still sees one.
    pub unrolled: BTreeSet<StatementKind>,

    /// Non-fatal problems found while loading.
    pub warnings: Vec<LoadWarning>,
}

impl Program {
    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Total number of primitive and control nodes in the loaded tree,
    /// counted recursively (function bodies included).
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        visit_actions(&self.actions, &mut |_| count += 1);
        for function in self.functions.values() {
            visit_actions(&function.body, &mut |_| count += 1);
        }
        count
    }
}

/// A user-defined function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub body: Vec<ActionNode>,
}

/// A problem the loader recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWarning {
    /// Location in the input, e.g. `actions[3].body[0]`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// One instruction of the program tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionNode {
    /// Move forward `count` tiles.
    Forward { count: Expr },

    TurnLeft,
    TurnRight,
    TurnBack,

    /// Pick up `count` items whose color is one of `colors`
    /// (any color when `colors` is empty).
    Collect { count: Expr, colors: Vec<String> },

    /// Put down `count` boxes on the current tile.
    PutBox { count: Expr },

    /// Pick up `count` boxes from the current tile.
    TakeBox { count: Expr },

    /// A loop whose bounds are resolved at run time.
    RepeatRange(Loop),

    /// Conditional with an ordered chain of branches.
    #[serde(rename_all = "camelCase")]
    If {
        condition: Condition,
        then_actions: Vec<ActionNode>,
        else_ifs: Vec<ElseIf>,
        else_actions: Vec<ActionNode>,
    },

    /// Re-evaluated before every pass over `body`.
    While {
        condition: Condition,
        body: Vec<ActionNode>,
    },

    /// Inline the body of the named function.
    CallFunction { name: String },
}

impl ActionNode {
    /// The statement tag for this node.
    pub fn kind(&self) -> StatementKind {
        match self {
            ActionNode::Forward { .. } => StatementKind::Forward,
            ActionNode::TurnLeft => StatementKind::TurnLeft,
            ActionNode::TurnRight => StatementKind::TurnRight,
            ActionNode::TurnBack => StatementKind::TurnBack,
            ActionNode::Collect { .. } => StatementKind::Collect,
            ActionNode::PutBox { .. } => StatementKind::PutBox,
            ActionNode::TakeBox { .. } => StatementKind::TakeBox,
            ActionNode::RepeatRange(_) => StatementKind::RepeatRange,
            ActionNode::If { .. } => StatementKind::If,
            ActionNode::While { .. } => StatementKind::While,
            ActionNode::CallFunction { .. } => StatementKind::CallFunction,
        }
    }

    /// Check if this node acts on the world directly.
    pub fn is_primitive(&self) -> bool {
        self.kind().is_primitive()
    }

    /// Nested action lists, labelled by where they sit in the node.
    pub fn nested_lists(&self) -> Vec<(String, &[ActionNode])> {
        match self {
            ActionNode::RepeatRange(lp) => vec![("body".to_string(), lp.body.as_slice())],
            ActionNode::If {
                then_actions,
                else_ifs,
                else_actions,
                ..
            } => {
                let mut lists = vec![("then".to_string(), then_actions.as_slice())];
                for (i, clause) in else_ifs.iter().enumerate() {
                    lists.push((format!("elseIf[{}].then", i), clause.then_actions.as_slice()));
                }
                lists.push(("else".to_string(), else_actions.as_slice()));
                lists
            }
            ActionNode::While { body, .. } => vec![("body".to_string(), body.as_slice())],
            _ => Vec::new(),
        }
    }
}

/// One `elseIf` clause of an [`ActionNode::If`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElseIf {
    pub condition: Condition,
    pub then_actions: Vec<ActionNode>,
}

/// A counted loop, shared by `repeat` and `repeatRange`.
///
/// `repeat n` is `Loop { variable: None, from: 1, to: n, step: 1 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    /// Induction variable bound for each iteration, if any.
    pub variable: Option<String>,
    pub from: Expr,
    pub to: Expr,
    pub step: Expr,
    pub body: Vec<ActionNode>,
}

impl Loop {
    /// A plain `repeat count` loop.
    pub fn times(count: usize, body: Vec<ActionNode>) -> Self {
        Self {
            variable: None,
            from: Expr::number(1.0),
            to: Expr::number(count as f64),
            step: Expr::number(1.0),
            body,
        }
    }

    /// A loop can be unrolled at load time when it binds no variable and
    /// all of its bounds are literals.
    pub fn is_static(&self) -> bool {
        self.variable.is_none()
            && self.from.as_number().is_some()
            && self.to.as_number().is_some()
            && self.step.as_number().is_some()
    }

    /// Number of iterations of a static loop.
    ///
    /// Returns `None` for loops that must be expanded at run time, and for
    /// a zero step.
    pub fn static_iterations(&self) -> Option<usize> {
        if !self.is_static() {
            return None;
        }
        let from = self.from.as_number()?;
        let to = self.to.as_number()?;
        let step = self.step.as_number()?;
        iteration_count(from, to, step)
    }
}

/// Number of values `from, from + step, ...` that stay within `to`
/// (inclusive), walking in the direction of `step`.
///
/// Returns `None` when `step` is zero.
pub fn iteration_count(from: f64, to: f64, step: f64) -> Option<usize> {
    if step == 0.0 || !step.is_finite() {
        return None;
    }
    if (step > 0.0 && from > to) || (step < 0.0 && from < to) {
        return Some(0);
    }
    let span = ((to - from) / step).floor();
    if span >= usize::MAX as f64 {
        return Some(usize::MAX);
    }
    Some(span as usize + 1)
}

// ============================================================================
// Statement Kinds
// ============================================================================

/// Tag for each statement type.
///
/// Used for the used-statement set handed to outcome evaluation
/// (e.g. a level that requires a loop) and for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    Forward,
    TurnLeft,
    TurnRight,
    TurnBack,
    Collect,
    PutBox,
    TakeBox,
    Repeat,
    RepeatRange,
    If,
    While,
    CallFunction,
}

impl StatementKind {
    /// The `type` tag used in program JSON.
    pub fn tag(&self) -> &'static str {
        match self {
            StatementKind::Forward => "forward",
            StatementKind::TurnLeft => "turnLeft",
            StatementKind::TurnRight => "turnRight",
            StatementKind::TurnBack => "turnBack",
            StatementKind::Collect => "collect",
            StatementKind::PutBox => "putBox",
            StatementKind::TakeBox => "takeBox",
            StatementKind::Repeat => "repeat",
            StatementKind::RepeatRange => "repeatRange",
            StatementKind::If => "if",
            StatementKind::While => "while",
            StatementKind::CallFunction => "callFunction",
        }
    }

    /// Check if this statement acts on the world directly.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            StatementKind::Forward
                | StatementKind::TurnLeft
                | StatementKind::TurnRight
                | StatementKind::TurnBack
                | StatementKind::Collect
                | StatementKind::PutBox
                | StatementKind::TakeBox
        )
    }

    /// Check if this statement is a box action.
    pub fn is_box_action(&self) -> bool {
        matches!(self, StatementKind::PutBox | StatementKind::TakeBox)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// A boolean test used by `if`, `elseIf` and `while`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// `variable <operator> value`.
    Comparison {
        variable: Expr,
        operator: CompareOp,
        value: Expr,
    },

    /// True when every sub-condition is true.
    And { conditions: Vec<Condition> },

    /// True when any sub-condition is true.
    Or { conditions: Vec<Condition> },

    /// A named predicate about the current tile, e.g. `isGreen`.
    /// `check: false` negates it.
    Sensor { name: String, check: bool },
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
}

impl CompareOp {
    /// Parse an operator from its symbol.
    ///
    /// ```rust
    /// use botmaze_program::ast::CompareOp;
    ///
    /// assert_eq!(CompareOp::parse(">="), Some(CompareOp::GreaterEqual));
    /// assert_eq!(CompareOp::parse("=>"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "==" | "=" => Some(CompareOp::Equal),
            "!=" => Some(CompareOp::NotEqual),
            "<" => Some(CompareOp::Less),
            ">" => Some(CompareOp::Greater),
            "<=" => Some(CompareOp::LessEqual),
            ">=" => Some(CompareOp::GreaterEqual),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
            CompareOp::LessEqual => "<=",
            CompareOp::GreaterEqual => ">=",
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// A numeric operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expr {
    /// A literal (numeric strings are parsed into this variant).
    Number { value: f64 },

    /// A named value: a loop variable, a sensor variable, or, in the value
    /// position of a comparison, a plain string.
    Variable { name: String },

    /// A function-style variable answered by the world,
    /// e.g. `{"type": "function", "functionName": "boxesAt", "argument": "2,3"}`.
    Query {
        name: String,
        argument: Option<String>,
    },

    /// `left <op> right`.
    Arithmetic {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number { value }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable { name: name.into() }
    }

    pub fn arithmetic(op: ArithOp, left: Expr, right: Expr) -> Self {
        Expr::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The literal value, if this is a number literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number { value } => Some(*value),
            _ => None,
        }
    }
}

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "^")]
    Pow,
}

impl ArithOp {
    /// Parse an operator from its symbol.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Sub),
            "*" | "x" | "×" => Some(ArithOp::Mul),
            "/" | "÷" => Some(ArithOp::Div),
            "^" => Some(ArithOp::Pow),
            _ => None,
        }
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Call `f` on every node of `actions`, depth first, including nodes nested
/// in loop bodies and branches.
pub fn visit_actions<'a>(actions: &'a [ActionNode], f: &mut impl FnMut(&'a ActionNode)) {
    for action in actions {
        f(action);
        match action {
            ActionNode::RepeatRange(lp) => visit_actions(&lp.body, f),
            ActionNode::If {
                then_actions,
                else_ifs,
                else_actions,
                ..
            } => {
                visit_actions(then_actions, f);
                for clause in else_ifs {
                    visit_actions(&clause.then_actions, f);
                }
                visit_actions(else_actions, f);
            }
            ActionNode::While { body, .. } => visit_actions(body, f),
            _ => {}
        }
    }
}
