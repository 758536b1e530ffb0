//! The expansion engine shared by both executors.
//!
//! A [`Machine`] owns a working queue of pending [`Instruction`]s. Taking an
//! instruction pops it off the front; a control node resolves into child
//! instructions that are pushed back onto the front, so expansion is depth
//! first and left to right without any recursion on the Rust stack. That is
//! what lets a live run stop between any two primitive steps.
//!
//! ```text
//! [ while ] [ putBox ]                  before
//! [ collect ] [ while ] [ putBox ]      after a true condition
//! ```
//!
//! The cursor counts instructions taken so far; the queue length reported to
//! hosts is the cursor plus what is still pending.

use crate::action::PrimitiveAction;
use crate::config::Limits;
use crate::error::ExecutionError;
use crate::eval::{ExecutionContext, Evaluator};
use crate::outcome::UsedStatements;
use crate::world::WorldState;
use botmaze_program::ast::iteration_count;
use botmaze_program::{ActionNode, Loop, Program, StatementKind};
use std::collections::VecDeque;
use std::fmt;

/// One entry of the working queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// A program node still to be resolved, with the bindings it sees.
    Node {
        node: ActionNode,
        context: ExecutionContext,
    },
    /// A resolved unit action.
    Primitive(PrimitiveAction),
}

impl Instruction {
    fn node(node: ActionNode, context: ExecutionContext) -> Self {
        Instruction::Node { node, context }
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// The primitive that failed, if the failure belongs to one.
    pub action: Option<PrimitiveAction>,
    pub error: ExecutionError,
}

impl Failure {
    fn halted(error: ExecutionError) -> Self {
        Self {
            action: None,
            error,
        }
    }

    fn at(action: PrimitiveAction, error: impl Into<ExecutionError>) -> Self {
        Self {
            action: Some(action),
            error: error.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Some(action) => write!(f, "{} failed: {}", action, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Machine {
    pending: VecDeque<Instruction>,
    cursor: usize,
    steps: usize,
    executed: usize,
    limits: Limits,
    used: UsedStatements,
    /// Kind of the last primitive node expanded, for the box rule.
    last_primitive: Option<StatementKind>,
}

impl Machine {
    /// A machine positioned at the first top-level action of `program`.
    pub fn new(program: &Program, limits: Limits) -> Self {
        let pending = program
            .actions
            .iter()
            .cloned()
            .map(|node| Instruction::node(node, ExecutionContext::new()))
            .collect();
        Self {
            pending,
            cursor: 0,
            steps: 0,
            executed: 0,
            limits,
            used: UsedStatements::seeded(program),
            last_primitive: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Instructions taken off the queue so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current length of the queue, consumed instructions included.
    pub fn queue_len(&self) -> usize {
        self.cursor + self.pending.len()
    }

    /// Instructions still waiting to run.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Instructions processed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Primitive actions applied to the world so far.
    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn used(&self) -> &UsedStatements {
        &self.used
    }

    pub fn into_used(self) -> UsedStatements {
        self.used
    }

    /// Process instructions until one primitive action has been applied to
    /// `world`, and return it. Returns `Ok(None)` once the queue is
    /// exhausted.
    pub fn advance<W: WorldState + ?Sized>(
        &mut self,
        program: &Program,
        world: &mut W,
    ) -> Result<Option<PrimitiveAction>, Failure> {
        while let Some(instruction) = self.pending.pop_front() {
            self.steps += 1;
            if self.steps > self.limits.max_steps {
                return Err(Failure::halted(ExecutionError::StepLimitExceeded {
                    limit: self.limits.max_steps,
                }));
            }
            self.cursor += 1;

            match instruction {
                Instruction::Primitive(action) => {
                    if let Err(err) = action.apply(world) {
                        tracing::debug!(action = %action, error = %err, "primitive failed");
                        return Err(Failure::at(action, err));
                    }
                    self.executed += 1;
                    tracing::debug!(step = self.steps, action = %action, "primitive executed");
                    return Ok(Some(action));
                }
                Instruction::Node { node, context } => {
                    self.expand(program, &*world, node, context)?
                }
            }
        }
        Ok(None)
    }

    fn expand<W: WorldState + ?Sized>(
        &mut self,
        program: &Program,
        world: &W,
        node: ActionNode,
        context: ExecutionContext,
    ) -> Result<(), Failure> {
        let kind = node.kind();
        self.used.insert(kind);
        tracing::debug!(step = self.steps, kind = %kind, cursor = self.cursor, "expanding node");

        match node {
            ActionNode::If {
                condition,
                then_actions,
                else_ifs,
                else_actions,
            } => {
                let eval = Evaluator::new(world, &context);
                let branch = if eval.evaluate(&condition) {
                    then_actions
                } else {
                    else_ifs
                        .into_iter()
                        .find(|clause| eval.evaluate(&clause.condition))
                        .map(|clause| clause.then_actions)
                        .unwrap_or(else_actions)
                };
                self.splice_nodes(&branch, &context)
            }
            ActionNode::While { condition, body } => {
                if !Evaluator::new(world, &context).evaluate(&condition) {
                    return Ok(());
                }
                if body.is_empty() {
                    return Err(Failure::halted(ExecutionError::EmptyWhileBody));
                }
                let mut children: Vec<Instruction> = body
                    .iter()
                    .cloned()
                    .map(|child| Instruction::node(child, context.clone()))
                    .collect();
                children.push(Instruction::node(
                    ActionNode::While { condition, body },
                    context,
                ));
                self.splice(children)
            }
            ActionNode::RepeatRange(lp) => self.expand_range(world, lp, context),
            ActionNode::CallFunction { name } => match program.function(&name) {
                Some(function) => self.splice_nodes(&function.body, &context),
                None => Err(Failure::halted(ExecutionError::UnknownFunction { name })),
            },
            primitive => self.expand_primitive(world, primitive, &context),
        }
    }

    /// Splice every iteration of a `repeatRange` at once.
    fn expand_range<W: WorldState + ?Sized>(
        &mut self,
        world: &W,
        lp: Loop,
        context: ExecutionContext,
    ) -> Result<(), Failure> {
        let variable = lp.variable.clone().unwrap_or_default();
        let eval = Evaluator::new(world, &context);
        let bounds = (
            eval.resolve_numeric(&lp.from),
            eval.resolve_numeric(&lp.to),
            eval.resolve_numeric(&lp.step),
        );
        let (Some(from), Some(to), Some(step)) = bounds else {
            tracing::warn!(variable = %variable, "repeatRange bounds did not resolve; skipped");
            return Ok(());
        };
        if step == 0.0 {
            return Err(Failure::halted(ExecutionError::ZeroStep { variable }));
        }

        let iterations = iteration_count(from, to, step).unwrap_or(0);
        if iterations > self.limits.max_range_iterations {
            return Err(Failure::halted(ExecutionError::RangeLimitExceeded {
                variable,
                iterations,
                limit: self.limits.max_range_iterations,
            }));
        }
        self.ensure_room(iterations.saturating_mul(lp.body.len()))?;

        let mut children = Vec::with_capacity(iterations * lp.body.len());
        for i in 0..iterations {
            let value = from + step * i as f64;
            let scope = match &lp.variable {
                Some(name) => context.with_binding(name, value),
                None => context.clone(),
            };
            children.extend(
                lp.body
                    .iter()
                    .cloned()
                    .map(|child| Instruction::node(child, scope.clone())),
            );
        }
        self.splice(children)
    }

    /// Resolve a primitive node's count and splice that many unit actions.
    fn expand_primitive<W: WorldState + ?Sized>(
        &mut self,
        world: &W,
        node: ActionNode,
        context: &ExecutionContext,
    ) -> Result<(), Failure> {
        let (action, count) = match node {
            ActionNode::Forward { count } => (PrimitiveAction::Forward, Some(count)),
            ActionNode::TurnLeft => (PrimitiveAction::TurnLeft, None),
            ActionNode::TurnRight => (PrimitiveAction::TurnRight, None),
            ActionNode::TurnBack => (PrimitiveAction::TurnBack, None),
            ActionNode::Collect { count, colors } => (PrimitiveAction::Collect { colors }, Some(count)),
            ActionNode::PutBox { count } => (PrimitiveAction::PutBox, Some(count)),
            ActionNode::TakeBox { count } => (PrimitiveAction::TakeBox, Some(count)),
            // Control nodes are handled by `expand`.
            _ => return Ok(()),
        };

        let kind = action.kind();
        if kind.is_box_action() && self.last_primitive == Some(kind) {
            return Err(Failure::at(
                action,
                ExecutionError::ConsecutiveBoxAction { kind },
            ));
        }
        let eval = Evaluator::new(world, context);
        let count = match count.as_ref().map(|expr| eval.resolve_numeric(expr)) {
            None => 1,
            Some(Some(n)) => n.max(0.0).trunc() as usize,
            Some(None) => {
                tracing::warn!(action = %action, count = ?count, "count did not resolve; skipped");
                return Ok(());
            }
        };

        if let PrimitiveAction::Collect { colors } = &action {
            let available = world.collectibles_here().matching(colors);
            if count > available as usize {
                let error = ExecutionError::InsufficientItems {
                    requested: u32::try_from(count).unwrap_or(u32::MAX),
                    available,
                    colors: colors.clone(),
                };
                return Err(Failure::at(action, error));
            }
        }

        self.ensure_room(count)?;
        // A block that runs zero times does not count for the box rule.
        if count > 0 {
            self.last_primitive = Some(kind);
        }
        self.splice(vec![Instruction::Primitive(action); count])
    }

    fn splice_nodes(
        &mut self,
        nodes: &[ActionNode],
        context: &ExecutionContext,
    ) -> Result<(), Failure> {
        let children = nodes
            .iter()
            .cloned()
            .map(|node| Instruction::node(node, context.clone()))
            .collect();
        self.splice(children)
    }

    /// Put `children` at the front of the pending queue, in order.
    fn splice(&mut self, children: Vec<Instruction>) -> Result<(), Failure> {
        if children.is_empty() {
            return Ok(());
        }
        self.ensure_room(children.len())?;
        self.pending.reserve(children.len());
        for child in children.into_iter().rev() {
            self.pending.push_front(child);
        }
        Ok(())
    }

    fn ensure_room(&self, extra: usize) -> Result<(), Failure> {
        if self.pending.len().saturating_add(extra) > self.limits.max_queue_len {
            return Err(Failure::halted(ExecutionError::QueueLimitExceeded {
                limit: self.limits.max_queue_len,
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridWorld;
    use crate::world::{Direction, Position};
    use botmaze_program::load;

    fn world() -> GridWorld {
        GridWorld::new(6, 6)
            .with_robot(Position::new(0, 0), Direction::East)
            .with_items(Position::new(0, 0), "green", 6)
            .with_stack(Position::new(0, 0), 3)
    }

    fn run(source: &str, world: &mut GridWorld) -> (Vec<PrimitiveAction>, Option<Failure>, Machine) {
        let program = load(source).unwrap();
        let mut machine = Machine::new(&program, Limits::default());
        let mut actions = Vec::new();
        loop {
            match machine.advance(&program, world) {
                Ok(Some(action)) => actions.push(action),
                Ok(None) => return (actions, None, machine),
                Err(failure) => return (actions, Some(failure), machine),
            }
        }
    }

    #[test]
    fn counts_expand_to_unit_actions() {
        let mut w = world();
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [
                {"type": "forward", "count": 3}, {"type": "turnRight"}, {"type": "forward", "count": "2"}
            ]}"#,
            &mut w,
        );
        assert!(failure.is_none());
        assert_eq!(actions.len(), 6);
        assert_eq!(w.position(), Position::new(3, 2));
    }

    #[test]
    fn range_binds_loop_variable() {
        let mut w = world();
        let (actions, failure, machine) = run(
            r#"{"version": "1", "actions": [
                {"type": "repeatRange", "variable": "i", "from": 1, "to": 3, "step": 1,
                 "body": [{"type": "collect", "count": "i", "color": "green"}]}
            ]}"#,
            &mut w,
        );
        assert!(failure.is_none());
        assert_eq!(actions.len(), 6);
        assert_eq!(w.inventory().collected_of("green"), 6);
        assert!(machine.used().contains(StatementKind::RepeatRange));
    }

    #[test]
    fn descending_range_and_zero_step() {
        let mut w = world();
        let (actions, _, _) = run(
            r#"{"version": "1", "actions": [
                {"type": "repeatRange", "variable": "i", "from": 3, "to": 1, "step": -1,
                 "body": [{"type": "turnLeft"}]}
            ]}"#,
            &mut w,
        );
        assert_eq!(actions.len(), 3);

        let (_, failure, _) = run(
            r#"{"version": "1", "actions": [
                {"type": "repeatRange", "variable": "i", "from": 1, "to": 3, "step": "z",
                 "body": [{"type": "turnLeft"}]},
                {"type": "repeatRange", "variable": "i", "from": 1, "to": 3, "step": {"type": "arithmetic", "op": "-", "left": 1, "right": 1},
                 "body": [{"type": "turnLeft"}]}
            ]}"#,
            &mut world(),
        );
        assert_eq!(
            failure.map(|f| f.error),
            Some(ExecutionError::ZeroStep {
                variable: "i".to_string()
            })
        );
    }

    #[test]
    fn while_runs_until_condition_fails() {
        let mut w = world();
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [
                {"type": "while", "condition": {"type": "sensor", "functionName": "hasGreen"},
                 "body": [{"type": "collect"}]}
            ]}"#,
            &mut w,
        );
        assert!(failure.is_none());
        assert_eq!(actions.len(), 6);
        assert_eq!(w.collectibles_here().count, 0);
    }

    #[test]
    fn empty_while_fails_only_when_true() {
        let source = |sensor: &str| {
            format!(
                r#"{{"version": "1", "actions": [
                    {{"type": "while", "condition": {{"type": "sensor", "functionName": "{}"}}, "body": []}},
                    {{"type": "turnLeft"}}
                ]}}"#,
                sensor
            )
        };
        let (actions, failure, _) = run(&source("isRed"), &mut world());
        assert!(failure.is_none());
        assert_eq!(actions, vec![PrimitiveAction::TurnLeft]);

        let (_, failure, _) = run(&source("isGreen"), &mut world());
        assert_eq!(failure.map(|f| f.error), Some(ExecutionError::EmptyWhileBody));
    }

    #[test]
    fn consecutive_put_box_rejected_across_empty_expansion() {
        let mut w = world();
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [
                {"type": "takeBox"},
                {"type": "putBox"},
                {"type": "if", "condition": {"type": "sensor", "functionName": "isRed"}, "then": [{"type": "turnLeft"}]},
                {"type": "putBox"}
            ]}"#,
            &mut w,
        );
        assert_eq!(actions, vec![PrimitiveAction::TakeBox, PrimitiveAction::PutBox]);
        let failure = failure.unwrap();
        assert_eq!(failure.action, Some(PrimitiveAction::PutBox));
        assert_eq!(
            failure.error,
            ExecutionError::ConsecutiveBoxAction {
                kind: StatementKind::PutBox
            }
        );
        assert_eq!(w.inventory().boxes_placed, 1);
    }

    #[test]
    fn collect_checks_whole_count_first() {
        let mut w = GridWorld::new(2, 2).with_items(Position::new(0, 0), "green", 3);
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [{"type": "collect", "count": 5, "colors": ["green"]}]}"#,
            &mut w,
        );
        let failure = failure.unwrap();
        assert!(actions.is_empty());
        assert_eq!(
            failure.error,
            ExecutionError::InsufficientItems {
                requested: 5,
                available: 3,
                colors: vec!["green".to_string()]
            }
        );
        assert_eq!(w.inventory().total_collected(), 0);
    }

    #[test]
    fn functions_inline_with_caller_context() {
        let mut w = world();
        let (actions, failure, machine) = run(
            r#"{"version": "1",
                "functions": [{"name": "spin", "body": [{"type": "forward", "count": "i"}, {"type": "turnRight", "count": 9}]}],
                "actions": [
                  {"type": "repeatRange", "variable": "i", "from": 1, "to": 2,
                   "body": [{"type": "callFunction", "functionName": "spin"}]}
                ]}"#,
            &mut w,
        );
        assert!(failure.is_none());
        // turnRight takes no count: 1 + 2 moves and 2 turns.
        assert_eq!(actions.len(), 5);
        assert!(machine.used().contains(StatementKind::CallFunction));
    }

    #[test]
    fn unknown_function_fails() {
        let (_, failure, _) = run(
            r#"{"version": "1", "actions": [{"type": "callFunction", "functionName": "ghost"}]}"#,
            &mut world(),
        );
        assert_eq!(
            failure.map(|f| f.error),
            Some(ExecutionError::UnknownFunction {
                name: "ghost".to_string()
            })
        );
    }

    #[test]
    fn runaway_while_hits_step_limit() {
        let program = load(
            r#"{"version": "1", "actions": [
                {"type": "while", "condition": {"type": "comparison", "variable": 1, "operator": "==", "value": 1},
                 "body": [{"type": "turnLeft"}]}
            ]}"#,
        )
        .unwrap();
        let limits = Limits {
            max_steps: 50,
            ..Limits::default()
        };
        let mut machine = Machine::new(&program, limits);
        let mut w = world();
        let failure = loop {
            match machine.advance(&program, &mut w) {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("loop should not finish"),
                Err(failure) => break failure,
            }
        };
        assert_eq!(failure.error, ExecutionError::StepLimitExceeded { limit: 50 });
    }

    #[test]
    fn huge_counts_hit_queue_limit() {
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [{"type": "turnLeft"}, {"type": "forward", "count": 1e9}]}"#,
            &mut world(),
        );
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            failure.map(|f| f.error),
            Some(ExecutionError::QueueLimitExceeded { .. })
        ));
    }

    #[test]
    fn unresolved_count_is_skipped() {
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [{"type": "forward", "count": "n"}, {"type": "turnBack"}]}"#,
            &mut world(),
        );
        assert!(failure.is_none());
        assert_eq!(actions, vec![PrimitiveAction::TurnBack]);
    }

    #[test]
    fn world_refusal_reports_the_action() {
        let mut w = GridWorld::new(2, 1);
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [{"type": "forward", "count": 4}]}"#,
            &mut w,
        );
        assert_eq!(actions, vec![PrimitiveAction::Forward]);
        let failure = failure.unwrap();
        assert_eq!(failure.action, Some(PrimitiveAction::Forward));
        assert!(matches!(failure.error, ExecutionError::World(_)));
    }

    #[test]
    fn box_block_that_runs_zero_times_does_not_count() {
        let mut w = world();
        let (actions, failure, _) = run(
            r#"{"version": "1", "actions": [
                {"type": "takeBox"},
                {"type": "forward"},
                {"type": "putBox", "count": 0},
                {"type": "putBox"},
                {"type": "takeBox", "count": "missing"},
                {"type": "putBox"}
            ]}"#,
            &mut w,
        );
        assert_eq!(
            actions,
            vec![
                PrimitiveAction::TakeBox,
                PrimitiveAction::Forward,
                PrimitiveAction::PutBox,
            ]
        );
        // the unresolved takeBox ran nothing, so this is putBox after putBox
        assert_eq!(
            failure.map(|f| f.error),
            Some(ExecutionError::ConsecutiveBoxAction {
                kind: StatementKind::PutBox
            })
        );
        assert_eq!(w.inventory().boxes_placed, 1);
    }

    #[test]
    fn long_loops_keep_the_pending_queue_small() {
        let program = load(
            r#"{"version": "1", "actions": [
                {"type": "while", "condition": {"type": "comparison", "variable": 1, "operator": "==", "value": 1},
                 "body": [{"type": "turnLeft"}, {"type": "turnRight"}]}
            ]}"#,
        )
        .unwrap();
        let mut machine = Machine::new(&program, Limits::default());
        let mut w = world();
        let mut most_pending = 0;
        while let Ok(Some(_)) = machine.advance(&program, &mut w) {
            most_pending = most_pending.max(machine.pending_len());
            assert_eq!(machine.queue_len(), machine.cursor() + machine.pending_len());
        }
        assert!(machine.executed() > 1_000);
        assert!(most_pending <= 3, "pending grew to {}", most_pending);
    }
}
