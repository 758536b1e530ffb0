//! Timers for the interactive executor.
//!
//! The executor never sleeps or spawns: it asks the host for a timer and
//! waits for the host to call back into
//! [`InteractiveExecutor::on_timer`](crate::InteractiveExecutor::on_timer).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Handle of one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Host-provided timer source.
pub trait Scheduler {
    /// Arrange for the executor's `on_timer` to be called with the returned
    /// id after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Forget a timer. Cancelling an unknown or already fired id is a no-op.
    fn cancel(&mut self, id: TimerId);
}

/// A scheduler that only records requests; the host fires them explicitly.
///
/// Useful for step-by-step debugging and for tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: VecDeque<(TimerId, Duration)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the oldest pending timer.
    pub fn next_due(&mut self) -> Option<TimerId> {
        self.pending.pop_front().map(|(id, _)| id)
    }

    /// Pending timers with their requested delays, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = (TimerId, Duration)> + '_ {
        self.pending.iter().copied()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push_back((id, delay));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|(pending, _)| *pending != id);
    }
}
