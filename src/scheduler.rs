//! Scheduler contract - cooperative yielding between units of work.
//!
//! The engine never schedules itself. An external loop calls
//! [`Engine::work_loop`](crate::Engine::work_loop) with a [`Budget`] and keeps
//! calling it while the returned [`WorkStatus`] is not `Idle`. The engine
//! checks the budget only between units of work, never inside one.
//!
//! ```text
//! loop {
//!     match engine.work_loop(&Deadline::after(frame_slice))? {
//!         WorkStatus::Idle => wait_for_input(),
//!         WorkStatus::Yielded | WorkStatus::Committed(_) => {}
//!     }
//! }
//! ```

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::types::CommitStats;

/// Remaining-budget signal polled after each unit of work.
pub trait Budget {
    /// True when the engine must hand control back now.
    fn should_yield(&self) -> bool;
}

/// Any `Fn() -> bool` can act as a budget.
impl<F: Fn() -> bool> Budget for F {
    fn should_yield(&self) -> bool {
        self()
    }
}

/// Never yields. Used by `flush()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Budget for Unbounded {
    fn should_yield(&self) -> bool {
        false
    }
}

/// Allows a fixed number of units of work, then yields.
#[derive(Debug)]
pub struct UnitBudget {
    remaining: Cell<usize>,
}

impl UnitBudget {
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }
}

impl Budget for UnitBudget {
    fn should_yield(&self) -> bool {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        left == 0
    }
}

/// Yields once a wall-clock instant has passed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(slice: Duration) -> Self {
        Self {
            at: Instant::now() + slice,
        }
    }
}

impl Budget for Deadline {
    fn should_yield(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Outcome of one `work_loop` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing to do. The scheduler may sleep until the next update.
    Idle,
    /// Budget ran out with units of work remaining. Call again.
    Yielded,
    /// A pass finished and was committed. Effects may have scheduled more.
    Committed(CommitStats),
}

impl WorkStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkStatus::Idle)
    }
}
