#![forbid(unsafe_code)]

//! Deferred task queue: the "next turn of the event loop".
//!
//! [`TaskQueue`] models a macrotask queue for a single-threaded host. Work
//! scheduled during the current turn is not run until the host calls
//! [`TaskQueue::run_pending`], and tasks scheduled *while* a turn runs are
//! held for the turn after that. This keeps a burst of synchronous calls in
//! one external event from observing each other's deferred effects.
//!
//! # Invariants
//!
//! 1. Tasks run in scheduling order (FIFO).
//! 2. `run_pending` runs only the tasks queued before it was called.
//! 3. Every scheduled task runs exactly once; there is no cancellation.
//!
//! # Failure Modes
//!
//! - A task that panics propagates out of `run_pending`; tasks queued behind
//!   it stay queued.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static GLOBAL_QUEUE: TaskQueue = TaskQueue::new();
}

/// Shared FIFO of deferred tasks. Cloning shares the queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The thread-local queue used by widgets built without an explicit one.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_QUEUE.with(Clone::clone)
    }

    /// Queue `task` for the next turn.
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run one turn and return how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let turn = self.tasks.borrow().len();
        let mut ran = 0;
        while ran < turn {
            // Pop one at a time so tasks can schedule more without a borrow conflict.
            let Some(task) = self.tasks.borrow_mut().pop_front() else {
                break;
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, remaining = self.pending(), "task queue turn");
        }
        ran
    }

    /// Run turns until idle or `max_turns` is reached. Returns total tasks run.
    pub fn run_until_idle(&self, max_turns: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_turns {
            if self.is_idle() {
                break;
            }
            total += self.run_pending();
        }
        total
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending())
            .finish()
    }
}
