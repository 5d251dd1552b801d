use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::executor::{Task, TaskExecutor, TaskQueue};

/// An executor that runs every task inline and records the queue it was
/// submitted to.
#[derive(Debug, Default)]
pub struct ImmediateExecutor {
    /// Queues in submission order.
    queues: Mutex<Vec<TaskQueue>>,
}

impl ImmediateExecutor {
    /// Construct an executor with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the log.
    fn log(&self) -> MutexGuard<'_, Vec<TaskQueue>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues tasks were submitted to, in order.
    pub fn queues(&self) -> Vec<TaskQueue> {
        self.log().clone()
    }
}

impl TaskExecutor for ImmediateExecutor {
    fn submit(&self, queue: TaskQueue, task: Task) {
        self.log().push(queue);
        task();
    }
}
