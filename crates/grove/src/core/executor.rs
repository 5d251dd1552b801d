//! Cross-thread scheduling seam.
//!
//! The engine never blocks on other threads. Work that has to visit the
//! description thread is submitted to a [`TaskExecutor`]; results that must
//! come back to the tree are sent as [`Deferred`] messages and drained on the
//! UI thread by `InstanceTree::process_deferred`.

use std::{
    fmt,
    sync::mpsc::{self, Receiver, Sender},
};

use crate::core::id::Tag;

/// Named executor queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskQueue {
    /// The thread that computes the UI description.
    Description,
    /// The UI thread.
    Ui,
}

/// A unit of work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Runs tasks on named queues.
pub trait TaskExecutor: Send + Sync {
    /// Schedule `task` on `queue`. Must not block.
    fn submit(&self, queue: TaskQueue, task: Task);
}

/// Work posted back to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Re-assert the native refreshing flag from the latest props.
    RefreshRecheck {
        /// Refresh control to re-check.
        tag: Tag,
    },
}

/// Channel the tree drains on the UI thread.
pub(crate) struct DeferredQueue {
    /// Sending half, cloned into tasks.
    tx: Sender<Deferred>,
    /// Receiving half.
    rx: Receiver<Deferred>,
}

impl fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredQueue").finish()
    }
}

impl DeferredQueue {
    /// Construct an empty queue.
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// A sender for posting messages from other threads.
    pub(crate) fn sender(&self) -> Sender<Deferred> {
        self.tx.clone()
    }

    /// Take the next pending message without blocking.
    pub(crate) fn try_next(&self) -> Option<Deferred> {
        self.rx.try_recv().ok()
    }
}
