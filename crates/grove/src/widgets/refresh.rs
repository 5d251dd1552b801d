//! Pull-to-refresh behaviour.
//!
//! A refresh gesture emits `refresh` and schedules a re-check: once the
//! description thread has had a chance to process the event, the UI thread
//! re-asserts the native refreshing flag from whatever props are current. This
//! resets the indicator when the renderer never turns `refreshing` on.

use std::sync::{Arc, mpsc::Sender};

use serde_json::json;

use crate::core::{
    event::{EventEmitter, names},
    executor::{Deferred, TaskExecutor, TaskQueue},
    id::Tag,
};

/// Refresh control behaviour.
#[derive(Debug, Clone, Default)]
pub struct RefreshBehavior {
    /// Re-checks scheduled and not yet processed.
    pending_rechecks: usize,
}

impl RefreshBehavior {
    /// Construct an idle behaviour.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-checks scheduled and not yet processed.
    pub fn pending_rechecks(&self) -> usize {
        self.pending_rechecks
    }

    /// Handle a refresh gesture.
    pub fn on_refresh(
        &mut self,
        tag: Tag,
        emitter: Option<&EventEmitter>,
        executor: &Arc<dyn TaskExecutor>,
        deferred: Sender<Deferred>,
    ) {
        if let Some(e) = emitter {
            e.dispatch(names::REFRESH, || json!({}));
        }
        self.pending_rechecks += 1;
        let ui = Arc::clone(executor);
        executor.submit(
            TaskQueue::Description,
            Box::new(move || {
                ui.submit(
                    TaskQueue::Ui,
                    Box::new(move || {
                        if deferred.send(Deferred::RefreshRecheck { tag }).is_err() {
                            tracing::debug!("{tag}: tree gone before refresh re-check");
                        }
                    }),
                );
            }),
        );
    }

    /// Note that a scheduled re-check ran.
    pub fn recheck_done(&mut self) {
        self.pending_rechecks = self.pending_rechecks.saturating_sub(1);
    }
}
