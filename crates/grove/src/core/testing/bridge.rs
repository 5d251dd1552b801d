use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::core::{event::RendererBridge, id::Tag, state::State};

/// Everything a [`RecordingBridge`] has received.
#[derive(Debug, Default)]
struct Log {
    /// Events as `(tag, name, payload)`.
    events: Vec<(Tag, String, Value)>,
    /// State updates as `(tag, state)`.
    states: Vec<(Tag, Arc<State>)>,
    /// Listener filter. `None` listens to everything.
    listening: Option<Vec<(Tag, String)>>,
}

/// A renderer bridge that records what it is sent.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    /// Recorded traffic.
    log: Mutex<Log>,
}

impl RecordingBridge {
    /// Construct a bridge that listens to every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the log. A panicked test thread does not poison later reads.
    fn log(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Only report listeners for the given `(tag, name)` pairs.
    pub fn listen_only(&self, pairs: &[(Tag, &str)]) {
        self.log().listening = Some(
            pairs
                .iter()
                .map(|(t, n)| (*t, (*n).to_string()))
                .collect(),
        );
    }

    /// Recorded events.
    pub fn events(&self) -> Vec<(Tag, String, Value)> {
        self.log().events.clone()
    }

    /// Names of recorded events, in order.
    pub fn event_names(&self) -> Vec<String> {
        self.log().events.iter().map(|e| e.1.clone()).collect()
    }

    /// Recorded events named `name`.
    pub fn events_named(&self, name: &str) -> Vec<(Tag, Value)> {
        self.log()
            .events
            .iter()
            .filter(|e| e.1 == name)
            .map(|e| (e.0, e.2.clone()))
            .collect()
    }

    /// Recorded state updates.
    pub fn states(&self) -> Vec<(Tag, Arc<State>)> {
        self.log().states.clone()
    }

    /// Forget recorded traffic.
    pub fn clear(&self) {
        let mut log = self.log();
        log.events.clear();
        log.states.clear();
    }
}

impl RendererBridge for RecordingBridge {
    fn dispatch_event(&self, tag: Tag, name: &str, payload: Value) {
        self.log().events.push((tag, name.to_string(), payload));
    }

    fn update_state(&self, tag: Tag, state: Arc<State>) {
        self.log().states.push((tag, state));
    }

    fn is_listening(&self, tag: Tag, name: &str) -> bool {
        match &self.log().listening {
            None => true,
            Some(pairs) => pairs.iter().any(|(t, n)| *t == tag && n == name),
        }
    }
}
