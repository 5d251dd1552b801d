//! Text field events and commands.

use serde::Serialize;

use crate::core::{
    command::Command,
    event::{EventEmitter, NativeEvent, names},
    id::Tag,
    native::{AttributeId, AttributeValue},
};

/// Payload of `change` and `submitEditing`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextPayload<'a> {
    /// Current contents.
    text: &'a str,
    /// Number of changes so far.
    event_count: i64,
    /// Emitting tag.
    target: Tag,
}

/// Selection range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct Selection {
    /// Start offset.
    start: u32,
    /// End offset.
    end: u32,
}

/// Payload of `selectionChange`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct SelectionPayload {
    /// New selection.
    selection: Selection,
    /// Emitting tag.
    target: Tag,
}

/// Payload of `focus` and `blur`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct TargetPayload {
    /// Emitting tag.
    target: Tag,
}

/// Text field behaviour.
#[derive(Debug, Clone, Default)]
pub struct TextInputBehavior {
    /// Changes seen so far. Commands carrying an older count are stale.
    event_count: i64,
    /// Last known contents.
    text: String,
    /// Focus state.
    focused: bool,
}

impl TextInputBehavior {
    /// Construct an empty behaviour.
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes seen so far.
    pub fn event_count(&self) -> i64 {
        self.event_count
    }

    /// Last known contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Is the field focused?
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Handle a native event, emitting through `emitter` if present.
    pub fn on_event(&mut self, tag: Tag, emitter: Option<&EventEmitter>, event: &NativeEvent) {
        match event {
            NativeEvent::TextChange { text } => {
                self.event_count += 1;
                self.text.clone_from(text);
                if let Some(e) = emitter {
                    e.dispatch_serialized(
                        names::CHANGE,
                        &TextPayload {
                            text,
                            event_count: self.event_count,
                            target: tag,
                        },
                    );
                }
            }
            NativeEvent::SelectionChange { start, end } => {
                if let Some(e) = emitter {
                    e.dispatch_serialized(
                        names::SELECTION_CHANGE,
                        &SelectionPayload {
                            selection: Selection {
                                start: *start,
                                end: *end,
                            },
                            target: tag,
                        },
                    );
                }
            }
            NativeEvent::Submit => {
                if let Some(e) = emitter {
                    e.dispatch_serialized(
                        names::SUBMIT_EDITING,
                        &TextPayload {
                            text: &self.text,
                            event_count: self.event_count,
                            target: tag,
                        },
                    );
                }
            }
            NativeEvent::Focus | NativeEvent::Blur => {
                let focus = matches!(event, NativeEvent::Focus);
                self.focused = focus;
                if let Some(e) = emitter {
                    let name = if focus { names::FOCUS } else { names::BLUR };
                    e.dispatch_serialized(name, &TargetPayload { target: tag });
                }
            }
            other => tracing::debug!("{tag}: text input ignores {other:?}"),
        }
    }

    /// Attribute writes for a command. Unsupported commands and stale
    /// updates produce none.
    pub fn on_command(&mut self, tag: Tag, command: &Command) -> Vec<(AttributeId, AttributeValue)> {
        match command {
            Command::Focus => vec![(AttributeId::TextInputFocus, AttributeValue::flag(true))],
            Command::Blur => vec![(AttributeId::TextInputFocus, AttributeValue::flag(false))],
            Command::SetTextAndSelection {
                event_count,
                text,
                start,
                end,
            } => {
                if *event_count < self.event_count {
                    tracing::debug!(
                        "{tag}: stale setTextAndSelection ({event_count} < {})",
                        self.event_count
                    );
                    return Vec::new();
                }
                let mut out = Vec::new();
                if let Some(text) = text {
                    self.text.clone_from(text);
                    out.push((AttributeId::TextInputText, AttributeValue::text(text.clone())));
                }
                if *start >= 0 && *end >= 0 {
                    out.push((
                        AttributeId::TextInputSelection,
                        AttributeValue::Numbers(vec![*start as f32, *end as f32]),
                    ));
                }
                out
            }
            other => {
                tracing::warn!("{tag}: text input does not support {other:?}");
                Vec::new()
            }
        }
    }
}
