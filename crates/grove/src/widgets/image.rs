//! Image load lifecycle events.

use serde::Serialize;

use crate::{
    core::{
        event::{EventEmitter, NativeEvent, WH, names},
        id::Tag,
    },
    geom::Size,
};

/// Loaded image description.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct Source<'a> {
    /// Source URI.
    uri: &'a str,
    /// Intrinsic width.
    width: f32,
    /// Intrinsic height.
    height: f32,
}

/// Payload of `load`.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct LoadPayload<'a> {
    /// Loaded image.
    source: Source<'a>,
}

/// Payload of `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct ErrorPayload<'a> {
    /// Failure description.
    error: &'a str,
}

/// Payload of `progress`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct ProgressPayload {
    /// Bytes loaded.
    loaded: u64,
    /// Total bytes.
    total: u64,
}

/// Payload of `loadStart`.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct LoadStartPayload<'a> {
    /// URI being loaded.
    uri: &'a str,
}

/// Image behaviour.
#[derive(Debug, Clone, Default)]
pub struct ImageBehavior {
    /// URI currently loading or loaded.
    uri: Option<String>,
    /// Intrinsic size of the loaded image.
    loaded_size: Option<Size>,
}

impl ImageBehavior {
    /// Construct an empty behaviour.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current source URI.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Intrinsic size of the loaded image.
    pub fn loaded_size(&self) -> Option<Size> {
        self.loaded_size
    }

    /// Record a new source. A changed, non-empty source emits `loadStart`.
    pub fn set_source(&mut self, source: Option<&str>, emitter: Option<&EventEmitter>) {
        if self.uri.as_deref() == source {
            return;
        }
        self.uri = source.map(str::to_string);
        self.loaded_size = None;
        if let (Some(uri), Some(e)) = (source, emitter) {
            e.dispatch_serialized(names::LOAD_START, &LoadStartPayload { uri });
        }
    }

    /// Handle a native event.
    pub fn on_event(&mut self, tag: Tag, emitter: Option<&EventEmitter>, event: &NativeEvent) {
        match event {
            NativeEvent::ImageComplete { size } => {
                self.loaded_size = Some(*size);
                if let Some(e) = emitter {
                    let wh = WH::from(*size);
                    e.dispatch_serialized(
                        names::LOAD,
                        &LoadPayload {
                            source: Source {
                                uri: self.uri.as_deref().unwrap_or_default(),
                                width: wh.width,
                                height: wh.height,
                            },
                        },
                    );
                }
            }
            NativeEvent::ImageError { message } => {
                tracing::debug!("{tag}: image load failed: {message}");
                if let Some(e) = emitter {
                    e.dispatch_serialized(names::ERROR, &ErrorPayload { error: message });
                }
            }
            NativeEvent::ImageProgress { loaded, total } => {
                if let Some(e) = emitter {
                    e.dispatch_serialized(
                        names::PROGRESS,
                        &ProgressPayload {
                            loaded: *loaded,
                            total: *total,
                        },
                    );
                }
            }
            other => tracing::debug!("{tag}: image ignores {other:?}"),
        }
    }
}
