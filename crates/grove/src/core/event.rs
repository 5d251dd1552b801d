//! Events in both directions.
//!
//! [`NativeEvent`] is the single message type for callbacks coming up from the
//! toolkit. [`EventEmitter`] carries named events with JSON payloads down to
//! the renderer through a [`RendererBridge`].

use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::Value;

use crate::{
    core::{id::Tag, native::NativeEventKind, state::State},
    geom::{Point, Size},
};

/// Names of events emitted to the renderer.
pub mod names {
    /// Throttled scroll progress.
    pub const SCROLL: &str = "scroll";
    /// A drag gesture started.
    pub const SCROLL_BEGIN_DRAG: &str = "scrollBeginDrag";
    /// A drag gesture ended.
    pub const SCROLL_END_DRAG: &str = "scrollEndDrag";
    /// Momentum scrolling started.
    pub const MOMENTUM_SCROLL_BEGIN: &str = "momentumScrollBegin";
    /// Momentum scrolling ended.
    pub const MOMENTUM_SCROLL_END: &str = "momentumScrollEnd";
    /// Text changed.
    pub const CHANGE: &str = "change";
    /// Selection changed.
    pub const SELECTION_CHANGE: &str = "selectionChange";
    /// Return key pressed.
    pub const SUBMIT_EDITING: &str = "submitEditing";
    /// Focus gained.
    pub const FOCUS: &str = "focus";
    /// Focus lost.
    pub const BLUR: &str = "blur";
    /// Image load started.
    pub const LOAD_START: &str = "loadStart";
    /// Image loaded.
    pub const LOAD: &str = "load";
    /// Image failed.
    pub const ERROR: &str = "error";
    /// Image download progress.
    pub const PROGRESS: &str = "progress";
    /// Pointer entered a target.
    pub const POINTER_ENTER: &str = "pointerEnter";
    /// Pointer left a target.
    pub const POINTER_LEAVE: &str = "pointerLeave";
    /// Press and release on the same target.
    pub const CLICK: &str = "click";
    /// Pull-to-refresh triggered.
    pub const REFRESH: &str = "refresh";
}

/// Renderer-facing sink for events and state updates.
pub trait RendererBridge: Send + Sync {
    /// Deliver an event for `tag`.
    fn dispatch_event(&self, tag: Tag, name: &str, payload: Value);

    /// Persist new state for `tag`.
    fn update_state(&self, tag: Tag, state: Arc<State>);

    /// Does anything listen for `name` on `tag`? Payloads are not built for
    /// events nobody listens to.
    fn is_listening(&self, _tag: Tag, _name: &str) -> bool {
        true
    }
}

/// The event callbacks of one shadow node. Replaced wholesale on update.
#[derive(Clone)]
pub struct EventEmitter {
    /// Tag events are addressed to.
    tag: Tag,
    /// Delivery sink.
    bridge: Arc<dyn RendererBridge>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter").field("tag", &self.tag).finish()
    }
}

impl EventEmitter {
    /// Construct an emitter for `tag`.
    pub fn new(tag: impl Into<Tag>, bridge: Arc<dyn RendererBridge>) -> Self {
        Self {
            tag: tag.into(),
            bridge,
        }
    }

    /// The tag events are addressed to.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Emit `name`, building the payload only if someone listens.
    pub fn dispatch(&self, name: &str, payload: impl FnOnce() -> Value) {
        if !self.bridge.is_listening(self.tag, name) {
            tracing::trace!("{}: no listener for {name}", self.tag);
            return;
        }
        tracing::trace!("{}: emit {name}", self.tag);
        self.bridge.dispatch_event(self.tag, name, payload());
    }

    /// Emit `name` with a serializable payload.
    pub fn dispatch_serialized<T: Serialize>(&self, name: &str, payload: &T) {
        self.dispatch(name, || match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("{}: cannot serialize {name} payload: {e}", self.tag);
                Value::Null
            }
        });
    }
}

/// Gesture phase carried by a scroll frame-begin callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollPhase {
    /// Not scrolling.
    #[default]
    Idle,
    /// Finger down.
    Dragging,
    /// Momentum after release.
    Flinging,
}

/// A callback from the native toolkit.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    /// A scroll frame is about to be produced.
    ScrollFrameBegin {
        /// Offset change requested for this frame.
        delta: Point,
        /// Gesture phase.
        phase: ScrollPhase,
    },
    /// The content offset changed.
    Scroll {
        /// New content offset.
        offset: Point,
    },
    /// Scrolling came to rest.
    ScrollStop,
    /// Text field contents changed.
    TextChange {
        /// New contents.
        text: String,
    },
    /// Text field selection changed.
    SelectionChange {
        /// Selection start.
        start: u32,
        /// Selection end.
        end: u32,
    },
    /// Return key pressed.
    Submit,
    /// Focus gained.
    Focus,
    /// Focus lost.
    Blur,
    /// Image loaded.
    ImageComplete {
        /// Intrinsic size.
        size: Size,
    },
    /// Image failed.
    ImageError {
        /// Failure description.
        message: String,
    },
    /// Image download progress.
    ImageProgress {
        /// Bytes loaded.
        loaded: u64,
        /// Total bytes.
        total: u64,
    },
    /// Pull-to-refresh triggered.
    Refresh,
}

impl NativeEvent {
    /// The registration kind this event is delivered under.
    pub fn kind(&self) -> NativeEventKind {
        match self {
            Self::ScrollFrameBegin { .. } => NativeEventKind::ScrollFrameBegin,
            Self::Scroll { .. } => NativeEventKind::Scroll,
            Self::ScrollStop => NativeEventKind::ScrollStop,
            Self::TextChange { .. } => NativeEventKind::TextChange,
            Self::SelectionChange { .. } => NativeEventKind::SelectionChange,
            Self::Submit => NativeEventKind::Submit,
            Self::Focus => NativeEventKind::Focus,
            Self::Blur => NativeEventKind::Blur,
            Self::ImageComplete { .. } => NativeEventKind::ImageComplete,
            Self::ImageError { .. } => NativeEventKind::ImageError,
            Self::ImageProgress { .. } => NativeEventKind::ImageProgress,
            Self::Refresh => NativeEventKind::Refresh,
        }
    }
}

/// A point in event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XY {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl From<Point> for XY {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// A size in event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WH {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl From<Size> for WH {
    fn from(s: Size) -> Self {
        Self {
            width: s.width,
            height: s.height,
        }
    }
}

/// Payload of every scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPayload {
    /// Current offset.
    pub content_offset: XY,
    /// Content size.
    pub content_size: WH,
    /// Viewport size.
    pub layout_measurement: WH,
    /// Zoom, always 1.
    pub zoom_scale: f32,
}
