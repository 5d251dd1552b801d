//! The seam to the native toolkit.
//!
//! The toolkit is modelled as a handle-based attribute API: nodes are created
//! by type, attributes are set, reset or read by a fixed [`AttributeId`], and
//! events are registered per handle and [`NativeEventKind`]. Every call reports
//! a status; non-zero statuses become [`FacadeError`]s.

use std::{iter, result::Result as StdResult};

use thiserror::Error;

use crate::{
    core::error::{Error, Result},
    geom::Matrix4,
};

/// Handle to a native node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

/// Handle to an opaque native object, such as a shaped paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// Native node types the engine creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Plain container.
    Stack,
    /// Scrollable container.
    Scroll,
    /// Single-node text primitive.
    Text,
    /// Editable text field.
    TextInput,
    /// Image view.
    Image,
    /// Pull-to-refresh container.
    Refresh,
}

/// Attributes the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    /// Background colour.
    BackgroundColor,
    /// Accessibility label.
    AccessibilityLabel,
    /// Accessibility state flags.
    AccessibilityState,
    /// Border widths, top/left/bottom/right.
    BorderWidth,
    /// Border colours, four RGBA quadruples.
    BorderColor,
    /// Border corner radii.
    BorderRadius,
    /// Border line style.
    BorderStyle,
    /// Drop shadow.
    Shadow,
    /// Accessibility action names.
    AccessibilityActions,
    /// 4x4 transform, column-major.
    Transform,
    /// Opacity.
    Opacity,
    /// Hit-test behaviour.
    HitTestBehavior,
    /// Enabled flag.
    Enabled,
    /// Accessibility role.
    AccessibilityRole,
    /// Accessibility hint.
    AccessibilityHint,
    /// Accessibility importance level.
    AccessibilityLevel,
    /// Accessibility value text.
    AccessibilityText,
    /// Accessibility grouping mode.
    AccessibilityMode,
    /// Clip content to bounds.
    Clip,
    /// Native identifier.
    Id,
    /// Frame position.
    Position,
    /// Frame size.
    Size,
    /// Layout direction.
    Direction,
    /// Scroll axis.
    ScrollDirection,
    /// Scroll interaction enabled.
    ScrollEnabled,
    /// Scroll indicator visibility.
    ScrollBarDisplay,
    /// Programmatic scroll target: x, y, animated.
    ScrollOffset,
    /// Nested scroll mode: 0 parent-first, 1 self-only.
    NestedScroll,
    /// Flash the scroll indicators.
    ScrollFlashIndicator,
    /// Shaped paragraph for a text node.
    TextParagraph,
    /// Text field contents.
    TextInputText,
    /// Placeholder text.
    TextInputPlaceholder,
    /// Text field editable flag.
    TextInputEnabled,
    /// Maximum text length.
    TextInputMaxLength,
    /// Secure entry flag.
    TextInputSecure,
    /// Selection range.
    TextInputSelection,
    /// Focus request: 1 focus, 0 blur.
    TextInputFocus,
    /// Image source URI.
    ImageSource,
    /// Image resize mode.
    ImageResizeMode,
    /// Image blur radius.
    ImageBlurRadius,
    /// Refreshing flag.
    RefreshRefreshing,
    /// Pull-to-refresh enabled flag.
    RefreshEnabled,
    /// Progress indicator offset.
    RefreshOffset,
}

/// Typed attribute payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Numeric array.
    Numbers(Vec<f32>),
    /// String value.
    Text(String),
    /// Opaque object handle.
    Object(ObjectHandle),
}

impl AttributeValue {
    /// A single number.
    pub fn number(v: f32) -> Self {
        Self::Numbers(vec![v])
    }

    /// A boolean encoded as 0 or 1.
    pub fn flag(v: bool) -> Self {
        Self::number(if v { 1.0 } else { 0.0 })
    }

    /// A transform matrix.
    pub fn matrix(m: &Matrix4) -> Self {
        Self::Numbers(m.to_cols_array().to_vec())
    }

    /// A string value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// Native event types that can be registered on a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    /// Scroll frame begin, with gesture phase.
    ScrollFrameBegin,
    /// Scroll offset changed.
    Scroll,
    /// Scroll came to rest.
    ScrollStop,
    /// Text field contents changed.
    TextChange,
    /// Text field selection changed.
    SelectionChange,
    /// Return key pressed.
    Submit,
    /// Node gained focus.
    Focus,
    /// Node lost focus.
    Blur,
    /// Image finished loading.
    ImageComplete,
    /// Image failed to load.
    ImageError,
    /// Image download progress.
    ImageProgress,
    /// Pull-to-refresh triggered.
    Refresh,
}

/// A failed facade call.
#[derive(PartialEq, Eq, Error, Debug, Clone, Copy)]
#[error("{op} returned status {status}")]
pub struct FacadeError {
    /// Facade operation name.
    pub op: &'static str,
    /// Non-zero status code.
    pub status: i32,
}

/// Result type for facade calls.
pub type FacadeResult<T> = StdResult<T, FacadeError>;

/// The native toolkit's node API.
///
/// Methods take `&self`: implementations wrap a toolkit that owns its own
/// state and is only ever called from the UI thread.
pub trait NativeFacade {
    /// Create a node of the given type.
    fn create_node(&self, node_type: NodeType) -> FacadeResult<NativeHandle>;
    /// Dispose of a node. The node must already be detached.
    fn dispose_node(&self, handle: NativeHandle) -> FacadeResult<()>;
    /// Set an attribute.
    fn set_attribute(
        &self,
        handle: NativeHandle,
        id: AttributeId,
        value: &AttributeValue,
    ) -> FacadeResult<()>;
    /// Reset an attribute to the platform default.
    fn reset_attribute(&self, handle: NativeHandle, id: AttributeId) -> FacadeResult<()>;
    /// Read an attribute, if it has a value.
    fn get_attribute(
        &self,
        handle: NativeHandle,
        id: AttributeId,
    ) -> FacadeResult<Option<AttributeValue>>;
    /// Insert `child` into `parent` at `index`.
    fn insert_child(
        &self,
        parent: NativeHandle,
        child: NativeHandle,
        index: usize,
    ) -> FacadeResult<()>;
    /// Remove `child` from `parent`.
    fn remove_child(&self, parent: NativeHandle, child: NativeHandle) -> FacadeResult<()>;
    /// Start delivering events of `kind` for `handle`.
    fn register_event(&self, handle: NativeHandle, kind: NativeEventKind) -> FacadeResult<()>;
    /// Stop delivering events of `kind` for `handle`.
    fn unregister_event(&self, handle: NativeHandle, kind: NativeEventKind) -> FacadeResult<()>;
}

/// The native nodes owned by one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSubtree {
    /// Node attached to the parent's native container.
    pub outer: NativeHandle,
    /// Inner node that hosts children, when it differs from `outer`.
    pub content: Option<NativeHandle>,
}

impl NativeSubtree {
    /// A subtree made of a single node.
    pub fn single(outer: NativeHandle) -> Self {
        Self {
            outer,
            content: None,
        }
    }

    /// Every handle in this subtree, outer first.
    pub fn handles(&self) -> impl Iterator<Item = NativeHandle> {
        iter::once(self.outer).chain(self.content)
    }
}

/// Convert a facade result, logging failures at the point of detection.
pub(crate) fn check<T>(r: FacadeResult<T>) -> Result<T> {
    r.map_err(|e| {
        tracing::error!("native call failed: {e}");
        Error::from(e)
    })
}
