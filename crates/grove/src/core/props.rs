//! Props snapshots.
//!
//! A props snapshot is produced by the renderer, shared behind an `Arc` and
//! never mutated. Each widget kind has its own props struct embedding the
//! common [`ViewProps`]; the [`Props`] enum carries the kind so that a
//! mismatched snapshot is detected by comparing discriminants.

use std::time::Duration;

use crate::geom::{EdgeInsets, Matrix4, Point};

/// The widget kind of an instance, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Plain container.
    View,
    /// Scroll view.
    Scroll,
    /// Text block.
    Text,
    /// Editable text field.
    TextInput,
    /// Image.
    Image,
    /// Pull-to-refresh container.
    RefreshControl,
}

impl WidgetKind {
    /// Kinds that host at most one child.
    pub fn is_single_child(self) -> bool {
        matches!(self, Self::Scroll | Self::RefreshControl)
    }
}

/// An RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    /// Construct from components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Construct an opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Components as numbers.
    pub fn to_array(self) -> [f32; 4] {
        [
            f32::from(self.r),
            f32::from(self.g),
            f32::from(self.b),
            f32::from(self.a),
        ]
    }
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderStyle {
    /// Solid line.
    #[default]
    Solid,
    /// Dotted line.
    Dotted,
    /// Dashed line.
    Dashed,
}

/// Border metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Border {
    /// Edge widths.
    pub widths: EdgeInsets,
    /// Edge colours, top/left/bottom/right.
    pub colors: [Color; 4],
    /// Corner radii, top-left/top-right/bottom-right/bottom-left.
    pub radii: [f32; 4],
    /// Line style.
    pub style: BorderStyle,
}

/// Drop shadow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shadow {
    /// Shadow colour.
    pub color: Color,
    /// Shadow offset.
    pub offset: Point,
    /// Blur radius.
    pub radius: f32,
    /// Shadow opacity, multiplied into the colour alpha.
    pub opacity: f32,
}

/// Which of a node and its children may receive touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerEvents {
    /// The node and its children.
    #[default]
    Auto,
    /// Neither.
    None,
    /// The node only.
    BoxOnly,
    /// The children only.
    BoxNone,
}

impl PointerEvents {
    /// May the node itself handle touches?
    pub fn can_handle_touch(self) -> bool {
        matches!(self, Self::Auto | Self::BoxOnly)
    }

    /// May the node's children handle touches?
    pub fn can_children_handle_touch(self) -> bool {
        matches!(self, Self::Auto | Self::BoxNone)
    }
}

/// Content overflow policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overflow {
    /// Children may draw outside the frame.
    #[default]
    Visible,
    /// Children are clipped to the frame.
    Hidden,
    /// Children are clipped and scrollable.
    Scroll,
}

/// Accessibility state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessibilityState {
    /// Disabled.
    pub disabled: bool,
    /// Selected.
    pub selected: bool,
    /// Checked, if checkable.
    pub checked: Option<bool>,
    /// Busy.
    pub busy: bool,
    /// Expanded, if expandable.
    pub expanded: Option<bool>,
}

/// How important a node is to assistive technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessibilityLevel {
    /// Platform decides.
    #[default]
    Auto,
    /// Always exposed.
    Yes,
    /// Not exposed.
    No,
    /// Neither this node nor its descendants are exposed.
    NoHideDescendants,
}

impl AccessibilityLevel {
    /// Native string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Yes => "yes",
            Self::No => "no",
            Self::NoHideDescendants => "no-hide-descendants",
        }
    }
}

/// Accessibility props.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Accessibility {
    /// Label.
    pub label: Option<String>,
    /// Hint.
    pub hint: Option<String>,
    /// Role.
    pub role: Option<String>,
    /// State flags.
    pub state: AccessibilityState,
    /// Custom action names.
    pub actions: Vec<String>,
    /// Importance level.
    pub level: AccessibilityLevel,
    /// Value text.
    pub text: Option<String>,
    /// Expose this node and its children as a single element.
    pub group: bool,
    /// Native identifier of an instance whose label is appended to ours.
    pub labelled_by: Option<String>,
}

/// Props shared by every widget kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewProps {
    /// Background colour.
    pub background_color: Option<Color>,
    /// Border.
    pub border: Border,
    /// Drop shadow.
    pub shadow: Option<Shadow>,
    /// Opacity.
    pub opacity: f32,
    /// Transform applied around the frame centre.
    pub transform: Matrix4,
    /// Touch policy.
    pub pointer_events: PointerEvents,
    /// Extra touchable area around the frame. Positive values grow it.
    pub hit_slop: EdgeInsets,
    /// Overflow policy.
    pub overflow: Overflow,
    /// Accessibility.
    pub accessibility: Accessibility,
    /// Identifier used for cross references.
    pub native_id: Option<String>,
    /// Detach children outside the enclosing scroll window.
    pub remove_clipped_subviews: bool,
}

impl Default for ViewProps {
    fn default() -> Self {
        Self {
            background_color: None,
            border: Border::default(),
            shadow: None,
            opacity: 1.0,
            transform: Matrix4::IDENTITY,
            pointer_events: PointerEvents::Auto,
            hit_slop: EdgeInsets::zero(),
            overflow: Overflow::Visible,
            accessibility: Accessibility::default(),
            native_id: None,
            remove_clipped_subviews: false,
        }
    }
}

impl ViewProps {
    /// Does this node clip its children?
    pub fn clips(&self) -> bool {
        self.overflow != Overflow::Visible
    }
}

/// Snap alignment for interval snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SnapAlignment {
    /// Snap points align with the viewport's leading edge.
    #[default]
    Start,
    /// Snap points align with the viewport's centre.
    Center,
    /// Snap points align with the viewport's trailing edge.
    End,
}

/// Scroll view props.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollProps {
    /// Common props.
    pub base: ViewProps,
    /// Scroll horizontally instead of vertically.
    pub horizontal: bool,
    /// Accept user scroll gestures.
    pub scroll_enabled: bool,
    /// Show the scroll indicator.
    pub shows_indicator: bool,
    /// Explicit snap offsets.
    pub snap_to_offsets: Vec<f32>,
    /// Snap interval. Ignored when offsets are given.
    pub snap_to_interval: Option<f32>,
    /// Interval snap alignment.
    pub snap_to_alignment: SnapAlignment,
    /// Snap to the start when no lower offset remains.
    pub snap_to_start: bool,
    /// Snap to the end of content past the last offset.
    pub snap_to_end: bool,
    /// Minimum time between scroll notifications. Falls back to the config.
    pub scroll_event_throttle: Option<Duration>,
}

impl Default for ScrollProps {
    fn default() -> Self {
        Self {
            base: ViewProps {
                overflow: Overflow::Scroll,
                ..Default::default()
            },
            horizontal: false,
            scroll_enabled: true,
            shows_indicator: true,
            snap_to_offsets: Vec::new(),
            snap_to_interval: None,
            snap_to_alignment: SnapAlignment::Start,
            snap_to_start: true,
            snap_to_end: true,
            scroll_event_throttle: None,
        }
    }
}

/// Text block props. Content arrives in state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextProps {
    /// Common props.
    pub base: ViewProps,
    /// Allow text selection.
    pub selectable: bool,
}

/// Text field props.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInputProps {
    /// Common props.
    pub base: ViewProps,
    /// Controlled text value.
    pub text: Option<String>,
    /// Placeholder.
    pub placeholder: Option<String>,
    /// Accept edits.
    pub editable: bool,
    /// Maximum text length.
    pub max_length: Option<u32>,
    /// Obscure the contents.
    pub secure: bool,
}

impl Default for TextInputProps {
    fn default() -> Self {
        Self {
            base: ViewProps::default(),
            text: None,
            placeholder: None,
            editable: true,
            max_length: None,
            secure: false,
        }
    }
}

/// Image resize mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResizeMode {
    /// Scale to fill, cropping.
    #[default]
    Cover,
    /// Scale to fit, letterboxing.
    Contain,
    /// Stretch to fill.
    Stretch,
    /// Centre without scaling.
    Center,
    /// Tile.
    Repeat,
}

impl ResizeMode {
    /// Numeric code used for the native attribute.
    pub fn code(self) -> f32 {
        match self {
            Self::Cover => 0.0,
            Self::Contain => 1.0,
            Self::Stretch => 2.0,
            Self::Center => 3.0,
            Self::Repeat => 4.0,
        }
    }
}

/// Image props.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageProps {
    /// Common props.
    pub base: ViewProps,
    /// Source URI.
    pub source: Option<String>,
    /// Resize mode.
    pub resize_mode: ResizeMode,
    /// Blur radius.
    pub blur_radius: f32,
}

/// Refresh control props.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshProps {
    /// Common props.
    pub base: ViewProps,
    /// The indicator is showing.
    pub refreshing: bool,
    /// Pull-to-refresh is enabled.
    pub enabled: bool,
    /// Offset of the progress indicator.
    pub progress_view_offset: f32,
}

impl Default for RefreshProps {
    fn default() -> Self {
        Self {
            base: ViewProps::default(),
            refreshing: false,
            enabled: true,
            progress_view_offset: 0.0,
        }
    }
}

/// A props snapshot for one widget kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Props {
    /// Plain container.
    View(ViewProps),
    /// Scroll view.
    Scroll(ScrollProps),
    /// Text block.
    Text(TextProps),
    /// Text field.
    TextInput(TextInputProps),
    /// Image.
    Image(ImageProps),
    /// Refresh control.
    RefreshControl(RefreshProps),
}

impl Default for Props {
    fn default() -> Self {
        Self::View(ViewProps::default())
    }
}

impl Props {
    /// Default props for `kind`. Instances start from these before the first
    /// snapshot is applied.
    pub fn defaults_for(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::View => Self::View(ViewProps::default()),
            WidgetKind::Scroll => Self::Scroll(ScrollProps::default()),
            WidgetKind::Text => Self::Text(TextProps::default()),
            WidgetKind::TextInput => Self::TextInput(TextInputProps::default()),
            WidgetKind::Image => Self::Image(ImageProps::default()),
            WidgetKind::RefreshControl => Self::RefreshControl(RefreshProps::default()),
        }
    }

    /// The widget kind these props belong to.
    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::View(_) => WidgetKind::View,
            Self::Scroll(_) => WidgetKind::Scroll,
            Self::Text(_) => WidgetKind::Text,
            Self::TextInput(_) => WidgetKind::TextInput,
            Self::Image(_) => WidgetKind::Image,
            Self::RefreshControl(_) => WidgetKind::RefreshControl,
        }
    }

    /// The common props.
    pub fn base(&self) -> &ViewProps {
        match self {
            Self::View(p) => p,
            Self::Scroll(p) => &p.base,
            Self::Text(p) => &p.base,
            Self::TextInput(p) => &p.base,
            Self::Image(p) => &p.base,
            Self::RefreshControl(p) => &p.base,
        }
    }
}

impl From<ViewProps> for Props {
    fn from(p: ViewProps) -> Self {
        Self::View(p)
    }
}

impl From<ScrollProps> for Props {
    fn from(p: ScrollProps) -> Self {
        Self::Scroll(p)
    }
}

impl From<TextProps> for Props {
    fn from(p: TextProps) -> Self {
        Self::Text(p)
    }
}

impl From<TextInputProps> for Props {
    fn from(p: TextInputProps) -> Self {
        Self::TextInput(p)
    }
}

impl From<ImageProps> for Props {
    fn from(p: ImageProps) -> Self {
        Self::Image(p)
    }
}

impl From<RefreshProps> for Props {
    fn from(p: RefreshProps) -> Self {
        Self::RefreshControl(p)
    }
}
