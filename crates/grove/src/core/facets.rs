//! Derived native facets and their diff.
//!
//! A facet is one semantically independent attribute group derived from props
//! and layout. The last applied value of every facet is kept on the instance;
//! an update derives the new values and writes only the facets whose derived
//! value changed. A fresh instance starts from the platform defaults, so only
//! facets that deviate from the default reach the toolkit. A facet that
//! returns to its default is reset rather than set.

use std::fmt;

use crate::{
    core::{
        error::Result,
        layout::{LayoutDirection, LayoutMetrics},
        native::{AttributeId, AttributeValue, NativeFacade, NativeHandle, check},
        props::{
            AccessibilityLevel, AccessibilityState, BorderStyle, Color, PointerEvents, Props,
            ResizeMode, Shadow, WidgetKind,
        },
    },
    geom::{EdgeInsets, Matrix4, Point, Size},
};

/// Native hit-test behaviour derived from the pointer-events policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitTestMode {
    /// Node and children are hit-testable.
    #[default]
    Default,
    /// Node only; children are skipped.
    Block,
    /// Children only.
    Transparent,
    /// Neither.
    None,
}

impl HitTestMode {
    /// Derive from a pointer-events policy.
    pub fn from_pointer_events(p: PointerEvents) -> Self {
        match p {
            PointerEvents::Auto => Self::Default,
            PointerEvents::BoxOnly => Self::Block,
            PointerEvents::BoxNone => Self::Transparent,
            PointerEvents::None => Self::None,
        }
    }

    /// Numeric code for the native attribute.
    pub fn code(self) -> f32 {
        match self {
            Self::Default => 0.0,
            Self::Block => 1.0,
            Self::Transparent => 2.0,
            Self::None => 3.0,
        }
    }
}

/// Facets shared by every widget kind, in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonFacets {
    /// Background colour.
    pub background: Option<Color>,
    /// Effective accessibility label, including a resolved labelled-by.
    pub accessibility_label: Option<String>,
    /// Accessibility state flags.
    pub accessibility_state: AccessibilityState,
    /// Border widths.
    pub border_widths: EdgeInsets,
    /// Border colours.
    pub border_colors: [Color; 4],
    /// Border radii.
    pub border_radii: [f32; 4],
    /// Border style.
    pub border_style: BorderStyle,
    /// Shadow.
    pub shadow: Option<Shadow>,
    /// Accessibility actions.
    pub accessibility_actions: Vec<String>,
    /// Transform with translation in physical pixels.
    pub transform: Matrix4,
    /// Opacity.
    pub opacity: f32,
    /// Hit-test behaviour.
    pub hit_test: HitTestMode,
    /// Enabled flag.
    pub enabled: bool,
    /// Accessibility role.
    pub accessibility_role: Option<String>,
    /// Accessibility hint.
    pub accessibility_hint: Option<String>,
    /// Accessibility importance.
    pub accessibility_level: AccessibilityLevel,
    /// Accessibility value text.
    pub accessibility_text: Option<String>,
    /// Accessibility grouping.
    pub accessibility_group: bool,
    /// Clip children.
    pub clip: bool,
    /// Native identifier.
    pub native_id: Option<String>,
}

impl Default for CommonFacets {
    fn default() -> Self {
        Self {
            background: None,
            accessibility_label: None,
            accessibility_state: AccessibilityState::default(),
            border_widths: EdgeInsets::zero(),
            border_colors: [Color::TRANSPARENT; 4],
            border_radii: [0.0; 4],
            border_style: BorderStyle::Solid,
            shadow: None,
            accessibility_actions: Vec::new(),
            transform: Matrix4::IDENTITY,
            opacity: 1.0,
            hit_test: HitTestMode::Default,
            enabled: true,
            accessibility_role: None,
            accessibility_hint: None,
            accessibility_level: AccessibilityLevel::Auto,
            accessibility_text: None,
            accessibility_group: false,
            clip: false,
            native_id: None,
        }
    }
}

impl CommonFacets {
    /// Derive from props, layout and the instance transform.
    ///
    /// When the props carry a labelled-by reference the label is resolved in
    /// the finalize pass, so the previously applied label is kept here.
    pub fn derive(
        props: &Props,
        layout: &LayoutMetrics,
        transform: &Matrix4,
        prev_label: Option<&String>,
    ) -> Self {
        let base = props.base();
        let a11y = &base.accessibility;
        let accessibility_label = if a11y.labelled_by.is_some() {
            prev_label.cloned()
        } else {
            a11y.label.clone()
        };
        Self {
            background: base.background_color,
            accessibility_label,
            accessibility_state: a11y.state,
            border_widths: base.border.widths,
            border_colors: base.border.colors,
            border_radii: base.border.radii,
            border_style: base.border.style,
            shadow: base.shadow,
            accessibility_actions: a11y.actions.clone(),
            transform: transform.with_scaled_translation(layout.point_scale_factor),
            opacity: base.opacity,
            hit_test: HitTestMode::from_pointer_events(base.pointer_events),
            enabled: !a11y.state.disabled,
            accessibility_role: a11y.role.clone(),
            accessibility_hint: a11y.hint.clone(),
            accessibility_level: a11y.level,
            accessibility_text: a11y.text.clone(),
            accessibility_group: a11y.group,
            clip: base.clips() || props.kind() == WidgetKind::Scroll,
            native_id: base.native_id.clone(),
        }
    }
}

/// Frame and direction facets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutFacets {
    /// Frame origin.
    pub position: Point,
    /// Frame size.
    pub size: Size,
    /// Layout direction.
    pub direction: LayoutDirection,
}

impl LayoutFacets {
    /// Derive from layout metrics.
    pub fn derive(layout: &LayoutMetrics) -> Self {
        Self {
            position: layout.frame.origin,
            size: layout.frame.size,
            direction: layout.direction,
        }
    }
}

/// Scroll view facets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollFacets {
    /// Horizontal axis.
    pub horizontal: bool,
    /// User scrolling enabled.
    pub scroll_enabled: bool,
    /// Indicator visible.
    pub shows_indicator: bool,
}

impl Default for ScrollFacets {
    fn default() -> Self {
        Self {
            horizontal: false,
            scroll_enabled: true,
            shows_indicator: true,
        }
    }
}

/// Text field facets.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInputFacets {
    /// Controlled text.
    pub text: Option<String>,
    /// Placeholder.
    pub placeholder: Option<String>,
    /// Editable.
    pub editable: bool,
    /// Maximum length.
    pub max_length: Option<u32>,
    /// Secure entry.
    pub secure: bool,
}

impl Default for TextInputFacets {
    fn default() -> Self {
        Self {
            text: None,
            placeholder: None,
            editable: true,
            max_length: None,
            secure: false,
        }
    }
}

/// Image facets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageFacets {
    /// Source URI.
    pub source: Option<String>,
    /// Resize mode.
    pub resize_mode: ResizeMode,
    /// Blur radius.
    pub blur_radius: f32,
}

/// Refresh control facets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshFacets {
    /// Refreshing flag.
    pub refreshing: bool,
    /// Enabled flag.
    pub enabled: bool,
    /// Progress indicator offset.
    pub progress_view_offset: f32,
}

impl Default for RefreshFacets {
    fn default() -> Self {
        Self {
            refreshing: false,
            enabled: true,
            progress_view_offset: 0.0,
        }
    }
}

/// Facets specific to one widget kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WidgetFacets {
    /// Kinds without extra facets.
    #[default]
    None,
    /// Scroll view.
    Scroll(ScrollFacets),
    /// Text field.
    TextInput(TextInputFacets),
    /// Image.
    Image(ImageFacets),
    /// Refresh control.
    Refresh(RefreshFacets),
}

impl WidgetFacets {
    /// Platform defaults for `kind`.
    pub fn defaults_for(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::View | WidgetKind::Text => Self::None,
            WidgetKind::Scroll => Self::Scroll(ScrollFacets::default()),
            WidgetKind::TextInput => Self::TextInput(TextInputFacets::default()),
            WidgetKind::Image => Self::Image(ImageFacets::default()),
            WidgetKind::RefreshControl => Self::Refresh(RefreshFacets::default()),
        }
    }

    /// Derive from props.
    pub fn derive(props: &Props) -> Self {
        match props {
            Props::View(_) | Props::Text(_) => Self::None,
            Props::Scroll(p) => Self::Scroll(ScrollFacets {
                horizontal: p.horizontal,
                scroll_enabled: p.scroll_enabled,
                shows_indicator: p.shows_indicator,
            }),
            Props::TextInput(p) => Self::TextInput(TextInputFacets {
                text: p.text.clone(),
                placeholder: p.placeholder.clone(),
                editable: p.editable,
                max_length: p.max_length,
                secure: p.secure,
            }),
            Props::Image(p) => Self::Image(ImageFacets {
                source: p.source.clone(),
                resize_mode: p.resize_mode,
                blur_radius: p.blur_radius,
            }),
            Props::RefreshControl(p) => Self::Refresh(RefreshFacets {
                refreshing: p.refreshing,
                enabled: p.enabled,
                progress_view_offset: p.progress_view_offset,
            }),
        }
    }
}

/// Every facet last applied to an instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Facets {
    /// Common facets.
    pub common: CommonFacets,
    /// Frame facets.
    pub layout: LayoutFacets,
    /// Widget-specific facets.
    pub widget: WidgetFacets,
}

impl Facets {
    /// Platform defaults for `kind`.
    pub fn defaults_for(kind: WidgetKind) -> Self {
        Self {
            common: CommonFacets::default(),
            layout: LayoutFacets::default(),
            widget: WidgetFacets::defaults_for(kind),
        }
    }
}

/// Writes facet diffs to one native node and counts the calls made.
pub(crate) struct AttributeWriter<'a> {
    /// Target facade.
    facade: &'a dyn NativeFacade,
    /// Target node.
    handle: NativeHandle,
    /// Number of native calls made.
    writes: usize,
}

impl<'a> AttributeWriter<'a> {
    /// Construct a writer for `handle`.
    pub(crate) fn new(facade: &'a dyn NativeFacade, handle: NativeHandle) -> Self {
        Self {
            facade,
            handle,
            writes: 0,
        }
    }

    /// Number of native calls made so far.
    pub(crate) fn writes(&self) -> usize {
        self.writes
    }

    /// Write one facet if its value changed. A value equal to `default` is
    /// reset instead of set.
    fn facet<T: PartialEq + fmt::Debug>(
        &mut self,
        id: AttributeId,
        prev: &T,
        next: &T,
        default: &T,
        encode: impl FnOnce(&T) -> AttributeValue,
    ) -> Result<()> {
        if prev == next {
            return Ok(());
        }
        if next == default {
            tracing::trace!("{:?}: reset {id:?}", self.handle);
            check(self.facade.reset_attribute(self.handle, id))?;
        } else {
            tracing::trace!("{:?}: set {id:?} = {next:?}", self.handle);
            check(self.facade.set_attribute(self.handle, id, &encode(next)))?;
        }
        self.writes += 1;
        Ok(())
    }

    /// Set an attribute unconditionally.
    pub(crate) fn set(&mut self, id: AttributeId, value: &AttributeValue) -> Result<()> {
        tracing::trace!("{:?}: set {id:?} = {value:?}", self.handle);
        check(self.facade.set_attribute(self.handle, id, value))?;
        self.writes += 1;
        Ok(())
    }

    /// Write every changed facet, common facets first.
    pub(crate) fn apply(&mut self, prev: &Facets, next: &Facets) -> Result<()> {
        self.common(&prev.common, &next.common)?;
        self.layout(&prev.layout, &next.layout)?;
        self.widget(&prev.widget, &next.widget)
    }

    /// Write the common facets in their fixed order.
    pub(crate) fn common(&mut self, prev: &CommonFacets, next: &CommonFacets) -> Result<()> {
        let d = CommonFacets::default();
        self.facet(
            AttributeId::BackgroundColor,
            &prev.background,
            &next.background,
            &d.background,
            |c| AttributeValue::Numbers(c.unwrap_or_default().to_array().to_vec()),
        )?;
        self.facet(
            AttributeId::AccessibilityLabel,
            &prev.accessibility_label,
            &next.accessibility_label,
            &d.accessibility_label,
            opt_text,
        )?;
        self.facet(
            AttributeId::AccessibilityState,
            &prev.accessibility_state,
            &next.accessibility_state,
            &d.accessibility_state,
            |s| {
                AttributeValue::Numbers(vec![
                    bit(s.disabled),
                    bit(s.selected),
                    tri(s.checked),
                    bit(s.busy),
                    tri(s.expanded),
                ])
            },
        )?;
        self.facet(
            AttributeId::BorderWidth,
            &prev.border_widths,
            &next.border_widths,
            &d.border_widths,
            |w| AttributeValue::Numbers(w.to_array().to_vec()),
        )?;
        self.facet(
            AttributeId::BorderColor,
            &prev.border_colors,
            &next.border_colors,
            &d.border_colors,
            |cs| AttributeValue::Numbers(cs.iter().flat_map(|c| c.to_array()).collect()),
        )?;
        self.facet(
            AttributeId::BorderRadius,
            &prev.border_radii,
            &next.border_radii,
            &d.border_radii,
            |r| AttributeValue::Numbers(r.to_vec()),
        )?;
        self.facet(
            AttributeId::BorderStyle,
            &prev.border_style,
            &next.border_style,
            &d.border_style,
            |s| {
                AttributeValue::number(match s {
                    BorderStyle::Solid => 0.0,
                    BorderStyle::Dotted => 1.0,
                    BorderStyle::Dashed => 2.0,
                })
            },
        )?;
        self.facet(
            AttributeId::Shadow,
            &prev.shadow,
            &next.shadow,
            &d.shadow,
            |s| {
                let s = s.unwrap_or_default();
                let [r, g, b, a] = s.color.to_array();
                AttributeValue::Numbers(vec![
                    s.offset.x,
                    s.offset.y,
                    s.radius,
                    r,
                    g,
                    b,
                    a * s.opacity,
                ])
            },
        )?;
        self.facet(
            AttributeId::AccessibilityActions,
            &prev.accessibility_actions,
            &next.accessibility_actions,
            &d.accessibility_actions,
            |a| AttributeValue::text(a.join(",")),
        )?;
        self.facet(
            AttributeId::Transform,
            &prev.transform,
            &next.transform,
            &d.transform,
            AttributeValue::matrix,
        )?;
        self.facet(
            AttributeId::Opacity,
            &prev.opacity,
            &next.opacity,
            &d.opacity,
            |o| AttributeValue::number(*o),
        )?;
        self.facet(
            AttributeId::HitTestBehavior,
            &prev.hit_test,
            &next.hit_test,
            &d.hit_test,
            |h| AttributeValue::number(h.code()),
        )?;
        self.facet(
            AttributeId::Enabled,
            &prev.enabled,
            &next.enabled,
            &d.enabled,
            |e| AttributeValue::flag(*e),
        )?;
        self.facet(
            AttributeId::AccessibilityRole,
            &prev.accessibility_role,
            &next.accessibility_role,
            &d.accessibility_role,
            opt_text,
        )?;
        self.facet(
            AttributeId::AccessibilityHint,
            &prev.accessibility_hint,
            &next.accessibility_hint,
            &d.accessibility_hint,
            opt_text,
        )?;
        self.facet(
            AttributeId::AccessibilityLevel,
            &prev.accessibility_level,
            &next.accessibility_level,
            &d.accessibility_level,
            |l| AttributeValue::text(l.as_str()),
        )?;
        self.facet(
            AttributeId::AccessibilityText,
            &prev.accessibility_text,
            &next.accessibility_text,
            &d.accessibility_text,
            opt_text,
        )?;
        self.facet(
            AttributeId::AccessibilityMode,
            &prev.accessibility_group,
            &next.accessibility_group,
            &d.accessibility_group,
            |g| AttributeValue::flag(*g),
        )?;
        self.facet(
            AttributeId::Clip,
            &prev.clip,
            &next.clip,
            &d.clip,
            |c| AttributeValue::flag(*c),
        )?;
        self.facet(
            AttributeId::Id,
            &prev.native_id,
            &next.native_id,
            &d.native_id,
            opt_text,
        )
    }

    /// Write the frame facets.
    pub(crate) fn layout(&mut self, prev: &LayoutFacets, next: &LayoutFacets) -> Result<()> {
        let d = LayoutFacets::default();
        self.facet(
            AttributeId::Position,
            &prev.position,
            &next.position,
            &d.position,
            |p| AttributeValue::Numbers(vec![p.x, p.y]),
        )?;
        self.facet(
            AttributeId::Size,
            &prev.size,
            &next.size,
            &d.size,
            |s| AttributeValue::Numbers(vec![s.width, s.height]),
        )?;
        self.facet(
            AttributeId::Direction,
            &prev.direction,
            &next.direction,
            &d.direction,
            |dir| AttributeValue::number(dir.code()),
        )
    }

    /// Write widget-specific facets.
    pub(crate) fn widget(&mut self, prev: &WidgetFacets, next: &WidgetFacets) -> Result<()> {
        match (prev, next) {
            (WidgetFacets::Scroll(p), WidgetFacets::Scroll(n)) => {
                let d = ScrollFacets::default();
                self.facet(
                    AttributeId::ScrollDirection,
                    &p.horizontal,
                    &n.horizontal,
                    &d.horizontal,
                    |h| AttributeValue::flag(*h),
                )?;
                self.facet(
                    AttributeId::ScrollEnabled,
                    &p.scroll_enabled,
                    &n.scroll_enabled,
                    &d.scroll_enabled,
                    |e| AttributeValue::flag(*e),
                )?;
                self.facet(
                    AttributeId::ScrollBarDisplay,
                    &p.shows_indicator,
                    &n.shows_indicator,
                    &d.shows_indicator,
                    |s| AttributeValue::flag(*s),
                )
            }
            (WidgetFacets::TextInput(p), WidgetFacets::TextInput(n)) => {
                let d = TextInputFacets::default();
                self.facet(
                    AttributeId::TextInputText,
                    &p.text,
                    &n.text,
                    &d.text,
                    opt_text,
                )?;
                self.facet(
                    AttributeId::TextInputPlaceholder,
                    &p.placeholder,
                    &n.placeholder,
                    &d.placeholder,
                    opt_text,
                )?;
                self.facet(
                    AttributeId::TextInputEnabled,
                    &p.editable,
                    &n.editable,
                    &d.editable,
                    |e| AttributeValue::flag(*e),
                )?;
                self.facet(
                    AttributeId::TextInputMaxLength,
                    &p.max_length,
                    &n.max_length,
                    &d.max_length,
                    |m| AttributeValue::number(m.map_or(0.0, |m| m as f32)),
                )?;
                self.facet(
                    AttributeId::TextInputSecure,
                    &p.secure,
                    &n.secure,
                    &d.secure,
                    |s| AttributeValue::flag(*s),
                )
            }
            (WidgetFacets::Image(p), WidgetFacets::Image(n)) => {
                let d = ImageFacets::default();
                self.facet(
                    AttributeId::ImageSource,
                    &p.source,
                    &n.source,
                    &d.source,
                    opt_text,
                )?;
                self.facet(
                    AttributeId::ImageResizeMode,
                    &p.resize_mode,
                    &n.resize_mode,
                    &d.resize_mode,
                    |m| AttributeValue::number(m.code()),
                )?;
                self.facet(
                    AttributeId::ImageBlurRadius,
                    &p.blur_radius,
                    &n.blur_radius,
                    &d.blur_radius,
                    |r| AttributeValue::number(*r),
                )
            }
            (WidgetFacets::Refresh(p), WidgetFacets::Refresh(n)) => {
                let d = RefreshFacets::default();
                self.facet(
                    AttributeId::RefreshRefreshing,
                    &p.refreshing,
                    &n.refreshing,
                    &d.refreshing,
                    |r| AttributeValue::flag(*r),
                )?;
                self.facet(
                    AttributeId::RefreshEnabled,
                    &p.enabled,
                    &n.enabled,
                    &d.enabled,
                    |e| AttributeValue::flag(*e),
                )?;
                self.facet(
                    AttributeId::RefreshOffset,
                    &p.progress_view_offset,
                    &n.progress_view_offset,
                    &d.progress_view_offset,
                    |o| AttributeValue::number(*o),
                )
            }
            (WidgetFacets::None, WidgetFacets::None) => Ok(()),
            (p, n) => {
                tracing::debug!("widget facet kind changed from {p:?} to {n:?}, skipped");
                Ok(())
            }
        }
    }
}

/// Encode an optional string, empty when absent.
fn opt_text(s: &Option<String>) -> AttributeValue {
    AttributeValue::text(s.as_deref().unwrap_or_default())
}

/// Encode a flag as 0 or 1.
fn bit(v: bool) -> f32 {
    if v { 1.0 } else { 0.0 }
}

/// Encode an optional flag as -1, 0 or 1.
fn tri(v: Option<bool>) -> f32 {
    v.map_or(-1.0, bit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        props::{Accessibility, Overflow, ViewProps},
        testing::facade::{NativeCall, RecordingFacade},
    };

    fn derive(props: &Props, layout: &LayoutMetrics) -> Facets {
        Facets {
            common: CommonFacets::derive(props, layout, &props.base().transform, None),
            layout: LayoutFacets::derive(layout),
            widget: WidgetFacets::derive(props),
        }
    }

    #[test]
    fn defaults_produce_no_writes() -> Result<()> {
        let facade = RecordingFacade::new();
        let mut w = AttributeWriter::new(&facade, NativeHandle(1));
        let props = Props::default();
        let next = derive(&props, &LayoutMetrics::default());
        w.apply(&Facets::defaults_for(WidgetKind::View), &next)?;
        assert_eq!(w.writes(), 0);
        assert!(facade.calls().is_empty());
        Ok(())
    }

    #[test]
    fn facets_apply_in_fixed_order() -> Result<()> {
        let facade = RecordingFacade::new();
        let mut w = AttributeWriter::new(&facade, NativeHandle(1));
        let props = Props::View(ViewProps {
            native_id: Some("n".into()),
            overflow: Overflow::Hidden,
            opacity: 0.5,
            background_color: Some(Color::rgb(1, 2, 3)),
            accessibility: Accessibility {
                hint: Some("hint".into()),
                label: Some("label".into()),
                ..Default::default()
            },
            transform: Matrix4::translation(1.0, 2.0),
            ..Default::default()
        });
        let next = derive(&props, &LayoutMetrics::default());
        w.apply(&Facets::defaults_for(WidgetKind::View), &next)?;
        assert_eq!(
            facade.set_ids(NativeHandle(1)),
            vec![
                AttributeId::BackgroundColor,
                AttributeId::AccessibilityLabel,
                AttributeId::Transform,
                AttributeId::Opacity,
                AttributeId::AccessibilityHint,
                AttributeId::Clip,
                AttributeId::Id,
            ]
        );
        Ok(())
    }

    #[test]
    fn transform_translation_scales_with_density() {
        let props = Props::View(ViewProps {
            transform: Matrix4::translation(10.0, 5.0),
            ..Default::default()
        });
        let layout = LayoutMetrics::default().with_scale(3.0);
        let f = CommonFacets::derive(&props, &layout, &props.base().transform, None);
        assert_eq!(f.transform.translation_part(), (30.0, 15.0));
    }

    #[test]
    fn returning_to_default_resets() -> Result<()> {
        let facade = RecordingFacade::new();
        let handle = NativeHandle(4);
        let mut w = AttributeWriter::new(&facade, handle);
        let faded = Props::View(ViewProps {
            opacity: 0.2,
            ..Default::default()
        });
        let layout = LayoutMetrics::default();
        let a = derive(&faded, &layout);
        let b = derive(&Props::default(), &layout);
        w.apply(&a, &b)?;
        assert_eq!(
            facade.calls(),
            vec![NativeCall::Reset {
                handle,
                id: AttributeId::Opacity
            }]
        );
        Ok(())
    }

    #[test]
    fn labelled_by_keeps_previous_label() {
        let props = Props::View(ViewProps {
            accessibility: Accessibility {
                label: Some("own".into()),
                labelled_by: Some("other".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        let prev = "own, theirs".to_string();
        let f = CommonFacets::derive(
            &props,
            &LayoutMetrics::default(),
            &Matrix4::IDENTITY,
            Some(&prev),
        );
        assert_eq!(f.accessibility_label.as_deref(), Some("own, theirs"));
    }

    #[test]
    fn failure_propagates() {
        let facade = RecordingFacade::new();
        facade.fail_on("set_attribute", 5);
        let mut w = AttributeWriter::new(&facade, NativeHandle(1));
        let props = Props::View(ViewProps {
            opacity: 0.5,
            ..Default::default()
        });
        let next = derive(&props, &LayoutMetrics::default());
        let err = w
            .apply(&Facets::defaults_for(WidgetKind::View), &next)
            .unwrap_err();
        assert_eq!(
            err,
            crate::core::error::Error::Native {
                op: "set_attribute",
                status: 5
            }
        );
    }
}
