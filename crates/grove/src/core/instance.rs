//! Arena nodes.
//!
//! An [`Instance`] mirrors one shadow node. It owns the last applied
//! snapshots, the derived facets, the native nodes and a per-kind
//! [`Behavior`]. Instances live in the tree's arena and refer to each other by
//! [`InstanceId`]; everything that needs more than one node goes through
//! [`InstanceTree`](crate::core::tree::InstanceTree).

use std::{cell::Cell, sync::Arc};

use crate::{
    core::{
        event::EventEmitter,
        facets::Facets,
        id::{InstanceId, Tag},
        layout::LayoutMetrics,
        native::{NativeHandle, NativeSubtree},
        props::{PointerEvents, Props, WidgetKind},
        registry::EventRegistration,
        state::State,
    },
    geom::{Matrix4, Point, Rect},
    widgets::{
        clipping::ClippedSubviews, image::ImageBehavior, refresh::RefreshBehavior,
        scroll::ScrollEngine, text::TextEngine, text_input::TextInputBehavior,
    },
};

/// Plain container behaviour.
#[derive(Debug, Clone, Default)]
pub struct ViewBehavior {
    /// Offscreen virtualization, when the props ask for it.
    pub clipped: Option<ClippedSubviews>,
}

/// Per-kind engine state.
#[derive(Debug)]
pub enum Behavior {
    /// Plain container.
    View(ViewBehavior),
    /// Scroll view.
    Scroll(ScrollEngine),
    /// Text block.
    Text(TextEngine),
    /// Text field.
    TextInput(TextInputBehavior),
    /// Image.
    Image(ImageBehavior),
    /// Refresh control.
    Refresh(RefreshBehavior),
}

/// One node of the instance tree.
#[derive(Debug)]
pub struct Instance {
    /// Shadow node tag.
    pub(crate) tag: Tag,
    /// Widget kind, fixed at creation.
    pub(crate) kind: WidgetKind,
    /// Last applied props.
    pub(crate) props: Arc<Props>,
    /// Last applied state.
    pub(crate) state: Option<Arc<State>>,
    /// Current event emitter.
    pub(crate) emitter: Option<Arc<EventEmitter>>,
    /// Last applied layout.
    pub(crate) layout: LayoutMetrics,
    /// Transform from props or the animation path.
    pub(crate) transform: Matrix4,
    /// Cached bounding box in local coordinates.
    pub(crate) bounding_box: Cell<Option<Rect>>,
    /// Parent, if attached.
    pub(crate) parent: Option<InstanceId>,
    /// Owned children in declared order.
    pub(crate) children: Vec<InstanceId>,
    /// Native nodes.
    pub(crate) native: NativeSubtree,
    /// Last applied facets.
    pub(crate) facets: Facets,
    /// Per-kind engine.
    pub(crate) behavior: Behavior,
    /// Live native event registrations.
    pub(crate) registrations: Vec<EventRegistration>,
    /// Is the outer node attached to the parent's native container?
    pub(crate) mounted: bool,
}

impl Instance {
    /// Shadow node tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Widget kind.
    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Last applied props.
    pub fn props(&self) -> &Arc<Props> {
        &self.props
    }

    /// Last applied state.
    pub fn state(&self) -> Option<&Arc<State>> {
        self.state.as_ref()
    }

    /// Current event emitter.
    pub fn emitter(&self) -> Option<&Arc<EventEmitter>> {
        self.emitter.as_ref()
    }

    /// Last applied layout.
    pub fn layout(&self) -> &LayoutMetrics {
        &self.layout
    }

    /// Current transform.
    pub fn transform(&self) -> &Matrix4 {
        &self.transform
    }

    /// Parent, if attached.
    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    /// Owned children.
    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    /// Native nodes.
    pub fn native(&self) -> NativeSubtree {
        self.native
    }

    /// Last applied facets.
    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    /// Per-kind engine.
    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Is the outer node attached natively?
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Cached bounding box, without recomputing.
    pub fn cached_bounding_box(&self) -> Option<Rect> {
        self.bounding_box.get()
    }

    /// Touch policy from props.
    pub fn pointer_events(&self) -> PointerEvents {
        self.props.base().pointer_events
    }

    /// Can this node itself receive touches?
    pub fn can_handle_touch(&self) -> bool {
        self.pointer_events().can_handle_touch()
    }

    /// Can children of this node receive touches?
    pub fn can_children_handle_touch(&self) -> bool {
        self.pointer_events().can_children_handle_touch()
    }

    /// Local bounds grown by the hit slop.
    pub fn hit_rect(&self) -> Rect {
        self.layout
            .size()
            .rect()
            .inset(self.props.base().hit_slop.negated())
    }

    /// Is `p`, in local coordinates, inside the hit rectangle?
    pub fn contains_point(&self, p: Point) -> bool {
        self.hit_rect().contains_point(p)
    }

    /// Does this node clip its children?
    pub fn is_clipping_content(&self) -> bool {
        self.kind == WidgetKind::Scroll || self.props.base().clips()
    }

    /// Content offset children are shifted by.
    pub fn scroll_offset(&self) -> Point {
        match &self.behavior {
            Behavior::Scroll(engine) => engine.offset(),
            _ => Point::zero(),
        }
    }

    /// Is the child at `index` detached by virtualization?
    pub fn is_child_clipped(&self, index: usize) -> bool {
        match &self.behavior {
            Behavior::View(ViewBehavior {
                clipped: Some(clipped),
            }) => clipped.is_clipped(index),
            _ => false,
        }
    }

    /// Native container children are attached to. Text blocks only host
    /// children inside their wrapper.
    pub fn child_container(&self) -> Option<NativeHandle> {
        match &self.behavior {
            Behavior::Text(engine) => engine.wrapper(),
            _ => Some(self.native.content.unwrap_or(self.native.outer)),
        }
    }

    /// Native children that precede owned children in the container.
    pub fn child_native_base(&self) -> usize {
        match &self.behavior {
            Behavior::Text(engine) if engine.wrapper().is_some() => 1,
            _ => 0,
        }
    }

    /// Scroll engine, if this is a scroll view.
    pub fn scroll_engine(&self) -> Option<&ScrollEngine> {
        match &self.behavior {
            Behavior::Scroll(e) => Some(e),
            _ => None,
        }
    }

    /// Text engine, if this is a text block.
    pub fn text_engine(&self) -> Option<&TextEngine> {
        match &self.behavior {
            Behavior::Text(e) => Some(e),
            _ => None,
        }
    }

    /// Text field behaviour, if this is a text field.
    pub fn text_input(&self) -> Option<&TextInputBehavior> {
        match &self.behavior {
            Behavior::TextInput(b) => Some(b),
            _ => None,
        }
    }

    /// Image behaviour, if this is an image.
    pub fn image(&self) -> Option<&ImageBehavior> {
        match &self.behavior {
            Behavior::Image(b) => Some(b),
            _ => None,
        }
    }

    /// Virtualization state, if enabled.
    pub fn clipped_subviews(&self) -> Option<&ClippedSubviews> {
        match &self.behavior {
            Behavior::View(v) => v.clipped.as_ref(),
            _ => None,
        }
    }
}
