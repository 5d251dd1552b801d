//! The instance tree.
//!
//! [`InstanceTree`] owns the arena of [`Instance`]s and is the single entry
//! point for everything that changes it: commits from the renderer, native
//! callbacks, imperative commands, pointer input and deferred messages. All
//! methods run on the UI thread and never block.

use std::{cell::Cell, collections::HashMap, fmt, mem, rc::Rc, sync::Arc, time::Instant};

use serde_json::Value;
use slotmap::SlotMap;

use crate::{
    config::Config,
    core::{
        clock::{Clock, SystemClock},
        command::Command,
        commit::{Commit, Mutation},
        error::{Error, Result},
        event::{EventEmitter, NativeEvent, RendererBridge},
        executor::{Deferred, DeferredQueue, TaskExecutor},
        facets::{AttributeWriter, CommonFacets, Facets, LayoutFacets, WidgetFacets},
        id::{InstanceId, Tag},
        instance::{Behavior, Instance, ViewBehavior},
        layout::LayoutMetrics,
        native::{
            AttributeId, AttributeValue, NativeEventKind, NativeFacade, NativeHandle,
            NativeSubtree, NodeType, check,
        },
        pointer::{PointerInput, PointerKind, PointerPayload, PointerRouter},
        props::{Props, WidgetKind},
        registry::EventRegistry,
        state::State,
        touch::{self, HitTestResult, TargetRef},
    },
    geom::{Matrix4, Point, Rect, Size, transform_around},
    widgets::{
        clipping::{ClippedSubviews, Toggle},
        image::ImageBehavior,
        refresh::RefreshBehavior,
        scroll::{ScrollEffect, ScrollEngine},
        text::TextEngine,
        text_input::TextInputBehavior,
    },
};

/// Log and build a structural error.
fn structural(msg: String) -> Error {
    tracing::error!("{msg}");
    Error::Structural(msg)
}

/// Mutable arena lookup that leaves the rest of the tree borrowable.
fn node_mut(nodes: &mut SlotMap<InstanceId, Instance>, id: InstanceId) -> Result<&mut Instance> {
    nodes
        .get_mut(id)
        .ok_or_else(|| Error::Invalid(format!("unknown instance {id:?}")))
}

/// Native events each kind listens to.
fn event_kinds(kind: WidgetKind) -> &'static [NativeEventKind] {
    match kind {
        WidgetKind::View | WidgetKind::Text => &[],
        WidgetKind::Scroll => &[
            NativeEventKind::ScrollFrameBegin,
            NativeEventKind::Scroll,
            NativeEventKind::ScrollStop,
        ],
        WidgetKind::TextInput => &[
            NativeEventKind::TextChange,
            NativeEventKind::SelectionChange,
            NativeEventKind::Submit,
            NativeEventKind::Focus,
            NativeEventKind::Blur,
        ],
        WidgetKind::Image => &[
            NativeEventKind::ImageComplete,
            NativeEventKind::ImageError,
            NativeEventKind::ImageProgress,
        ],
        WidgetKind::RefreshControl => &[NativeEventKind::Refresh],
    }
}

/// Detach and dispose every native node of an instance, inner nodes first.
fn dispose_natives(facade: &dyn NativeFacade, inst: &Instance) -> Result<()> {
    let outer = inst.native.outer;
    let inner = match &inst.behavior {
        Behavior::Text(engine) => engine.wrapper().map(|_| engine.text_node()),
        _ => inst.native.content,
    };
    if let Some(inner) = inner {
        check(facade.remove_child(outer, inner))?;
        check(facade.dispose_node(inner))?;
    }
    check(facade.dispose_node(outer))
}

/// Builder for [`InstanceTree`].
pub struct InstanceTreeBuilder {
    /// Native toolkit.
    facade: Rc<dyn NativeFacade>,
    /// Renderer sink.
    bridge: Arc<dyn RendererBridge>,
    /// Cross-thread scheduler.
    executor: Arc<dyn TaskExecutor>,
    /// Time source.
    clock: Rc<dyn Clock>,
    /// Tunables.
    config: Config,
}

impl InstanceTreeBuilder {
    /// Use `clock` instead of the system clock.
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Build an empty tree.
    pub fn build(self) -> InstanceTree {
        InstanceTree {
            nodes: SlotMap::with_key(),
            tags: HashMap::new(),
            native_ids: HashMap::new(),
            root: None,
            facade: self.facade,
            bridge: self.bridge,
            executor: self.executor,
            clock: self.clock,
            config: self.config,
            events: EventRegistry::new(),
            deferred: DeferredQueue::new(),
            pointer: PointerRouter::new(),
        }
    }
}

/// The arena of component instances for one surface.
pub struct InstanceTree {
    /// Instances.
    nodes: SlotMap<InstanceId, Instance>,
    /// Tag index.
    tags: HashMap<Tag, InstanceId>,
    /// Native identifier index, for labelled-by references.
    native_ids: HashMap<String, InstanceId>,
    /// Root instance.
    root: Option<InstanceId>,
    /// Native toolkit.
    facade: Rc<dyn NativeFacade>,
    /// Renderer sink.
    bridge: Arc<dyn RendererBridge>,
    /// Cross-thread scheduler.
    executor: Arc<dyn TaskExecutor>,
    /// Time source.
    clock: Rc<dyn Clock>,
    /// Tunables.
    config: Config,
    /// Native callback routes.
    events: EventRegistry,
    /// Messages posted back from other threads.
    deferred: DeferredQueue,
    /// Hover and press tracking.
    pointer: PointerRouter,
}

impl fmt::Debug for InstanceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceTree")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("config", &self.config)
            .field("events", &self.events)
            .finish()
    }
}

impl InstanceTree {
    /// Start building a tree.
    pub fn builder(
        facade: Rc<dyn NativeFacade>,
        bridge: Arc<dyn RendererBridge>,
        executor: Arc<dyn TaskExecutor>,
    ) -> InstanceTreeBuilder {
        InstanceTreeBuilder {
            facade,
            bridge,
            executor,
            clock: Rc::new(SystemClock),
            config: Config::default(),
        }
    }

    /// Tunables.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Native callback routes.
    pub fn event_registry(&self) -> &EventRegistry {
        &self.events
    }

    /// Hover and press state.
    pub fn pointer(&self) -> &PointerRouter {
        &self.pointer
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return true if the tree has no instances.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root instance.
    pub fn root(&self) -> Option<InstanceId> {
        self.root
    }

    /// Make `id` the root.
    pub fn set_root(&mut self, id: InstanceId) -> Result<()> {
        self.node(id)?;
        self.root = Some(id);
        Ok(())
    }

    /// The instance with `tag`.
    pub fn id_of(&self, tag: impl Into<Tag>) -> Option<InstanceId> {
        self.tags.get(&tag.into()).copied()
    }

    /// The instance `id`.
    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.nodes.get(id)
    }

    /// The instance with `tag`.
    pub fn get(&self, tag: impl Into<Tag>) -> Option<&Instance> {
        self.id_of(tag).and_then(|id| self.nodes.get(id))
    }

    /// Children of `id`.
    pub fn children(&self, id: InstanceId) -> &[InstanceId] {
        self.nodes.get(id).map_or(&[], |i| i.children.as_slice())
    }

    /// Lookup that fails with an invalid-input error.
    fn node(&self, id: InstanceId) -> Result<&Instance> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::Invalid(format!("unknown instance {id:?}")))
    }

    /// Resolve a tag referenced by a commit.
    fn lookup(&self, tag: Tag) -> Result<InstanceId> {
        self.tags.get(&tag).copied().ok_or_else(|| {
            tracing::error!("commit references unknown tag {tag}");
            Error::InstanceNotFound(tag)
        })
    }

    /// Create an instance with default layout and no state or emitter. The
    /// first instance created in an empty tree becomes the root.
    pub fn create(&mut self, tag: impl Into<Tag>, props: Arc<Props>) -> Result<InstanceId> {
        self.create_with(tag.into(), props, None, None, LayoutMetrics::default())
    }

    /// Create an instance and apply its initial snapshots. The emitter is in
    /// place before props are applied, so creation-time events reach it.
    pub fn create_with(
        &mut self,
        tag: Tag,
        props: Arc<Props>,
        state: Option<Arc<State>>,
        emitter: Option<Arc<EventEmitter>>,
        layout: LayoutMetrics,
    ) -> Result<InstanceId> {
        if self.tags.contains_key(&tag) {
            tracing::error!("create: {tag} already exists");
            return Err(Error::DuplicateTag(tag));
        }
        let kind = props.kind();
        let (native, behavior) = self.create_native(kind)?;
        let id = self.nodes.insert(Instance {
            tag,
            kind,
            props: Arc::new(Props::defaults_for(kind)),
            state: None,
            emitter,
            layout,
            transform: Matrix4::IDENTITY,
            bounding_box: Cell::new(None),
            parent: None,
            children: Vec::new(),
            native,
            facets: Facets::defaults_for(kind),
            behavior,
            registrations: Vec::new(),
            mounted: false,
        });
        self.tags.insert(tag, id);
        if self.root.is_none() {
            self.root = Some(id);
        }
        self.register_events(id)?;
        self.apply_props(id, props)?;
        self.apply_layout(id, layout)?;
        if let Some(state) = state {
            self.apply_state(id, state)?;
        }
        tracing::debug!("created {tag} as {kind:?}");
        Ok(id)
    }

    /// Create the native nodes and behaviour for `kind`.
    fn create_native(&self, kind: WidgetKind) -> Result<(NativeSubtree, Behavior)> {
        let f = &*self.facade;
        Ok(match kind {
            WidgetKind::View => (
                NativeSubtree::single(check(f.create_node(NodeType::Stack))?),
                Behavior::View(ViewBehavior::default()),
            ),
            WidgetKind::Scroll => {
                let outer = check(f.create_node(NodeType::Scroll))?;
                let content = check(f.create_node(NodeType::Stack))?;
                check(f.insert_child(outer, content, 0))?;
                (
                    NativeSubtree {
                        outer,
                        content: Some(content),
                    },
                    Behavior::Scroll(ScrollEngine::new(&self.config)),
                )
            }
            WidgetKind::Text => {
                let node = check(f.create_node(NodeType::Text))?;
                (
                    NativeSubtree::single(node),
                    Behavior::Text(TextEngine::new(node)),
                )
            }
            WidgetKind::TextInput => (
                NativeSubtree::single(check(f.create_node(NodeType::TextInput))?),
                Behavior::TextInput(TextInputBehavior::new()),
            ),
            WidgetKind::Image => (
                NativeSubtree::single(check(f.create_node(NodeType::Image))?),
                Behavior::Image(ImageBehavior::new()),
            ),
            WidgetKind::RefreshControl => (
                NativeSubtree::single(check(f.create_node(NodeType::Refresh))?),
                Behavior::Refresh(RefreshBehavior::new()),
            ),
        })
    }

    /// Register the native events of `id`'s kind on its outer node.
    fn register_events(&mut self, id: InstanceId) -> Result<()> {
        let (handle, kinds) = {
            let inst = self.node(id)?;
            (inst.native.outer, event_kinds(inst.kind))
        };
        let mut registrations = Vec::with_capacity(kinds.len());
        for kind in kinds {
            registrations.push(self.events.register(&self.facade, handle, *kind, id)?);
        }
        node_mut(&mut self.nodes, id)?.registrations = registrations;
        Ok(())
    }

    /// Apply a props snapshot. A snapshot for another widget kind is ignored.
    pub fn apply_props(&mut self, id: InstanceId, props: Arc<Props>) -> Result<()> {
        let virtualize = self.config.clipped_subviews;
        let inst = node_mut(&mut self.nodes, id)?;
        if props.kind() != inst.kind {
            tracing::debug!(
                "{}: ignoring {:?} props on a {:?}",
                inst.tag,
                props.kind(),
                inst.kind
            );
            return Ok(());
        }
        let prev = mem::replace(&mut inst.props, props);
        let (transform_changed, geometry_changed) = {
            let (p, n) = (prev.base(), inst.props.base());
            let transform = p.transform != n.transform;
            let geometry = transform
                || p.clips() != n.clips()
                || p.hit_slop != n.hit_slop
                || p.pointer_events != n.pointer_events;
            (transform, geometry)
        };
        if transform_changed {
            inst.transform = inst.props.base().transform;
        }

        let next = Facets {
            common: CommonFacets::derive(
                &inst.props,
                &inst.layout,
                &inst.transform,
                inst.facets.common.accessibility_label.as_ref(),
            ),
            layout: inst.facets.layout,
            widget: WidgetFacets::derive(&inst.props),
        };
        let mut writer = AttributeWriter::new(&*self.facade, inst.native.outer);
        writer.apply(&inst.facets, &next)?;
        tracing::trace!("{}: props applied with {} writes", inst.tag, writer.writes());
        inst.facets = next;

        let mut released = Vec::new();
        let emitter = inst.emitter.clone();
        match (&mut inst.behavior, &*inst.props) {
            (Behavior::Scroll(engine), Props::Scroll(p)) => engine.configure(p),
            (Behavior::View(view), Props::View(p)) => {
                let want = virtualize && p.remove_clipped_subviews;
                match (want, view.clipped.take()) {
                    (true, None) => view.clipped = Some(ClippedSubviews::new(inst.children.len())),
                    (true, Some(c)) => view.clipped = Some(c),
                    (false, Some(c)) => released = c.release(),
                    (false, None) => {}
                }
            }
            (Behavior::Image(image), Props::Image(p)) => {
                image.set_source(p.source.as_deref(), emitter.as_deref());
            }
            _ => {}
        }

        let next_native_id = inst.props.base().native_id.clone();
        if prev.base().native_id != next_native_id {
            if let Some(old) = &prev.base().native_id
                && self.native_ids.get(old) == Some(&id)
            {
                self.native_ids.remove(old);
            }
            if let Some(new) = next_native_id {
                self.native_ids.insert(new, id);
            }
        }
        self.apply_toggles(id, &released)?;
        if geometry_changed {
            self.mark_bounding_box_dirty(id);
        }
        Ok(())
    }

    /// Apply a state snapshot. A snapshot for another widget kind is ignored.
    pub fn apply_state(&mut self, id: InstanceId, state: Arc<State>) -> Result<()> {
        let inst = node_mut(&mut self.nodes, id)?;
        if state.kind() != inst.kind {
            tracing::debug!(
                "{}: ignoring {:?} state on a {:?}",
                inst.tag,
                state.kind(),
                inst.kind
            );
            return Ok(());
        }
        inst.state = Some(Arc::clone(&state));
        match (&*state, &mut inst.behavior) {
            (State::Scroll { content_offset }, Behavior::Scroll(engine)) => {
                let effects = engine.restore(*content_offset);
                self.apply_scroll_effects(id, effects)
            }
            (State::Text(text), Behavior::Text(engine)) => {
                engine.rebuild(text);
                let node = engine.text_node();
                if engine.set_paragraph(text.paragraph) {
                    match text.paragraph {
                        Some(p) => check(self.facade.set_attribute(
                            node,
                            AttributeId::TextParagraph,
                            &AttributeValue::Object(p),
                        ))?,
                        None => check(self.facade.reset_attribute(node, AttributeId::TextParagraph))?,
                    }
                }
                let need = TextEngine::requires_wrapper(text);
                if need != engine.wrapper().is_some() {
                    self.set_text_wrapper(id, need)?;
                }
                self.mark_bounding_box_dirty(id);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Replace the event emitter.
    pub fn apply_event_emitter(&mut self, id: InstanceId, emitter: Arc<EventEmitter>) -> Result<()> {
        node_mut(&mut self.nodes, id)?.emitter = Some(emitter);
        Ok(())
    }

    /// Apply layout metrics.
    pub fn apply_layout(&mut self, id: InstanceId, layout: LayoutMetrics) -> Result<()> {
        let inst = node_mut(&mut self.nodes, id)?;
        let frame_changed = inst.layout.frame != layout.frame;
        inst.layout = layout;
        let next = Facets {
            common: CommonFacets::derive(
                &inst.props,
                &inst.layout,
                &inst.transform,
                inst.facets.common.accessibility_label.as_ref(),
            ),
            layout: LayoutFacets::derive(&inst.layout),
            widget: inst.facets.widget.clone(),
        };
        AttributeWriter::new(&*self.facade, inst.native.outer).apply(&inst.facets, &next)?;
        inst.facets = next;
        if frame_changed {
            self.mark_bounding_box_dirty(id);
        }
        Ok(())
    }

    /// Set the transform directly, bypassing props.
    pub fn set_transform(&mut self, id: InstanceId, transform: Matrix4) -> Result<()> {
        let inst = node_mut(&mut self.nodes, id)?;
        if inst.transform == transform {
            return Ok(());
        }
        inst.transform = transform;
        let next = CommonFacets::derive(
            &inst.props,
            &inst.layout,
            &inst.transform,
            inst.facets.common.accessibility_label.as_ref(),
        );
        AttributeWriter::new(&*self.facade, inst.native.outer).common(&inst.facets.common, &next)?;
        inst.facets.common = next;
        self.mark_bounding_box_dirty(id);
        Ok(())
    }

    /// Run the tree-wide finalize pass: resolve labelled-by references, sync
    /// scroll metrics and refresh virtualization.
    pub fn finalize_updates(&mut self) -> Result<()> {
        let ids: Vec<InstanceId> = self.nodes.keys().collect();
        for id in &ids {
            self.resolve_labelled_by(*id)?;
        }
        for id in ids {
            if self.nodes.get(id).is_some_and(|i| i.kind == WidgetKind::Scroll) {
                self.sync_scroll(id);
                self.refresh_virtualization(id)?;
            }
        }
        Ok(())
    }

    /// Append the label of the referenced instance to our own.
    fn resolve_labelled_by(&mut self, id: InstanceId) -> Result<()> {
        let Some(inst) = self.nodes.get(id) else {
            return Ok(());
        };
        let a11y = &inst.props.base().accessibility;
        let Some(reference) = a11y.labelled_by.as_ref() else {
            return Ok(());
        };
        let own = a11y.label.clone();
        let label = match self.native_ids.get(reference).and_then(|o| self.nodes.get(*o)) {
            None => {
                tracing::warn!("{}: labelled-by target {reference} not found", inst.tag);
                own
            }
            Some(target) => match (own, target.props.base().accessibility.label.clone()) {
                (Some(own), Some(other)) if !own.is_empty() => Some(format!("{own}, {other}")),
                (_, Some(other)) => Some(other),
                (own, None) => own,
            },
        };
        if label == inst.facets.common.accessibility_label {
            return Ok(());
        }
        let prev = inst.facets.common.clone();
        let next = CommonFacets {
            accessibility_label: label,
            ..prev.clone()
        };
        AttributeWriter::new(&*self.facade, inst.native.outer).common(&prev, &next)?;
        node_mut(&mut self.nodes, id)?.facets.common = next;
        Ok(())
    }

    /// Push viewport and content sizes into a scroll engine and detect a
    /// same-axis scroll ancestor.
    fn sync_scroll(&mut self, id: InstanceId) {
        let Some(inst) = self.nodes.get(id) else {
            return;
        };
        let container = inst.layout.size();
        let content = inst
            .children
            .first()
            .and_then(|c| self.nodes.get(*c))
            .map_or(Size::zero(), |c| c.layout.size());
        let horizontal = matches!(&*inst.props, Props::Scroll(p) if p.horizontal);
        let mut has_ancestor = false;
        let mut cur = inst.parent;
        while let Some(pid) = cur {
            let Some(p) = self.nodes.get(pid) else {
                break;
            };
            if let Props::Scroll(sp) = &*p.props
                && sp.horizontal == horizontal
            {
                has_ancestor = true;
                break;
            }
            cur = p.parent;
        }
        if let Some(Instance {
            behavior: Behavior::Scroll(engine),
            ..
        }) = self.nodes.get_mut(id)
        {
            engine.set_metrics(container, content);
            engine.set_has_scroll_ancestor(has_ancestor);
        }
    }

    /// Recompute which children of a scroll view's content container are
    /// inside the visible window.
    fn refresh_virtualization(&mut self, scroll_id: InstanceId) -> Result<()> {
        let Some(scroll) = self.nodes.get(scroll_id) else {
            return Ok(());
        };
        let Some(engine) = scroll.scroll_engine() else {
            return Ok(());
        };
        let Some(&content_id) = scroll.children.first() else {
            return Ok(());
        };
        let Some(content) = self.nodes.get(content_id) else {
            return Ok(());
        };
        if content.clipped_subviews().is_none() {
            return Ok(());
        }
        let window = engine.visible_window().offset_by(-content.layout.origin());
        let frames: Vec<Rect> = content
            .children
            .iter()
            .filter_map(|c| self.nodes.get(*c))
            .map(|c| c.layout.frame)
            .collect();
        let toggles = match &mut node_mut(&mut self.nodes, content_id)?.behavior {
            Behavior::View(ViewBehavior {
                clipped: Some(clipped),
            }) => clipped.update(&frames, window),
            _ => return Ok(()),
        };
        self.apply_toggles(content_id, &toggles)
    }

    /// Carry out virtualization toggles on the children of `container_id`.
    fn apply_toggles(&mut self, container_id: InstanceId, toggles: &[Toggle]) -> Result<()> {
        if toggles.is_empty() {
            return Ok(());
        }
        let (container, base, children) = {
            let inst = self.node(container_id)?;
            (
                inst.child_container(),
                inst.child_native_base(),
                inst.children.clone(),
            )
        };
        let Some(container) = container else {
            return Ok(());
        };
        for toggle in toggles {
            match *toggle {
                Toggle::Detach { child } => {
                    let Some(&cid) = children.get(child) else {
                        continue;
                    };
                    let c = node_mut(&mut self.nodes, cid)?;
                    check(self.facade.remove_child(container, c.native.outer))?;
                    c.mounted = false;
                }
                Toggle::Attach {
                    child,
                    native_index,
                } => {
                    let Some(&cid) = children.get(child) else {
                        continue;
                    };
                    let c = node_mut(&mut self.nodes, cid)?;
                    check(self.facade.insert_child(
                        container,
                        c.native.outer,
                        base + native_index,
                    ))?;
                    c.mounted = true;
                }
            }
        }
        tracing::trace!("{container_id:?}: {} virtualization toggles", toggles.len());
        self.mark_bounding_box_dirty(container_id);
        Ok(())
    }

    /// Wrap or unwrap a text block's native text node, swapping the outer
    /// node in the parent at the same index.
    fn set_text_wrapper(&mut self, id: InstanceId, need: bool) -> Result<()> {
        let facade = Rc::clone(&self.facade);
        let (old_outer, text_node, parent, mounted, children) = {
            let inst = self.node(id)?;
            let Some(engine) = inst.text_engine() else {
                return Ok(());
            };
            (
                inst.native.outer,
                engine.text_node(),
                inst.parent,
                inst.mounted,
                inst.children.clone(),
            )
        };
        let slot = match parent {
            Some(pid) if mounted => {
                let (container, index) = self.native_slot(pid, id)?;
                container.map(|c| (c, index))
            }
            _ => None,
        };
        if let Some((container, _)) = slot {
            check(facade.remove_child(container, old_outer))?;
        }
        let new_outer = if need {
            let wrapper = check(facade.create_node(NodeType::Stack))?;
            check(facade.insert_child(wrapper, text_node, 0))?;
            for (i, cid) in children.iter().enumerate() {
                let c = node_mut(&mut self.nodes, *cid)?;
                check(facade.insert_child(wrapper, c.native.outer, 1 + i))?;
                c.mounted = true;
            }
            wrapper
        } else {
            for cid in &children {
                let c = node_mut(&mut self.nodes, *cid)?;
                if c.mounted {
                    check(facade.remove_child(old_outer, c.native.outer))?;
                    c.mounted = false;
                }
            }
            check(facade.remove_child(old_outer, text_node))?;
            check(facade.dispose_node(old_outer))?;
            text_node
        };
        if let Some((container, index)) = slot {
            check(facade.insert_child(container, new_outer, index))?;
        }

        let inst = node_mut(&mut self.nodes, id)?;
        if let Behavior::Text(engine) = &mut inst.behavior {
            engine.set_wrapper(need.then_some(new_outer));
        }
        inst.native.outer = new_outer;
        let defaults = Facets::defaults_for(inst.kind);
        AttributeWriter::new(&*facade, new_outer).apply(&defaults, &inst.facets)?;
        if need {
            AttributeWriter::new(&*facade, old_outer).apply(&inst.facets, &defaults)?;
        }
        tracing::debug!("{}: text wrapper {}", inst.tag, if need { "added" } else { "removed" });
        Ok(())
    }

    /// Native container and index for `child` under `parent`.
    fn native_slot(
        &self,
        parent: InstanceId,
        child: InstanceId,
    ) -> Result<(Option<NativeHandle>, usize)> {
        let p = self.node(parent)?;
        let pos = p
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| structural(format!("{child:?} is not a child of {}", p.tag)))?;
        let mounted_before = p.children[..pos]
            .iter()
            .filter(|c| self.nodes.get(**c).is_some_and(|c| c.mounted))
            .count();
        Ok((p.child_container(), p.child_native_base() + mounted_before))
    }

    /// Attach `child`'s outer node to `parent`'s native container.
    fn mount(&mut self, parent: InstanceId, child: InstanceId) -> Result<()> {
        let (container, index) = self.native_slot(parent, child)?;
        let Some(container) = container else {
            return Ok(());
        };
        let c = node_mut(&mut self.nodes, child)?;
        check(self.facade.insert_child(container, c.native.outer, index))?;
        c.mounted = true;
        Ok(())
    }

    /// Detach `child`'s outer node from `parent`'s native container.
    fn unmount(&mut self, parent: InstanceId, child: InstanceId) -> Result<()> {
        let container = self.node(parent)?.child_container();
        let c = node_mut(&mut self.nodes, child)?;
        if !c.mounted {
            return Ok(());
        }
        if let Some(container) = container {
            check(self.facade.remove_child(container, c.native.outer))?;
        }
        c.mounted = false;
        Ok(())
    }

    /// Is `ancestor` on the parent chain of `id`?
    fn is_ancestor(&self, ancestor: InstanceId, id: InstanceId) -> bool {
        let mut cur = self.nodes.get(id).and_then(|i| i.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes.get(p).and_then(|i| i.parent);
        }
        false
    }

    /// Insert `child` under `parent` at `index`.
    pub fn insert_child(&mut self, parent: InstanceId, child: InstanceId, index: usize) -> Result<()> {
        let p = self.node(parent)?;
        let (ptag, pkind, len) = (p.tag, p.kind, p.children.len());
        let c = self.node(child)?;
        let ctag = c.tag;
        if c.parent.is_some() {
            return Err(structural(format!("{ctag} already has a parent")));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(structural(format!("inserting {ctag} under {ptag} forms a cycle")));
        }
        if pkind.is_single_child() && len > 0 {
            return Err(structural(format!(
                "{ptag} is a {pkind:?} and already has a child, cannot insert {ctag}"
            )));
        }
        if index > len {
            tracing::error!("insert {ctag} into {ptag}: index {index} out of bounds ({len})");
            return Err(Error::Invalid(format!("child index {index} out of bounds")));
        }
        let p = node_mut(&mut self.nodes, parent)?;
        p.children.insert(index, child);
        if let Behavior::View(ViewBehavior {
            clipped: Some(clipped),
        }) = &mut p.behavior
        {
            clipped.insert(index);
        }
        node_mut(&mut self.nodes, child)?.parent = Some(parent);
        self.mount(parent, child)?;
        self.mark_bounding_box_dirty(parent);
        tracing::trace!("inserted {ctag} into {ptag} at {index}");
        Ok(())
    }

    /// Remove `child` from `parent`. The child stays in the arena.
    pub fn remove_child(&mut self, parent: InstanceId, child: InstanceId, index: usize) -> Result<()> {
        let p = self.node(parent)?;
        let pos = if p.children.get(index) == Some(&child) {
            index
        } else {
            let Some(pos) = p.children.iter().position(|c| *c == child) else {
                return Err(structural(format!("{child:?} is not a child of {}", p.tag)));
            };
            tracing::debug!("{}: removal index {index} corrected to {pos}", p.tag);
            pos
        };
        self.unmount(parent, child)?;
        let p = node_mut(&mut self.nodes, parent)?;
        p.children.remove(pos);
        if let Behavior::View(ViewBehavior {
            clipped: Some(clipped),
        }) = &mut p.behavior
        {
            clipped.remove(pos);
        }
        node_mut(&mut self.nodes, child)?.parent = None;
        self.mark_bounding_box_dirty(parent);
        Ok(())
    }

    /// Move a child of `parent` from one position to another.
    pub fn move_child(&mut self, parent: InstanceId, from: usize, to: usize) -> Result<()> {
        let p = self.node(parent)?;
        let len = p.children.len();
        if from >= len || to >= len {
            tracing::error!("{}: move {from} -> {to} out of bounds ({len})", p.tag);
            return Err(Error::Invalid(format!("move {from} -> {to} out of bounds")));
        }
        if from == to {
            return Ok(());
        }
        let child = p.children[from];
        let was_mounted = self.node(child)?.mounted;
        if was_mounted {
            self.unmount(parent, child)?;
        }
        let p = node_mut(&mut self.nodes, parent)?;
        let moved = p.children.remove(from);
        p.children.insert(to, moved);
        if let Behavior::View(ViewBehavior {
            clipped: Some(clipped),
        }) = &mut p.behavior
        {
            clipped.reorder(from, to);
        }
        if was_mounted {
            self.mount(parent, child)?;
        }
        self.mark_bounding_box_dirty(parent);
        Ok(())
    }

    /// Destroy an instance. Its children are detached but stay in the arena.
    /// Event registrations are released before the native nodes go away.
    pub fn delete(&mut self, id: InstanceId) -> Result<()> {
        let (parent, children) = {
            let inst = self.node(id)?;
            (inst.parent, inst.children.clone())
        };
        if let Some(pid) = parent {
            let index = self.children(pid).iter().position(|c| *c == id).unwrap_or(0);
            self.remove_child(pid, id, index)?;
        }
        for child in children {
            self.unmount(id, child)?;
            if let Some(c) = self.nodes.get_mut(child) {
                c.parent = None;
            }
        }
        let Some(mut inst) = self.nodes.remove(id) else {
            return Ok(());
        };
        inst.registrations.clear();
        self.tags.remove(&inst.tag);
        self.native_ids.retain(|_, v| *v != id);
        if self.root == Some(id) {
            self.root = None;
        }
        self.pointer.forget(|t| t.owner() == id);
        dispose_natives(&*self.facade, &inst)?;
        tracing::debug!("deleted {}", inst.tag);
        Ok(())
    }

    /// Apply a commit in order, then run the finalize pass once.
    pub fn apply_commit(&mut self, commit: Commit) -> Result<()> {
        tracing::debug!("applying commit of {} mutations", commit.len());
        for m in commit.mutations {
            self.apply_mutation(m)?;
        }
        self.finalize_updates()
    }

    /// Apply one mutation.
    fn apply_mutation(&mut self, m: Mutation) -> Result<()> {
        match m {
            Mutation::Create {
                tag,
                props,
                state,
                emitter,
                layout,
            } => self.create_with(tag, props, state, emitter, layout).map(|_| ()),
            Mutation::Insert {
                parent,
                child,
                index,
            } => {
                let (p, c) = (self.lookup(parent)?, self.lookup(child)?);
                self.insert_child(p, c, index)
            }
            Mutation::Remove {
                parent,
                child,
                index,
            } => {
                let (p, c) = (self.lookup(parent)?, self.lookup(child)?);
                self.remove_child(p, c, index)
            }
            Mutation::Move { parent, from, to } => {
                let p = self.lookup(parent)?;
                self.move_child(p, from, to)
            }
            Mutation::Update {
                tag,
                props,
                state,
                emitter,
                layout,
            } => {
                let id = self.lookup(tag)?;
                if let Some(emitter) = emitter {
                    self.apply_event_emitter(id, emitter)?;
                }
                if let Some(layout) = layout {
                    self.apply_layout(id, layout)?;
                }
                if let Some(props) = props {
                    self.apply_props(id, props)?;
                }
                if let Some(state) = state {
                    self.apply_state(id, state)?;
                }
                Ok(())
            }
            Mutation::Delete { tag } => {
                let id = self.lookup(tag)?;
                self.delete(id)
            }
        }
    }

    /// Run an imperative command. Unknown tags, unknown commands and
    /// commands the widget does not support are logged and ignored.
    pub fn dispatch_command(&mut self, tag: impl Into<Tag>, name: &str, args: &[Value]) -> Result<()> {
        let tag = tag.into();
        let Some(&id) = self.tags.get(&tag) else {
            tracing::warn!("command {name}: no instance {tag}");
            return Ok(());
        };
        let command = match Command::parse(name, args) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("{tag}: {e}");
                return Ok(());
            }
        };
        let inst = node_mut(&mut self.nodes, id)?;
        let outer = inst.native.outer;
        match (&mut inst.behavior, &command) {
            (Behavior::Scroll(engine), Command::ScrollTo { x, y, animated }) => {
                let effects = engine.scroll_to(Point::new(*x, *y), *animated);
                self.apply_scroll_effects(id, effects)
            }
            (Behavior::Scroll(engine), Command::ScrollToEnd { animated }) => {
                let effects = engine.scroll_to_end(*animated);
                self.apply_scroll_effects(id, effects)
            }
            (Behavior::Scroll(engine), Command::FlashScrollIndicators) => {
                let effects = engine.flash_indicators();
                self.apply_scroll_effects(id, effects)
            }
            (Behavior::TextInput(input), _) => {
                let writes = input.on_command(tag, &command);
                let mut writer = AttributeWriter::new(&*self.facade, outer);
                for (attr, value) in &writes {
                    writer.set(*attr, value)?;
                }
                Ok(())
            }
            (Behavior::Refresh(_), Command::SetNativeRefreshing(refreshing)) => {
                AttributeWriter::new(&*self.facade, outer)
                    .set(AttributeId::RefreshRefreshing, &AttributeValue::flag(*refreshing))?;
                if let WidgetFacets::Refresh(f) = &mut inst.facets.widget {
                    f.refreshing = *refreshing;
                }
                Ok(())
            }
            _ => {
                tracing::warn!("{tag}: {name} is not supported by {:?}", inst.kind);
                Ok(())
            }
        }
    }

    /// Deliver a native callback. Callbacks for handles without a route are
    /// logged and dropped.
    pub fn handle_native_event(&mut self, handle: NativeHandle, event: &NativeEvent) -> Result<()> {
        let Some(id) = self.events.route(handle, event.kind()) else {
            tracing::warn!("no route for {:?} on {handle:?}", event.kind());
            return Ok(());
        };
        let now = self.clock.now();
        match event {
            NativeEvent::ScrollFrameBegin { .. } | NativeEvent::Scroll { .. } | NativeEvent::ScrollStop => {
                self.handle_scroll_event(id, event, now)
            }
            _ => self.handle_widget_event(id, event),
        }
    }

    /// Feed a scroll callback through the engine.
    fn handle_scroll_event(&mut self, id: InstanceId, event: &NativeEvent, now: Instant) -> Result<()> {
        self.sync_scroll(id);
        let inst = node_mut(&mut self.nodes, id)?;
        let Behavior::Scroll(engine) = &mut inst.behavior else {
            tracing::debug!("{}: scroll event on a {:?}", inst.tag, inst.kind);
            return Ok(());
        };
        let before = engine.offset();
        let effects = match event {
            NativeEvent::ScrollFrameBegin { delta, phase } => engine.frame_begin(*delta, *phase),
            NativeEvent::Scroll { offset } => engine.on_scroll(*offset, now),
            NativeEvent::ScrollStop => engine.on_stop(now),
            _ => Vec::new(),
        };
        let moved = engine.offset() != before;
        self.apply_scroll_effects(id, effects)?;
        if moved {
            self.mark_bounding_box_dirty(id);
        }
        self.refresh_virtualization(id)
    }

    /// Carry out scroll engine effects.
    fn apply_scroll_effects(&self, id: InstanceId, effects: Vec<ScrollEffect>) -> Result<()> {
        let inst = self.node(id)?;
        let mut writer = AttributeWriter::new(&*self.facade, inst.native.outer);
        for effect in effects {
            match effect {
                ScrollEffect::Emit { name, payload } => {
                    if let Some(emitter) = &inst.emitter {
                        emitter.dispatch_serialized(name, &payload);
                    }
                }
                ScrollEffect::PersistOffset(content_offset) => {
                    self.bridge
                        .update_state(inst.tag, Arc::new(State::Scroll { content_offset }));
                }
                ScrollEffect::ScrollTo { offset, animated } => writer.set(
                    AttributeId::ScrollOffset,
                    &AttributeValue::Numbers(vec![offset.x, offset.y, if animated { 1.0 } else { 0.0 }]),
                )?,
                ScrollEffect::SetNestedMode(on) => {
                    writer.set(AttributeId::NestedScroll, &AttributeValue::flag(on))?;
                }
                ScrollEffect::FlashIndicators => {
                    writer.set(AttributeId::ScrollFlashIndicator, &AttributeValue::flag(true))?;
                }
            }
        }
        Ok(())
    }

    /// Feed a text field, image or refresh callback to its behaviour.
    fn handle_widget_event(&mut self, id: InstanceId, event: &NativeEvent) -> Result<()> {
        let sender = self.deferred.sender();
        let inst = node_mut(&mut self.nodes, id)?;
        let tag = inst.tag;
        let emitter = inst.emitter.clone();
        match &mut inst.behavior {
            Behavior::TextInput(input) => input.on_event(tag, emitter.as_deref(), event),
            Behavior::Image(image) => image.on_event(tag, emitter.as_deref(), event),
            Behavior::Refresh(refresh) if *event == NativeEvent::Refresh => {
                refresh.on_refresh(tag, emitter.as_deref(), &self.executor, sender);
            }
            _ => tracing::debug!("{tag}: {:?} ignores {event:?}", inst.kind),
        }
        Ok(())
    }

    /// Drain messages posted from other threads. Returns how many ran.
    pub fn process_deferred(&mut self) -> Result<usize> {
        let mut n = 0;
        while let Some(msg) = self.deferred.try_next() {
            n += 1;
            match msg {
                Deferred::RefreshRecheck { tag } => self.recheck_refresh(tag)?,
            }
        }
        Ok(n)
    }

    /// Re-assert the native refreshing flag from the latest props.
    fn recheck_refresh(&mut self, tag: Tag) -> Result<()> {
        let Some(&id) = self.tags.get(&tag) else {
            tracing::debug!("refresh re-check: {tag} is gone");
            return Ok(());
        };
        let inst = node_mut(&mut self.nodes, id)?;
        let Props::RefreshControl(props) = &*inst.props else {
            return Ok(());
        };
        let refreshing = props.refreshing;
        AttributeWriter::new(&*self.facade, inst.native.outer)
            .set(AttributeId::RefreshRefreshing, &AttributeValue::flag(refreshing))?;
        if let WidgetFacets::Refresh(f) = &mut inst.facets.widget {
            f.refreshing = refreshing;
        }
        if let Behavior::Refresh(refresh) = &mut inst.behavior {
            refresh.recheck_done();
        }
        Ok(())
    }

    /// Bounding box of `id` in its local coordinates: the hit rectangle, text
    /// fragment rectangles and every attached child's transformed box. A node
    /// that clips still counts its children. Cached until marked dirty.
    pub fn bounding_box(&self, id: InstanceId) -> Option<Rect> {
        let inst = self.nodes.get(id)?;
        if let Some(cached) = inst.bounding_box.get() {
            return Some(cached);
        }
        let mut bb = inst.hit_rect();
        if let Some(engine) = inst.text_engine() {
            for r in engine.fragments().filter_map(|f| f.rects_bounds()) {
                bb = bb.union(&r);
            }
        }
        let offset = inst.scroll_offset();
        for (i, cid) in inst.children.iter().enumerate() {
            if inst.is_child_clipped(i) {
                continue;
            }
            let (Some(child), Some(child_box)) = (self.nodes.get(*cid), self.bounding_box(*cid))
            else {
                continue;
            };
            let frame = child.layout.frame;
            let placed = child_box.offset_by(frame.origin - offset);
            bb = bb.union(&transform_around(placed, frame.center() - offset, &child.transform));
        }
        inst.bounding_box.set(Some(bb));
        Some(bb)
    }

    /// Drop the cached bounding box of `id` and of every ancestor up to, but
    /// not including, the first one that clips its content or has no cache.
    pub fn mark_bounding_box_dirty(&self, id: InstanceId) {
        let Some(inst) = self.nodes.get(id) else {
            return;
        };
        inst.bounding_box.set(None);
        let mut cur = inst.parent;
        while let Some(pid) = cur {
            let Some(p) = self.nodes.get(pid) else {
                break;
            };
            if p.is_clipping_content() || p.bounding_box.get().is_none() {
                break;
            }
            p.bounding_box.set(None);
            cur = p.parent;
        }
    }

    /// Deepest touch target under `p`, in root coordinates.
    pub fn hit_test(&self, p: Point) -> Option<HitTestResult> {
        touch::hit_test(self, p)
    }

    /// Route pointer input, emitting enter, leave and click events. Returns
    /// the hit test at the input position.
    pub fn handle_pointer(&mut self, input: PointerInput) -> Option<HitTestResult> {
        let hit = if input.kind == PointerKind::Cancel {
            None
        } else {
            self.hit_test(input.position)
        };
        let dispatches = self.pointer.route(input.kind, hit.as_ref());
        for d in &dispatches {
            let Some(owner) = self.nodes.get(d.target.owner()) else {
                continue;
            };
            let Some(emitter) = owner.emitter.as_ref() else {
                continue;
            };
            let tag = match d.target {
                TargetRef::Instance(_) => owner.tag,
                TargetRef::Fragment { tag, .. } => tag,
            };
            emitter.dispatch_serialized(d.name, &PointerPayload::new(tag, d.local, input.position));
        }
        hit
    }
}
