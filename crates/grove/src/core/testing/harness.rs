use std::{rc::Rc, sync::Arc};

use crate::{
    config::Config,
    core::{
        commit::Commit,
        error::{Error, Result},
        event::{EventEmitter, NativeEvent},
        id::{InstanceId, Tag},
        layout::LayoutMetrics,
        native::NativeHandle,
        props::Props,
        state::State,
        testing::{
            bridge::RecordingBridge, clock::ManualClock, executor::ImmediateExecutor,
            facade::RecordingFacade,
        },
        tree::InstanceTree,
    },
    geom::Rect,
    logging,
};

/// An instance tree wired to recording fakes.
#[derive(Debug)]
pub struct Harness {
    /// The tree under test.
    pub tree: InstanceTree,
    /// Native call log.
    pub facade: Rc<RecordingFacade>,
    /// Renderer event and state log.
    pub bridge: Arc<RecordingBridge>,
    /// Inline executor.
    pub executor: Arc<ImmediateExecutor>,
    /// Manual time.
    pub clock: Rc<ManualClock>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// A harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// A harness with `config`. Logs go to the test output capture.
    pub fn with_config(config: Config) -> Self {
        logging::init_for_tests();
        let facade = Rc::new(RecordingFacade::new());
        let bridge = Arc::new(RecordingBridge::new());
        let executor = Arc::new(ImmediateExecutor::new());
        let clock = Rc::new(ManualClock::new());
        let tree = InstanceTree::builder(facade.clone(), bridge.clone(), executor.clone())
            .clock(clock.clone())
            .config(config)
            .build();
        Self {
            tree,
            facade,
            bridge,
            executor,
            clock,
        }
    }

    /// An emitter for `tag` that reports to the recording bridge.
    pub fn emitter(&self, tag: i32) -> Arc<EventEmitter> {
        Arc::new(EventEmitter::new(tag, self.bridge.clone()))
    }

    /// Create an instance with an emitter attached.
    pub fn create(&mut self, tag: i32, props: impl Into<Props>) -> Result<InstanceId> {
        self.tree.create_with(
            Tag(tag),
            Arc::new(props.into()),
            None,
            Some(self.emitter(tag)),
            LayoutMetrics::default(),
        )
    }

    /// Create an instance with an emitter and a frame.
    pub fn create_with_frame(
        &mut self,
        tag: i32,
        props: impl Into<Props>,
        frame: Rect,
    ) -> Result<InstanceId> {
        let id = self.create(tag, props)?;
        self.tree.apply_layout(id, LayoutMetrics::new(frame))?;
        Ok(id)
    }

    /// The instance with `tag`.
    pub fn id(&self, tag: i32) -> Result<InstanceId> {
        self.tree
            .id_of(tag)
            .ok_or(Error::InstanceNotFound(Tag(tag)))
    }

    /// Outer native node of the instance with `tag`.
    pub fn outer(&self, tag: i32) -> Result<NativeHandle> {
        let id = self.id(tag)?;
        self.tree
            .instance(id)
            .map(|i| i.native().outer)
            .ok_or(Error::InstanceNotFound(Tag(tag)))
    }

    /// Insert `child` under `parent` by tag.
    pub fn insert(&mut self, parent: i32, child: i32, index: usize) -> Result<()> {
        let (p, c) = (self.id(parent)?, self.id(child)?);
        self.tree.insert_child(p, c, index)
    }

    /// Replace the frame of `tag`.
    pub fn layout(&mut self, tag: i32, frame: Rect) -> Result<()> {
        let id = self.id(tag)?;
        self.tree.apply_layout(id, LayoutMetrics::new(frame))
    }

    /// Replace the props of `tag`.
    pub fn props(&mut self, tag: i32, props: impl Into<Props>) -> Result<()> {
        let id = self.id(tag)?;
        self.tree.apply_props(id, Arc::new(props.into()))
    }

    /// Replace the state of `tag`.
    pub fn state(&mut self, tag: i32, state: State) -> Result<()> {
        let id = self.id(tag)?;
        self.tree.apply_state(id, Arc::new(state))
    }

    /// Deliver a native event to the outer node of `tag`.
    pub fn native_event(&mut self, tag: i32, event: NativeEvent) -> Result<()> {
        let handle = self.outer(tag)?;
        self.tree.handle_native_event(handle, &event)
    }

    /// Apply a commit.
    pub fn commit(&mut self, commit: Commit) -> Result<()> {
        self.tree.apply_commit(commit)
    }
}
