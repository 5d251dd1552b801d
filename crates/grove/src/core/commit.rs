//! The mutation protocol between the renderer and the tree.
//!
//! A [`Commit`] is an ordered list of [`Mutation`]s produced by diffing two
//! shadow trees. The tree applies them in order and then runs a single
//! finalize pass.

use std::sync::Arc;

use crate::core::{
    event::EventEmitter, id::Tag, layout::LayoutMetrics, props::Props, state::State,
};

/// One change to the instance tree.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Create an instance. The widget kind comes from the props.
    Create {
        /// New tag.
        tag: Tag,
        /// Initial props.
        props: Arc<Props>,
        /// Initial state.
        state: Option<Arc<State>>,
        /// Initial emitter.
        emitter: Option<Arc<EventEmitter>>,
        /// Initial layout.
        layout: LayoutMetrics,
    },
    /// Insert `child` under `parent` at `index`.
    Insert {
        /// Parent tag.
        parent: Tag,
        /// Child tag.
        child: Tag,
        /// Position among the owned children.
        index: usize,
    },
    /// Remove `child` from `parent`.
    Remove {
        /// Parent tag.
        parent: Tag,
        /// Child tag.
        child: Tag,
        /// Position the child was at.
        index: usize,
    },
    /// Move a child of `parent` from one position to another.
    Move {
        /// Parent tag.
        parent: Tag,
        /// Current position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// Replace some snapshots of an instance.
    Update {
        /// Target tag.
        tag: Tag,
        /// New props.
        props: Option<Arc<Props>>,
        /// New state.
        state: Option<Arc<State>>,
        /// New emitter.
        emitter: Option<Arc<EventEmitter>>,
        /// New layout.
        layout: Option<LayoutMetrics>,
    },
    /// Destroy an instance and release its native nodes.
    Delete {
        /// Target tag.
        tag: Tag,
    },
}

impl Mutation {
    /// A create with default layout and no state or emitter.
    pub fn create(tag: impl Into<Tag>, props: impl Into<Props>) -> Self {
        Self::Create {
            tag: tag.into(),
            props: Arc::new(props.into()),
            state: None,
            emitter: None,
            layout: LayoutMetrics::default(),
        }
    }

    /// An update that only replaces props.
    pub fn props(tag: impl Into<Tag>, props: impl Into<Props>) -> Self {
        Self::Update {
            tag: tag.into(),
            props: Some(Arc::new(props.into())),
            state: None,
            emitter: None,
            layout: None,
        }
    }

    /// An update that only replaces state.
    pub fn state(tag: impl Into<Tag>, state: State) -> Self {
        Self::Update {
            tag: tag.into(),
            props: None,
            state: Some(Arc::new(state)),
            emitter: None,
            layout: None,
        }
    }

    /// An update that only replaces layout.
    pub fn layout(tag: impl Into<Tag>, layout: LayoutMetrics) -> Self {
        Self::Update {
            tag: tag.into(),
            props: None,
            state: None,
            emitter: None,
            layout: Some(layout),
        }
    }
}

/// An ordered batch of mutations.
#[derive(Debug, Clone, Default)]
pub struct Commit {
    /// Mutations in application order.
    pub mutations: Vec<Mutation>,
}

impl Commit {
    /// Construct an empty commit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mutation.
    pub fn push(mut self, m: Mutation) -> Self {
        self.mutations.push(m);
        self
    }

    /// Append an insert.
    pub fn insert(self, parent: impl Into<Tag>, child: impl Into<Tag>, index: usize) -> Self {
        self.push(Mutation::Insert {
            parent: parent.into(),
            child: child.into(),
            index,
        })
    }

    /// Append a removal.
    pub fn remove(self, parent: impl Into<Tag>, child: impl Into<Tag>, index: usize) -> Self {
        self.push(Mutation::Remove {
            parent: parent.into(),
            child: child.into(),
            index,
        })
    }

    /// Append a deletion.
    pub fn delete(self, tag: impl Into<Tag>) -> Self {
        self.push(Mutation::Delete { tag: tag.into() })
    }

    /// Number of mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Return true if there are no mutations.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
