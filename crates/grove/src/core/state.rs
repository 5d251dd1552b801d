//! State snapshots.
//!
//! State is versioned independently of props. The scroll offset is written
//! back through the renderer bridge so it survives remounts; text layout
//! results arrive from the external shaping pass.

use crate::{
    core::{id::Tag, layout::LayoutDirection, native::ObjectHandle, props::WidgetKind},
    geom::{Point, Rect},
};

/// What an inline fragment renders.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentKind {
    /// A run of text.
    Text(String),
    /// An embedded child instance, identified by the fragment tag.
    Attachment,
}

/// One inline fragment of a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Tag of the shadow node the fragment came from.
    pub tag: Tag,
    /// Fragment contents.
    pub kind: FragmentKind,
    /// Glyph-run rectangles in the text block's local coordinates. A wrapped
    /// fragment has one per line.
    pub rects: Vec<Rect>,
}

impl Fragment {
    /// A text fragment.
    pub fn text(tag: impl Into<Tag>, text: impl Into<String>, rects: Vec<Rect>) -> Self {
        Self {
            tag: tag.into(),
            kind: FragmentKind::Text(text.into()),
            rects,
        }
    }

    /// An attachment fragment for the child instance with `tag`.
    pub fn attachment(tag: impl Into<Tag>, rect: Rect) -> Self {
        Self {
            tag: tag.into(),
            kind: FragmentKind::Attachment,
            rects: vec![rect],
        }
    }

    /// Is this an embedded child?
    pub fn is_attachment(&self) -> bool {
        matches!(self.kind, FragmentKind::Attachment)
    }
}

/// Shaped text layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextState {
    /// Fragments in logical order.
    pub fragments: Vec<Fragment>,
    /// Paragraph writing direction.
    pub direction: LayoutDirection,
    /// Shaped paragraph handed to the native text node.
    pub paragraph: Option<ObjectHandle>,
}

/// A state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// Persisted scroll position.
    Scroll {
        /// Content offset.
        content_offset: Point,
    },
    /// Text layout.
    Text(TextState),
}

impl State {
    /// The widget kind this state belongs to.
    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::Scroll { .. } => WidgetKind::Scroll,
            Self::Text(_) => WidgetKind::Text,
        }
    }
}
